//! Error types for include resolution

use thiserror::Error;

use crate::namespace::NamespaceError;
use crate::placeholder::PlaceholderError;
use crate::tree::TreeError;

/// How a caller should treat a failed resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not ready yet; retry the whole statement once more fragments exist
    Deferred,
    /// Authoring or structural problem; retrying cannot help
    Fatal,
}

/// Errors that abort include resolution for good
#[derive(Debug, Error)]
pub enum IncludeError {
    /// `include` element that cannot be interpreted
    #[error("malformed include: {reason}")]
    MalformedInclude { reason: String },

    /// Same variable declared twice at one inclusion site
    #[error("variable '{name}' defined twice in the same include definition")]
    DuplicateVariable { name: String },

    /// Fragment that (transitively) includes itself
    #[error("circular include detected: {chain}")]
    CyclicInclude { chain: String },

    /// Nesting deeper than the configured limit
    #[error("include depth limit of {limit} exceeded while including '{refid}'")]
    DepthExceeded { limit: usize, refid: String },

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl IncludeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInclude {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

/// A referenced fragment is not registered (yet)
///
/// Fragments may live in a source unit that has not been processed, so this
/// is a "retry later" signal rather than a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not find SQL fragment to include with refid '{refid}'")]
pub struct MissingFragment {
    /// Fully-qualified identifier that was looked up
    pub refid: String,
}

impl MissingFragment {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Deferred
    }
}

//! Qualification of fragment references against a mapper namespace

use thiserror::Error;

/// Errors raised while qualifying an identifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    /// No namespace is set for the mapper being built
    #[error("mapper element requires a namespace to be specified")]
    Unset,

    /// Local element names must not contain dots
    #[error("dots are not allowed in element names, please remove it from '{name}'")]
    DottedName { name: String },
}

/// Turns a possibly-unqualified id into a registry key
pub trait NamespaceResolver {
    /// Qualify `id`
    ///
    /// With `is_reference` an id that already contains a dot is taken as
    /// qualified by another namespace and returned unchanged.
    fn qualify(&self, id: &str, is_reference: bool) -> Result<String, NamespaceError>;
}

/// Namespace of the mapper currently being built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperNamespace {
    current: Option<String>,
}

impl MapperNamespace {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: Some(current.into()),
        }
    }

    /// A resolver with no namespace; every qualification fails
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl NamespaceResolver for MapperNamespace {
    fn qualify(&self, id: &str, is_reference: bool) -> Result<String, NamespaceError> {
        let current = self.current.as_deref().ok_or(NamespaceError::Unset)?;

        if is_reference {
            if id.contains('.') {
                return Ok(id.to_string());
            }
        } else {
            if id
                .strip_prefix(current)
                .is_some_and(|rest| rest.starts_with('.'))
            {
                return Ok(id.to_string());
            }
            if id.contains('.') {
                return Err(NamespaceError::DottedName {
                    name: id.to_string(),
                });
            }
        }

        Ok(format!("{}.{}", current, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_gets_current_namespace() {
        let ns = MapperNamespace::new("com.example.UserMapper");
        assert_eq!(
            ns.qualify("columns", true).unwrap(),
            "com.example.UserMapper.columns"
        );
    }

    #[test]
    fn test_dotted_reference_kept() {
        let ns = MapperNamespace::new("com.example.UserMapper");
        assert_eq!(
            ns.qualify("com.example.Common.paging", true).unwrap(),
            "com.example.Common.paging"
        );
    }

    #[test]
    fn test_declaration_already_in_namespace_kept() {
        let ns = MapperNamespace::new("users");
        assert_eq!(ns.qualify("users.columns", false).unwrap(), "users.columns");
    }

    #[test]
    fn test_dotted_declaration_rejected() {
        let ns = MapperNamespace::new("users");
        assert_eq!(
            ns.qualify("other.columns", false),
            Err(NamespaceError::DottedName {
                name: "other.columns".to_string()
            })
        );
        // A namespace prefix without the separating dot is not a match
        assert!(ns.qualify("usersx.columns", false).is_err());
    }

    #[test]
    fn test_unset_namespace_fails() {
        assert_eq!(
            MapperNamespace::unset().qualify("columns", true),
            Err(NamespaceError::Unset)
        );
    }
}

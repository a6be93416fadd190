//! Fragment registry for storing and looking up reusable SQL fragments

use std::collections::HashMap;

use thiserror::Error;

use crate::tree::{Document, ElementBuilder, NodeId, NodeKind, TreeError};

/// Errors that can occur while registering fragments
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Fragment id already registered
    #[error("duplicate fragment definition: {id}")]
    Duplicate { id: String },

    /// Fragment template root is not an element
    #[error("fragment {id} must be an element, found {kind}")]
    NotAnElement { id: String, kind: &'static str },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Read-only lookup of fragment templates by fully-qualified id
pub trait FragmentRegistry {
    fn lookup(&self, id: &str) -> Option<&Fragment>;
}

/// A registered fragment template
///
/// Each fragment owns its own arena, so its nodes never alias the nodes of
/// a statement being resolved. Users copy the template; it is never mutated.
#[derive(Debug)]
pub struct Fragment {
    document: Document,
    root: NodeId,
}

impl Fragment {
    /// Create a fragment by copying `node` out of `source`
    pub fn from_node(source: &Document, node: NodeId) -> Result<Self, TreeError> {
        let mut document = Document::new();
        let root = document.import(source, node)?;
        let top = document.root();
        document.append_child(top, root)?;
        Ok(Self { document, root })
    }

    /// Create a fragment from a builder
    pub fn from_builder(element: ElementBuilder) -> Self {
        let (document, root) = Document::with_root_element(element);
        Self { document, root }
    }

    /// The arena that owns the template
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The template element, usually a `<sql>` element
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn ensure_element(&self, id: &str) -> Result<(), RegistryError> {
        match self.document.get(self.root)? {
            NodeKind::Element { .. } => Ok(()),
            other => Err(RegistryError::NotAnElement {
                id: id.to_string(),
                kind: other.label(),
            }),
        }
    }
}

/// In-memory [`FragmentRegistry`]
#[derive(Debug, Default)]
pub struct FragmentStore {
    fragments: HashMap<String, Fragment>,
}

impl FragmentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment under a fully-qualified id
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        fragment: Fragment,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if self.fragments.contains_key(&id) {
            return Err(RegistryError::Duplicate { id });
        }
        fragment.ensure_element(&id)?;
        tracing::debug!(fragment = %id, "registered fragment");
        self.fragments.insert(id, fragment);
        Ok(())
    }

    /// Register a copy of `node` from a parsed mapper document
    pub fn insert_from(
        &mut self,
        id: impl Into<String>,
        source: &Document,
        node: NodeId,
    ) -> Result<(), RegistryError> {
        let fragment = Fragment::from_node(source, node)?;
        self.insert(id, fragment)
    }

    /// Get a fragment by id
    pub fn get(&self, id: &str) -> Option<&Fragment> {
        self.fragments.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All registered ids, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(|s| s.as_str())
    }
}

impl FragmentRegistry for FragmentStore {
    fn lookup(&self, id: &str) -> Option<&Fragment> {
        self.get(id)
    }
}

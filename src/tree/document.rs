//! Document arena, node handles and structural edits

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}

/// Handle to a node inside one specific document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    document: DocumentId,
    index: usize,
}

impl NodeId {
    /// The document that owns this node
    pub fn document(&self) -> DocumentId {
        self.document
    }
}

/// Errors raised by structural operations on a document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Handle from another arena used without importing it first
    #[error("node belongs to {node_document}, not {document}")]
    ForeignNode {
        document: DocumentId,
        node_document: DocumentId,
    },

    /// Splice target has no parent
    #[error("node is not attached to a parent")]
    Detached,

    /// Attempt to give children to a leaf node
    #[error("{kind} nodes cannot have children")]
    NotAContainer { kind: &'static str },

    /// Attempt to set an attribute on a node that is not an element
    #[error("{kind} nodes cannot have attributes")]
    NotAnElement { kind: &'static str },

    /// The document root cannot be moved, copied or re-parented
    #[error("the document root cannot be moved or copied")]
    DocumentRoot,

    /// Attempt to make a node a descendant of itself
    #[error("a node cannot be appended beneath itself")]
    CyclicAppend,
}

/// The payload of a single node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Top of every document; owns the top-level nodes
    DocumentRoot,
    /// Named element with attributes; attribute names are unique
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Character data subject to placeholder substitution
    Text(String),
    /// Character data kept verbatim
    CData(String),
    Comment(String),
}

impl NodeKind {
    /// Create an element payload with no attributes
    pub fn element(name: impl Into<String>) -> Self {
        NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Short label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::DocumentRoot => "document-root",
            NodeKind::Element { .. } => "element",
            NodeKind::Text(_) => "text",
            NodeKind::CData(_) => "cdata",
            NodeKind::Comment(_) => "comment",
        }
    }

    /// Element name, if this is an element
    pub fn element_name(&self) -> Option<&str> {
        match self {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this node may own children
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::DocumentRoot | NodeKind::Element { .. })
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl NodeData {
    fn detached(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

pub(super) const ROOT: usize = 0;

/// A markup tree stored as an arena of nodes
///
/// Nodes removed from the tree by a splice stay in the arena, detached and
/// unreachable from [`Document::root`].
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its root node
    pub fn new() -> Self {
        Self {
            id: DocumentId::next(),
            nodes: vec![NodeData::detached(NodeKind::DocumentRoot)],
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The document root node
    pub fn root(&self) -> NodeId {
        self.handle(ROOT)
    }

    /// Whether a handle belongs to this document
    pub fn owns(&self, node: NodeId) -> bool {
        node.document == self.id
    }

    /// Copy the whole arena under a fresh identity
    ///
    /// Handles into the original are not valid in the copy; use
    /// [`Document::root`] of the copy to start over.
    pub fn duplicate(&self) -> Document {
        Document {
            id: DocumentId::next(),
            nodes: self.nodes.clone(),
        }
    }

    pub(super) fn node_at(&self, slot: usize) -> NodeId {
        self.handle(slot)
    }

    fn handle(&self, index: usize) -> NodeId {
        NodeId {
            document: self.id,
            index,
        }
    }

    fn slot(&self, node: NodeId) -> Result<usize, TreeError> {
        if node.document != self.id {
            return Err(TreeError::ForeignNode {
                document: self.id,
                node_document: node.document,
            });
        }
        Ok(node.index)
    }

    pub(super) fn slot_of(&self, node: NodeId) -> Result<usize, TreeError> {
        self.slot(node)
    }

    pub(super) fn data_at(&self, slot: usize) -> (&NodeKind, &[usize]) {
        let data = &self.nodes[slot];
        (&data.kind, &data.children)
    }

    pub(super) fn push_detached(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(NodeData::detached(kind));
        self.nodes.len() - 1
    }

    /// Link a detached child under a container; callers guarantee validity
    pub(super) fn link(&mut self, parent: usize, child: usize) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// The payload of a node
    pub fn get(&self, node: NodeId) -> Result<&NodeKind, TreeError> {
        let slot = self.slot(node)?;
        Ok(&self.nodes[slot].kind)
    }

    /// Mutable access to the payload of a node
    pub fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeKind, TreeError> {
        let slot = self.slot(node)?;
        Ok(&mut self.nodes[slot].kind)
    }

    /// Snapshot of a node's children in document order
    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let slot = self.slot(node)?;
        Ok(self.nodes[slot]
            .children
            .iter()
            .map(|&child| self.handle(child))
            .collect())
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, TreeError> {
        let slot = self.slot(node)?;
        Ok(self.nodes[slot].parent.map(|parent| self.handle(parent)))
    }

    /// All nodes below `node` in document order, `node` excluded
    pub fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let slot = self.slot(node)?;
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[slot].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(self.handle(next));
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Check whether a node is an element with the given name
    pub fn is_element(&self, node: NodeId, name: &str) -> Result<bool, TreeError> {
        Ok(self.get(node)?.element_name() == Some(name))
    }

    /// Read an attribute of an element; `None` for missing attributes and non-elements
    pub fn attribute(&self, node: NodeId, name: &str) -> Result<Option<&str>, TreeError> {
        match self.get(node)? {
            NodeKind::Element { attributes, .. } => Ok(attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())),
            _ => Ok(None),
        }
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        match self.get_mut(node)? {
            NodeKind::Element { attributes, .. } => {
                let name = name.into();
                let value = value.into();
                match attributes.iter_mut().find(|(key, _)| *key == name) {
                    Some(existing) => existing.1 = value,
                    None => attributes.push((name, value)),
                }
                Ok(())
            }
            other => Err(TreeError::NotAnElement {
                kind: other.label(),
            }),
        }
    }

    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        let slot = self.push_detached(NodeKind::element(name));
        self.handle(slot)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let slot = self.push_detached(NodeKind::Text(text.into()));
        self.handle(slot)
    }

    pub fn create_cdata(&mut self, text: impl Into<String>) -> NodeId {
        let slot = self.push_detached(NodeKind::CData(text.into()));
        self.handle(slot)
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        let slot = self.push_detached(NodeKind::Comment(text.into()));
        self.handle(slot)
    }

    /// Append `child` as the last child of `parent`, detaching it first if needed
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_slot = self.slot(parent)?;
        let child_slot = self.slot(child)?;
        if child_slot == ROOT {
            return Err(TreeError::DocumentRoot);
        }
        let kind = &self.nodes[parent_slot].kind;
        if !kind.is_container() {
            return Err(TreeError::NotAContainer { kind: kind.label() });
        }
        let mut cursor = Some(parent_slot);
        while let Some(slot) = cursor {
            if slot == child_slot {
                return Err(TreeError::CyclicAppend);
            }
            cursor = self.nodes[slot].parent;
        }
        self.unlink(child_slot);
        self.link(parent_slot, child_slot);
        Ok(())
    }

    /// Remove a node from its parent; it stays in the arena
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        let slot = self.slot(node)?;
        self.unlink(slot);
        Ok(())
    }

    fn unlink(&mut self, slot: usize) {
        if let Some(parent) = self.nodes[slot].parent.take() {
            self.nodes[parent].children.retain(|&child| child != slot);
        }
    }

    /// Deep-copy a subtree of another document into this one
    ///
    /// The copy is detached; attach it with [`Document::append_child`] or
    /// splice it with [`Document::replace_with_children`].
    pub fn import(&mut self, source: &Document, node: NodeId) -> Result<NodeId, TreeError> {
        let slot = source.slot(node)?;
        if slot == ROOT {
            return Err(TreeError::DocumentRoot);
        }
        let copied = self.copy_from(&source.nodes, slot);
        Ok(self.handle(copied))
    }

    /// Deep-copy a subtree within this document
    pub fn deep_clone(&mut self, node: NodeId) -> Result<NodeId, TreeError> {
        let slot = self.slot(node)?;
        if slot == ROOT {
            return Err(TreeError::DocumentRoot);
        }
        let base = self.nodes.len();
        let mut staged = Vec::new();
        let copied = copy_subtree(&self.nodes, slot, base, &mut staged);
        self.nodes.extend(staged);
        Ok(self.handle(copied))
    }

    fn copy_from(&mut self, source: &[NodeData], slot: usize) -> usize {
        let base = self.nodes.len();
        let mut staged = Vec::new();
        let copied = copy_subtree(source, slot, base, &mut staged);
        self.nodes.extend(staged);
        copied
    }

    /// Replace `target` with the children of `container`
    ///
    /// The children keep their order and take the target's position among
    /// its siblings. Both `target` and the emptied `container` end up
    /// detached.
    pub fn replace_with_children(
        &mut self,
        target: NodeId,
        container: NodeId,
    ) -> Result<(), TreeError> {
        let target_slot = self.slot(target)?;
        let container_slot = self.slot(container)?;
        if container_slot == ROOT {
            return Err(TreeError::DocumentRoot);
        }
        let parent = self.nodes[target_slot].parent.ok_or(TreeError::Detached)?;
        self.unlink(container_slot);

        let moved = std::mem::take(&mut self.nodes[container_slot].children);
        for &child in &moved {
            self.nodes[child].parent = Some(parent);
        }

        let siblings = &mut self.nodes[parent].children;
        let position = siblings
            .iter()
            .position(|&child| child == target_slot)
            .ok_or(TreeError::Detached)?;
        siblings.splice(position..=position, moved);
        self.nodes[target_slot].parent = None;
        Ok(())
    }
}

/// Append a copy of `source[slot]` and its subtree to `out`
///
/// Indices written into the copy are offset by `base`, the arena length the
/// staged nodes will be appended at.
fn copy_subtree(source: &[NodeData], slot: usize, base: usize, out: &mut Vec<NodeData>) -> usize {
    let copied = base + out.len();
    out.push(NodeData::detached(source[slot].kind.clone()));
    for &child in &source[slot].children {
        let child_copy = copy_subtree(source, child, base, out);
        out[child_copy - base].parent = Some(copied);
        out[copied - base].children.push(child_copy);
    }
    copied
}

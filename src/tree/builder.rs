//! Fluent construction of element subtrees

use super::document::{Document, NodeId, NodeKind, TreeError, ROOT};

#[derive(Debug, Clone)]
enum Child {
    Element(ElementBuilder),
    Text(String),
    CData(String),
    Comment(String),
}

/// Builder for an element and everything beneath it
///
/// Produces detached nodes in a target document; nothing is shared between
/// two builds of the same builder.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

impl ElementBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute; a repeated name replaces the earlier value
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn child(mut self, element: ElementBuilder) -> Self {
        self.children.push(Child::Element(element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    pub fn cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::CData(text.into()));
        self
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Comment(text.into()));
        self
    }

    /// Create the subtree in `doc` as a detached node
    pub fn build_in(&self, doc: &mut Document) -> NodeId {
        let slot = self.build_slot(doc);
        doc.node_at(slot)
    }

    /// Create the subtree and append it as the last child of `parent`
    pub fn append_to(&self, doc: &mut Document, parent: NodeId) -> Result<NodeId, TreeError> {
        let node = self.build_in(doc);
        doc.append_child(parent, node)?;
        Ok(node)
    }

    fn build_slot(&self, doc: &mut Document) -> usize {
        let slot = doc.push_detached(NodeKind::Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
        });
        for child in &self.children {
            let child_slot = match child {
                Child::Element(element) => element.build_slot(doc),
                Child::Text(text) => doc.push_detached(NodeKind::Text(text.clone())),
                Child::CData(text) => doc.push_detached(NodeKind::CData(text.clone())),
                Child::Comment(text) => doc.push_detached(NodeKind::Comment(text.clone())),
            };
            doc.link(slot, child_slot);
        }
        slot
    }
}

impl Document {
    /// Create a document whose only top-level node is the built element
    pub fn with_root_element(element: ElementBuilder) -> (Document, NodeId) {
        let mut doc = Document::new();
        let slot = element.build_slot(&mut doc);
        doc.link(ROOT, slot);
        let node = doc.node_at(slot);
        (doc, node)
    }
}

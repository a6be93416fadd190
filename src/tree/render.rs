//! Compact markup serialization for diagnostics and tests

use super::document::{Document, NodeId, NodeKind, TreeError};

impl Document {
    /// Serialize a node and its subtree
    ///
    /// The document root renders as the concatenation of its children.
    /// Empty elements are written self-closing.
    pub fn render(&self, node: NodeId) -> Result<String, TreeError> {
        let slot = self.slot_of(node)?;
        let mut out = String::new();
        self.render_slot(slot, &mut out);
        Ok(out)
    }

    /// Serialize only the children of a node, in order
    pub fn render_children(&self, node: NodeId) -> Result<String, TreeError> {
        let slot = self.slot_of(node)?;
        let mut out = String::new();
        for &child in self.data_at(slot).1 {
            self.render_slot(child, &mut out);
        }
        Ok(out)
    }

    fn render_slot(&self, slot: usize, out: &mut String) {
        let (kind, children) = self.data_at(slot);
        match kind {
            NodeKind::DocumentRoot => {
                for &child in children {
                    self.render_slot(child, out);
                }
            }
            NodeKind::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.render_slot(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

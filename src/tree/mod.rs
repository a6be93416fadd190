//! Arena-backed markup tree for mapped statement definitions
//!
//! Every [`Document`] is an arena of nodes addressed by [`NodeId`] handles.
//! A handle records which document it belongs to, so a node can never be
//! moved between arenas by accident: the only way across is
//! [`Document::import`], which deep-copies the subtree into the destination.
//!
//! # Example
//!
//! ```rust
//! use sql_include::tree::{Document, ElementBuilder};
//!
//! let (doc, select) = Document::with_root_element(
//!     ElementBuilder::new("select")
//!         .attr("id", "findAll")
//!         .text("select * from users"),
//! );
//! assert_eq!(
//!     doc.render(select).unwrap(),
//!     r#"<select id="findAll">select * from users</select>"#
//! );
//! ```

mod builder;
mod document;
mod render;

pub use builder::ElementBuilder;
pub use document::{Document, DocumentId, NodeId, NodeKind, TreeError};

//! SQL Include - fragment inclusion for mapped SQL statement trees
//!
//! This library expands `<include>` references in a statement tree into the
//! content of named, reusable `<sql>` fragments, substituting `${name}`
//! placeholders from a layered variable context.
//!
//! # Example
//!
//! ```rust
//! use sql_include::{
//!     Document, ElementBuilder, Fragment, FragmentStore, IncludeResolver, MapperNamespace,
//!     PropertyParser, Resolution,
//! };
//!
//! let mut fragments = FragmentStore::new();
//! fragments
//!     .insert(
//!         "users.columns",
//!         Fragment::from_builder(
//!             ElementBuilder::new("sql")
//!                 .attr("id", "columns")
//!                 .text("${alias}.id, ${alias}.name"),
//!         ),
//!     )
//!     .unwrap();
//!
//! let (mut doc, select) = Document::with_root_element(
//!     ElementBuilder::new("select")
//!         .attr("id", "findAll")
//!         .text("select ")
//!         .child(
//!             ElementBuilder::new("include")
//!                 .attr("refid", "columns")
//!                 .child(
//!                     ElementBuilder::new("property")
//!                         .attr("name", "alias")
//!                         .attr("value", "u"),
//!                 ),
//!         )
//!         .text(" from users u"),
//! );
//!
//! let namespace = MapperNamespace::new("users");
//! let parser = PropertyParser::default();
//! let resolver = IncludeResolver::new(&fragments, &namespace, &parser);
//!
//! let resolution = resolver.resolve_includes(&mut doc, select).unwrap();
//! assert_eq!(resolution, Resolution::Complete);
//! assert_eq!(
//!     doc.render(select).unwrap(),
//!     r#"<select id="findAll">select u.id, u.name from users u</select>"#
//! );
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod include;
pub mod namespace;
pub mod placeholder;
pub mod tree;

pub use config::{ConfigError, ResolverConfig};
pub use context::VariableContext;
pub use error::{ErrorKind, IncludeError, MissingFragment};
pub use include::{
    Fragment, FragmentRegistry, FragmentStore, IncludeResolver, PendingStatements, RegistryError,
    Resolution, Statement,
};
pub use namespace::{MapperNamespace, NamespaceError, NamespaceResolver};
pub use placeholder::{
    MissingPolicy, PlaceholderConfig, PlaceholderError, PropertyParser, Substitute,
};
pub use tree::{Document, DocumentId, ElementBuilder, NodeId, NodeKind, TreeError};

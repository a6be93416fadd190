//! Fragment inclusion for mapped statement trees
//!
//! This module expands `<include>` elements into the content of registered
//! `<sql>` fragments. Each inclusion site can declare variables for the
//! fragment it pulls in:
//!
//! ```text
//! <sql id="columns">${alias}.id, ${alias}.name</sql>
//!
//! <select id="findAll">
//!   select <include refid="columns"><property name="alias" value="u"/></include>
//!   from users u
//! </select>
//! ```
//!
//! A reference to a fragment that is not registered yet is reported as
//! [`Resolution::Deferred`] so a multi-file build can retry the statement
//! later, for example through [`PendingStatements`].

mod pending;
mod registry;
mod resolver;

pub use pending::{PendingStatements, Statement};
pub use registry::{Fragment, FragmentRegistry, FragmentStore, RegistryError};
pub use resolver::{IncludeResolver, Resolution, DEFAULT_MAX_INCLUDE_DEPTH, INCLUDE, REFID};

//! Resolver configuration loaded from TOML

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::context::VariableContext;
use crate::include::DEFAULT_MAX_INCLUDE_DEPTH;
use crate::placeholder::{PlaceholderConfig, PropertyParser};

/// Errors that can occur when loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration for include resolution
///
/// ```toml
/// max_include_depth = 64
///
/// [variables]
/// schema = "app"
///
/// [placeholder]
/// enable_default_value = true
/// default_value_separator = ":"
/// on_missing = "keep"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest allowed chain of nested includes
    pub max_include_depth: usize,
    /// Global variables seeding every resolution
    pub variables: BTreeMap<String, String>,
    pub placeholder: PlaceholderConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            variables: BTreeMap::new(),
            placeholder: PlaceholderConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Add a global variable
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderConfig) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Seed context built from the global variables
    pub fn variables(&self) -> VariableContext {
        VariableContext::from(self.variables.clone())
    }

    /// Placeholder substitutor configured by this file
    pub fn property_parser(&self) -> PropertyParser {
        PropertyParser::new(self.placeholder.clone())
    }
}

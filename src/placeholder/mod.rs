//! Placeholder substitution for `${name}` references
//!
//! The include resolver only depends on the [`Substitute`] trait. The crate
//! ships [`PropertyParser`], which implements the usual placeholder rules:
//!
//! - `${key}` becomes the value of `key`
//! - `\${` is a literal `${`, and `\}` inside a placeholder is a literal `}`
//! - an unterminated `${` is copied through unchanged
//! - with default values enabled, `${key:fallback}` falls back when `key` is unset
//! - unknown keys are kept verbatim or rejected, per [`MissingPolicy`]

pub mod lexer;

use serde::Deserialize;
use thiserror::Error;

use crate::context::VariableContext;

use lexer::Token;

/// Errors raised while substituting placeholders
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    /// Placeholder refers to a variable that is not defined
    #[error("undefined variable '{key}'")]
    Undefined { key: String },

    /// Input the lexer could not tokenize
    #[error("unrecognized input at byte {offset}")]
    Lex { offset: usize },
}

/// Replaces placeholders in text using a variable context
pub trait Substitute {
    fn substitute(&self, text: &str, vars: &VariableContext) -> Result<String, PlaceholderError>;
}

/// What to do with a placeholder whose key is not defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Copy `${key}` through unchanged
    #[default]
    Keep,
    /// Fail with [`PlaceholderError::Undefined`]
    Fail,
}

/// Configuration for [`PropertyParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Allow `${key<separator>fallback}`
    pub enable_default_value: bool,
    /// Separator between key and fallback value
    pub default_value_separator: String,
    pub on_missing: MissingPolicy,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            enable_default_value: false,
            default_value_separator: ":".to_string(),
            on_missing: MissingPolicy::Keep,
        }
    }
}

impl PlaceholderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fallback values with the given separator
    pub fn with_default_values(mut self, separator: impl Into<String>) -> Self {
        self.enable_default_value = true;
        self.default_value_separator = separator.into();
        self
    }

    pub fn with_missing_policy(mut self, policy: MissingPolicy) -> Self {
        self.on_missing = policy;
        self
    }
}

/// Default [`Substitute`] implementation
#[derive(Debug, Clone, Default)]
pub struct PropertyParser {
    config: PlaceholderConfig,
}

/// An opened `${` waiting for its closing brace
struct OpenPlaceholder {
    start: usize,
    key: String,
}

impl PropertyParser {
    pub fn new(config: PlaceholderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaceholderConfig {
        &self.config
    }

    fn resolve(&self, content: &str, vars: &VariableContext) -> Result<String, PlaceholderError> {
        let separator = self.config.default_value_separator.as_str();
        if self.config.enable_default_value && !separator.is_empty() {
            if let Some((key, fallback)) = content.split_once(separator) {
                return Ok(vars.get(key).unwrap_or(fallback).to_string());
            }
        }

        match vars.get(content) {
            Some(value) => Ok(value.to_string()),
            None => match self.config.on_missing {
                MissingPolicy::Keep => Ok(format!("${{{}}}", content)),
                MissingPolicy::Fail => Err(PlaceholderError::Undefined {
                    key: content.to_string(),
                }),
            },
        }
    }
}

impl Substitute for PropertyParser {
    fn substitute(&self, text: &str, vars: &VariableContext) -> Result<String, PlaceholderError> {
        if !text.contains("${") {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut open: Option<OpenPlaceholder> = None;

        for (token, span) in lexer::lex(text) {
            let token = token.map_err(|()| PlaceholderError::Lex { offset: span.start })?;
            let slice = &text[span.clone()];
            match open.as_mut() {
                None => match token {
                    Token::EscapedOpen => out.push_str("${"),
                    Token::Open => {
                        open = Some(OpenPlaceholder {
                            start: span.start,
                            key: String::new(),
                        })
                    }
                    _ => out.push_str(slice),
                },
                Some(placeholder) => match token {
                    Token::EscapedClose => placeholder.key.push('}'),
                    Token::Close => {
                        let key = std::mem::take(&mut placeholder.key);
                        out.push_str(&self.resolve(&key, vars)?);
                        open = None;
                    }
                    _ => placeholder.key.push_str(slice),
                },
            }
        }

        if let Some(placeholder) = open {
            out.push_str(&text[placeholder.start..]);
        }
        Ok(out)
    }
}

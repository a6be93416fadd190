//! Layered variable context for placeholder substitution

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::IncludeError;
use crate::placeholder::Substitute;

/// Key/value variables visible at one point of a statement tree
///
/// Cloning is cheap: layers that add nothing share storage with their
/// parent. Deriving a child never changes the parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    vars: Arc<BTreeMap<String, String>>,
}

impl VariableContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Iterate over variables in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set a variable on this context, copying shared storage if needed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        Arc::make_mut(&mut self.vars).insert(key.into(), value.into());
    }

    /// Whether two contexts share the same storage
    pub fn shares_storage(&self, other: &VariableContext) -> bool {
        Arc::ptr_eq(&self.vars, &other.vars)
    }

    /// Build a child layer from the declarations of one inclusion site
    ///
    /// Every declared value is substituted against `self` only, so a value
    /// can refer to inherited variables but not to its siblings. Declaring
    /// a name twice fails even if both values agree. Without declarations
    /// the child shares storage with `self`.
    pub fn derive<S>(
        &self,
        declarations: &[(String, String)],
        substitutor: &S,
    ) -> Result<VariableContext, IncludeError>
    where
        S: Substitute + ?Sized,
    {
        if declarations.is_empty() {
            return Ok(self.clone());
        }

        let mut declared: BTreeMap<String, String> = BTreeMap::new();
        for (name, raw) in declarations {
            let value = substitutor.substitute(raw, self)?;
            if declared.insert(name.clone(), value).is_some() {
                return Err(IncludeError::DuplicateVariable { name: name.clone() });
            }
        }

        let mut vars = (*self.vars).clone();
        vars.extend(declared);
        tracing::trace!(
            inherited = self.len(),
            declared = declarations.len(),
            "derived variable context"
        );
        Ok(Self {
            vars: Arc::new(vars),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for VariableContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<BTreeMap<String, String>> for VariableContext {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }
}

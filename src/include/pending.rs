//! Statements waiting for fragments from source units not processed yet

use crate::error::{IncludeError, MissingFragment};
use crate::tree::Document;

use super::resolver::{IncludeResolver, Resolution};

/// A statement definition: an id and the document holding its tree
#[derive(Debug)]
pub struct Statement {
    pub id: String,
    pub document: Document,
}

impl Statement {
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }

    /// Resolve a working copy, leaving `self` untouched
    fn attempt(&self, resolver: &IncludeResolver<'_>) -> Result<Attempt, IncludeError> {
        let mut working = self.document.duplicate();
        let root = working.root();
        match resolver.resolve_includes(&mut working, root)? {
            Resolution::Complete => Ok(Attempt::Resolved(Statement {
                id: self.id.clone(),
                document: working,
            })),
            Resolution::Deferred(missing) => Ok(Attempt::Deferred(missing)),
        }
    }
}

enum Attempt {
    Resolved(Statement),
    Deferred(MissingFragment),
}

#[derive(Debug)]
struct Pending {
    statement: Statement,
    missing: MissingFragment,
}

/// Queue of statements whose includes could not be resolved yet
///
/// Queued statements are kept exactly as submitted; every retry starts
/// from an untouched copy.
#[derive(Debug, Default)]
pub struct PendingStatements {
    queue: Vec<Pending>,
}

impl PendingStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fragment ids currently blocking queued statements
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|p| p.missing.refid.as_str())
    }

    /// Ids of the queued statements, in submission order
    pub fn statement_ids(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|p| p.statement.id.as_str())
    }

    /// Resolve a statement, or queue it if a fragment is missing
    ///
    /// Returns the resolved statement, or `None` when it was queued.
    pub fn resolve_or_defer(
        &mut self,
        resolver: &IncludeResolver<'_>,
        statement: Statement,
    ) -> Result<Option<Statement>, IncludeError> {
        match statement.attempt(resolver)? {
            Attempt::Resolved(resolved) => Ok(Some(resolved)),
            Attempt::Deferred(missing) => {
                tracing::debug!(
                    statement = %statement.id,
                    refid = %missing.refid,
                    "statement deferred"
                );
                self.queue.push(Pending { statement, missing });
                Ok(None)
            }
        }
    }

    /// Retry every queued statement once, in submission order
    ///
    /// Returns the statements that resolved this time. If any statement
    /// fails with a fatal error the queue is left as it was before the call.
    pub fn retry(
        &mut self,
        resolver: &IncludeResolver<'_>,
    ) -> Result<Vec<Statement>, IncludeError> {
        let mut completed = Vec::new();
        let mut outcomes = Vec::with_capacity(self.queue.len());

        for pending in &self.queue {
            outcomes.push(match pending.statement.attempt(resolver)? {
                Attempt::Resolved(resolved) => {
                    completed.push(resolved);
                    None
                }
                Attempt::Deferred(missing) => Some(missing),
            });
        }

        let queue = std::mem::take(&mut self.queue);
        self.queue = queue
            .into_iter()
            .zip(outcomes)
            .filter_map(|(mut pending, outcome)| {
                outcome.map(|missing| {
                    pending.missing = missing;
                    pending
                })
            })
            .collect();

        tracing::debug!(
            resolved = completed.len(),
            remaining = self.queue.len(),
            "retried pending statements"
        );
        Ok(completed)
    }
}

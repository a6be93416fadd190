//! Include resolution - expands `<include>` references into fragment content

use crate::config::ResolverConfig;
use crate::context::VariableContext;
use crate::error::{IncludeError, MissingFragment};
use crate::namespace::NamespaceResolver;
use crate::placeholder::{PlaceholderError, Substitute};
use crate::tree::{Document, NodeId, NodeKind, TreeError};

use super::registry::FragmentRegistry;

/// Element name of an inclusion site
pub const INCLUDE: &str = "include";
/// Attribute naming the fragment to include
pub const REFID: &str = "refid";

/// Default bound on nested includes
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Outcome of a resolution pass that did not fail outright
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Resolution {
    /// Every include was expanded
    Complete,
    /// A fragment is not registered yet; retry the whole statement later
    Deferred(MissingFragment),
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        matches!(self, Resolution::Complete)
    }
}

/// Expands include references in statement trees
///
/// The collaborators are borrowed for the duration of a build phase; the
/// registry is only read.
pub struct IncludeResolver<'a> {
    registry: &'a dyn FragmentRegistry,
    namespace: &'a dyn NamespaceResolver,
    substitutor: &'a dyn Substitute,
    globals: VariableContext,
    max_depth: usize,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(
        registry: &'a dyn FragmentRegistry,
        namespace: &'a dyn NamespaceResolver,
        substitutor: &'a dyn Substitute,
    ) -> Self {
        Self {
            registry,
            namespace,
            substitutor,
            globals: VariableContext::new(),
            max_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Seed context used at the top of every resolution
    pub fn with_globals(mut self, globals: VariableContext) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Apply the global variables and depth limit from a configuration
    ///
    /// The placeholder options are not applied here: the substitutor is
    /// borrowed, so pass `config.property_parser()` to [`IncludeResolver::new`].
    pub fn with_config(self, config: &ResolverConfig) -> Self {
        self.with_globals(config.variables())
            .with_max_depth(config.max_include_depth)
    }

    pub fn globals(&self) -> &VariableContext {
        &self.globals
    }

    /// Expand every include below `root`, in place
    ///
    /// On `Deferred` or on error the tree may be partially expanded; callers
    /// are expected to discard it and retry from an untouched copy.
    pub fn resolve_includes(
        &self,
        document: &mut Document,
        root: NodeId,
    ) -> Result<Resolution, IncludeError> {
        let mut expansion = Expansion {
            resolver: self,
            chain: Vec::new(),
        };
        match expansion.visit(document, root, &self.globals, false) {
            Ok(()) => Ok(Resolution::Complete),
            Err(Interrupt::Deferred(missing)) => {
                tracing::debug!(refid = %missing.refid, "include resolution deferred");
                Ok(Resolution::Deferred(missing))
            }
            Err(Interrupt::Fatal(error)) => Err(error),
        }
    }
}

/// Why a resolution pass stopped early
enum Interrupt {
    Deferred(MissingFragment),
    Fatal(IncludeError),
}

impl From<MissingFragment> for Interrupt {
    fn from(missing: MissingFragment) -> Self {
        Interrupt::Deferred(missing)
    }
}

impl From<IncludeError> for Interrupt {
    fn from(error: IncludeError) -> Self {
        Interrupt::Fatal(error)
    }
}

impl From<TreeError> for Interrupt {
    fn from(error: TreeError) -> Self {
        Interrupt::Fatal(error.into())
    }
}

impl From<PlaceholderError> for Interrupt {
    fn from(error: PlaceholderError) -> Self {
        Interrupt::Fatal(error.into())
    }
}

impl From<crate::namespace::NamespaceError> for Interrupt {
    fn from(error: crate::namespace::NamespaceError) -> Self {
        Interrupt::Fatal(error.into())
    }
}

/// What a node asks of the visitor
enum Step {
    Include,
    Element,
    Text,
    Descend,
    Leaf,
}

/// State of one top-level resolution pass
struct Expansion<'r, 'a> {
    resolver: &'r IncludeResolver<'a>,
    /// Fragments currently being expanded with their scoped variables,
    /// outermost first
    chain: Vec<(String, VariableContext)>,
}

impl Expansion<'_, '_> {
    fn visit(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        context: &VariableContext,
        included: bool,
    ) -> Result<(), Interrupt> {
        let step = match doc.get(node)? {
            NodeKind::Element { name, .. } if name == INCLUDE => Step::Include,
            NodeKind::Element { .. } => Step::Element,
            NodeKind::Text(_) => Step::Text,
            NodeKind::DocumentRoot => Step::Descend,
            NodeKind::CData(_) | NodeKind::Comment(_) => Step::Leaf,
        };
        let substitute = included && !context.is_empty();

        match step {
            Step::Include => self.expand(doc, node, context),
            Step::Element => {
                if substitute {
                    self.substitute_attributes(doc, node, context)?;
                }
                self.visit_children(doc, node, context, included)
            }
            Step::Descend => self.visit_children(doc, node, context, included),
            Step::Text => {
                if substitute {
                    if let NodeKind::Text(text) = doc.get_mut(node)? {
                        *text = self.resolver.substitutor.substitute(text, context)?;
                    }
                }
                Ok(())
            }
            Step::Leaf => Ok(()),
        }
    }

    fn visit_children(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        context: &VariableContext,
        included: bool,
    ) -> Result<(), Interrupt> {
        // Snapshot: expanding an include splices new siblings into this list
        for child in doc.children(node)? {
            self.visit(doc, child, context, included)?;
        }
        Ok(())
    }

    fn substitute_attributes(
        &self,
        doc: &mut Document,
        node: NodeId,
        context: &VariableContext,
    ) -> Result<(), Interrupt> {
        if let NodeKind::Element { attributes, .. } = doc.get_mut(node)? {
            for (_, value) in attributes.iter_mut() {
                *value = self.resolver.substitutor.substitute(value, context)?;
            }
        }
        Ok(())
    }

    fn expand(
        &mut self,
        doc: &mut Document,
        include: NodeId,
        context: &VariableContext,
    ) -> Result<(), Interrupt> {
        let resolver = self.resolver;

        let refid = doc
            .attribute(include, REFID)?
            .ok_or_else(|| {
                IncludeError::malformed("include element is missing its refid attribute")
            })?
            .to_string();
        let refid = resolver.substitutor.substitute(&refid, context)?;
        let qualified = resolver.namespace.qualify(&refid, true)?;

        let fragment = resolver
            .registry
            .lookup(&qualified)
            .ok_or_else(|| MissingFragment {
                refid: qualified.clone(),
            })?;

        let declarations = declarations(doc, include, &refid)?;
        let scoped = context.derive(&declarations, resolver.substitutor)?;

        // Expansion depends only on the fragment and its scope, so meeting
        // the same pair again can never terminate
        if self
            .chain
            .iter()
            .any(|(id, vars)| *id == qualified && *vars == scoped)
        {
            let mut chain: Vec<&str> = self.chain.iter().map(|(id, _)| id.as_str()).collect();
            chain.push(&qualified);
            return Err(IncludeError::CyclicInclude {
                chain: chain.join(" -> "),
            }
            .into());
        }
        if self.chain.len() >= resolver.max_depth {
            return Err(IncludeError::DepthExceeded {
                limit: resolver.max_depth,
                refid: qualified,
            }
            .into());
        }

        tracing::debug!(
            refid = %refid,
            fragment = %qualified,
            depth = self.chain.len(),
            "expanding include"
        );

        // Fragments live in their own arena, so the copy is also the import
        let copy = doc.import(fragment.document(), fragment.root())?;

        self.chain.push((qualified, scoped.clone()));
        let expanded = self.visit(doc, copy, &scoped, true);
        self.chain.pop();
        expanded?;

        doc.replace_with_children(include, copy)?;
        Ok(())
    }
}

/// Collect the `name`/`value` pairs declared by an include's element children
fn declarations(
    doc: &Document,
    include: NodeId,
    refid: &str,
) -> Result<Vec<(String, String)>, IncludeError> {
    let mut out = Vec::new();
    for child in doc.children(include)? {
        let Some(element) = doc.get(child)?.element_name() else {
            continue;
        };
        let name = doc.attribute(child, "name")?.ok_or_else(|| {
            IncludeError::malformed(format!(
                "<{}> in include '{}' is missing its name attribute",
                element, refid
            ))
        })?;
        let value = doc.attribute(child, "value")?.ok_or_else(|| {
            IncludeError::malformed(format!(
                "<{}> '{}' in include '{}' is missing its value attribute",
                element, name, refid
            ))
        })?;
        out.push((name.to_string(), value.to_string()));
    }
    Ok(out)
}

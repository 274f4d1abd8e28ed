//! Rewrite rules.
//!
//! A rule pairs a [`Pattern`] with a replacement. There are two kinds:
//!
//! - a [`Rule`] is used by [`Engine::reduce`](crate::Engine::reduce). It rewrites a matching node
//!   into exactly one replacement.
//! - a [`Transform`] is used by [`Engine::simplify`](crate::Engine::simplify). It may rewrite a
//!   matching node into several alternative forms at once, some of which may be more complex than
//!   the input. Transforms are how search gets past forms that plain reduction cannot.
//!
//! Every rule carries a unique **key** and a human-readable **description**. Rules are checked
//! when they are built: a replacement that reads a capture its pattern never binds, or a template
//! branch with the wrong number of children, is an error right away.

mod set;
mod template;

pub use set::{RuleEntry, RuleSet};
pub use template::Template;

use cas_error::Error;
use crate::{
    context::Context,
    error::unbound_capture,
    matcher::{Captures, MatchEnv, Name, Pattern},
    node::Node,
};
use std::{collections::BTreeSet, fmt, rc::Rc};

/// The identity of a rule within a [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    /// Returns the position of the rule in its rule set.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The key and description of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    /// The unique key of the rule.
    pub key: Rc<str>,

    /// A human-readable description of the rule, such as `0+a = a`.
    pub description: Rc<str>,
}

impl RuleInfo {
    fn new(key: &str, description: &str) -> Self {
        Self { key: Rc::from(key), description: Rc::from(description) }
    }
}

/// A function computing a replacement from the captures of a match.
pub type ComputeFn = Rc<dyn Fn(&Captures, &Context) -> Option<Node>>;

/// How a replacement is built.
#[derive(Clone)]
pub enum Rewrite {
    /// Build the replacement from a template.
    Template(Template),

    /// Compute the replacement with a function, which may decline by returning [`None`].
    Compute {
        /// The captures the function reads.
        uses: Vec<Name>,

        /// The function.
        f: ComputeFn,
    },
}

impl Rewrite {
    /// A computed replacement reading the captures named in `uses`.
    pub fn compute(
        uses: &[&str],
        f: impl Fn(&Captures, &Context) -> Option<Node> + 'static,
    ) -> Self {
        Self::Compute {
            uses: uses.iter().map(|&name| Rc::from(name)).collect(),
            f: Rc::new(f),
        }
    }

    /// Builds the replacement.
    pub fn apply(&self, captures: &Captures, ctx: &Context) -> Option<Node> {
        match self {
            Self::Template(template) => template.instantiate(captures),
            Self::Compute { f, .. } => f(captures, ctx),
        }
    }

    /// Adds every capture name this rewrite reads to `names`.
    pub fn references(&self, names: &mut BTreeSet<Name>) {
        match self {
            Self::Template(template) => template.references(names),
            Self::Compute { uses, .. } => names.extend(uses.iter().cloned()),
        }
    }

    /// Checks the rewrite against the captures bound by the pattern of the rule it belongs to.
    fn check(&self, info: &RuleInfo, bound: &BTreeSet<Name>) -> Result<(), Error> {
        let mut used = BTreeSet::new();
        self.references(&mut used);
        if let Some(name) = used.iter().find(|name| !bound.contains(*name)) {
            return Err(unbound_capture(name, &info.description, bound.iter().map(|name| &**name)));
        }

        match self {
            Self::Template(template) => template.check_arity(),
            Self::Compute { .. } => Ok(()),
        }
    }
}

impl fmt::Debug for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Compute { uses, .. } => f.debug_struct("Compute").field("uses", uses).finish_non_exhaustive(),
        }
    }
}

impl From<Template> for Rewrite {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

/// One replacement of a rule, with the depth to which its result's children are re-reduced.
#[derive(Debug, Clone)]
pub struct Output {
    /// How the replacement is built.
    pub rewrite: Rewrite,

    /// How many levels below the replacement are reduced again after the rule applies. [`None`]
    /// means as deep as the engine's depth budget allows.
    ///
    /// The captures of a match are already reduced, so a rule that only rearranges captures near
    /// the top of the replacement can set this to the depth of the new structure it builds.
    pub resume_depth: Option<usize>,
}

impl Output {
    /// An output with no resume depth.
    pub fn new(rewrite: impl Into<Rewrite>) -> Self {
        Self { rewrite: rewrite.into(), resume_depth: None }
    }

    /// Sets the resume depth. Returns an updated [`Output`] for chaining.
    pub fn resume_depth(mut self, depth: usize) -> Self {
        self.resume_depth = Some(depth);
        self
    }
}

/// Collects the captures bound by a pattern.
fn bound_by(pattern: &Pattern) -> BTreeSet<Name> {
    let mut bound = BTreeSet::new();
    pattern.bindings(&mut bound);
    bound
}

/// A reduction rule: a pattern and a single replacement.
#[derive(Debug)]
pub struct Rule {
    info: RuleInfo,
    pattern: Pattern,
    output: Output,
}

impl Rule {
    /// Creates a rule, checking its replacement against its pattern.
    pub fn new(
        key: &str,
        description: &str,
        pattern: Pattern,
        rewrite: impl Into<Rewrite>,
    ) -> Result<Self, Error> {
        let info = RuleInfo::new(key, description);
        let output = Output::new(rewrite);
        output.rewrite.check(&info, &bound_by(&pattern))?;
        Ok(Self { info, pattern, output })
    }

    /// Sets the resume depth of the rule. Returns an updated [`Rule`] for chaining.
    pub fn resume_depth(mut self, depth: usize) -> Self {
        self.output.resume_depth = Some(depth);
        self
    }

    /// The key and description of the rule.
    pub fn info(&self) -> &RuleInfo {
        &self.info
    }

    /// The pattern of the rule.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The resume depth of the rule.
    pub fn resume(&self) -> Option<usize> {
        self.output.resume_depth
    }

    /// Applies the rule to the node. Returns [`None`] if the pattern does not match or the
    /// replacement declines.
    pub fn apply(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>) -> Option<Node> {
        let captures = self.pattern.match_node(node, ctx, env, Captures::new())?;
        self.output.rewrite.apply(&captures, ctx)
    }
}

/// A search rule: a pattern and several alternative replacements.
#[derive(Debug)]
pub struct Transform {
    info: RuleInfo,
    pattern: Pattern,
    outputs: Vec<Output>,
}

impl Transform {
    /// Creates a transform, checking each replacement against its pattern.
    pub fn new(
        key: &str,
        description: &str,
        pattern: Pattern,
        outputs: Vec<Output>,
    ) -> Result<Self, Error> {
        let info = RuleInfo::new(key, description);
        let bound = bound_by(&pattern);
        for output in &outputs {
            output.rewrite.check(&info, &bound)?;
        }
        Ok(Self { info, pattern, outputs })
    }

    /// The key and description of the transform.
    pub fn info(&self) -> &RuleInfo {
        &self.info
    }

    /// The pattern of the transform.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Applies the transform to the node, returning each replacement built along with its resume
    /// depth. Replacements that decline are skipped.
    pub fn apply(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>) -> Vec<(Node, Option<usize>)> {
        let Some(captures) = self.pattern.match_node(node, ctx, env, Captures::new()) else {
            return Vec::new();
        };
        self.outputs
            .iter()
            .filter_map(|output| Some((output.rewrite.apply(&captures, ctx)?, output.resume_depth)))
            .collect()
    }
}

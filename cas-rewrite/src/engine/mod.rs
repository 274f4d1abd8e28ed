//! The rewriting engine.
//!
//! An [`Engine`] bundles everything a rewrite needs: the rules, the canonical order, the
//! complexity heuristic, the enter-context hooks, the set of commutative tags, and the budgets in
//! [`EngineOptions`]. Nothing is global; engines are built with an [`EngineBuilder`] and passed
//! around explicitly.
//!
//! The engine offers two strategies:
//!
//! - [`Engine::reduce`] rewrites a tree bottom-up to a local fixed point with the reduction rules.
//! - [`Engine::simplify`] searches for several equivalent forms with the transforms, best-first by
//!   complexity.
//!
//! An engine is single-threaded. It caches results in the metadata of the nodes it visits, so
//! nodes reduced by one engine should not be handed to an engine with different rules (see
//! [`crate::node::meta`]).

mod options;
mod reduce;
mod simplify;

pub use options::EngineOptions;

use cas_error::Error;
use crate::{
    complexity::default_complexity,
    context::{Context, ContextHooks},
    dispatch::{Candidates, DispatchTree},
    matcher::MatchEnv,
    node::{CanonicalOrder, DefaultOrder, Node, Tag},
    rule::{Rule, RuleEntry, RuleId, RuleSet, Transform},
    step::Step,
};
use log::debug;
use reduce::Reducer;
use std::{collections::HashSet, fmt};

/// A complexity heuristic.
type ComplexityFn = Box<dyn Fn(&Node, &Context) -> i64>;

/// Assembles an [`Engine`].
///
/// ```
/// use cas_rewrite::{matcher::{capture, commutative_rest, fixed}, EngineBuilder, Interner, Node, Rule, Template};
///
/// let mut interner = Interner::new();
/// let add = interner.tag("add");
/// let x = Node::symbol(interner.symbol("x"));
///
/// let engine = EngineBuilder::new()
///     .commutative(add.clone())
///     .rule(Rule::new(
///         "add-zero",
///         "0+a = a",
///         commutative_rest(add.clone(), vec![fixed(Node::int(0))], capture("_rest")),
///         Template::nary(add.clone(), vec![Template::spread("_rest")]),
///     )?)?
///     .build();
///
/// let node = Node::nary(add.clone(), [x.clone(), Node::int(0), x.clone()]);
/// assert_eq!(engine.reduce(&node), Node::nary(add, [x.clone(), x]));
/// # Ok::<(), cas_error::Error>(())
/// ```
pub struct EngineBuilder {
    order: Box<dyn CanonicalOrder>,
    complexity: ComplexityFn,
    hooks: ContextHooks,
    commutative: HashSet<Tag>,
    rules: RuleSet,
    options: EngineOptions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            order: Box::new(DefaultOrder),
            complexity: Box::new(|node: &Node, _: &Context| default_complexity(node)),
            hooks: ContextHooks::new(),
            commutative: HashSet::new(),
            rules: RuleSet::new(),
            options: EngineOptions::default(),
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("rules", &self.rules.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EngineBuilder {
    /// Creates a builder with the [`DefaultOrder`], the [`default_complexity`] heuristic, the
    /// default options, and no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the canonical order. Returns an updated [`EngineBuilder`] for chaining.
    pub fn order(mut self, order: impl CanonicalOrder + 'static) -> Self {
        self.order = Box::new(order);
        self
    }

    /// Sets the complexity heuristic. Returns an updated [`EngineBuilder`] for chaining.
    ///
    /// The heuristic must give the same score to the same node every time.
    pub fn complexity(mut self, complexity: impl Fn(&Node, &Context) -> i64 + 'static) -> Self {
        self.complexity = Box::new(complexity);
        self
    }

    /// Registers the enter-context hook for a binder tag. Returns an updated [`EngineBuilder`] for
    /// chaining.
    pub fn hook(
        mut self,
        tag: Tag,
        hook: impl Fn(&Node, &Context) -> Vec<Context> + 'static,
    ) -> Self {
        self.hooks.insert(tag, hook);
        self
    }

    /// Declares a tag commutative. Returns an updated [`EngineBuilder`] for chaining.
    ///
    /// The children of branches with a commutative tag are kept sorted by the canonical order
    /// during reduction. Binder tags, whose children see different contexts, should not be
    /// commutative.
    pub fn commutative(mut self, tag: Tag) -> Self {
        self.commutative.insert(tag);
        self
    }

    /// Sets the options. Returns an updated [`EngineBuilder`] for chaining.
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a reduction rule. Returns an error if another rule has the same key.
    pub fn rule(mut self, rule: Rule) -> Result<Self, Error> {
        self.rules.add_rule(rule)?;
        Ok(self)
    }

    /// Registers a search rule. Returns an error if another rule has the same key.
    pub fn transform(mut self, transform: Transform) -> Result<Self, Error> {
        self.rules.add_transform(transform)?;
        Ok(self)
    }

    /// Prepares and indexes every rule, and builds the engine.
    pub fn build(self) -> Engine {
        let mut reduce_index = DispatchTree::new();
        let mut transform_index = DispatchTree::new();
        for (id, entry) in self.rules.iter() {
            match entry {
                RuleEntry::Reduce(rule) => {
                    rule.pattern().prepare(&*self.order);
                    reduce_index.insert(&**rule.pattern(), id);
                },
                RuleEntry::Transform(transform) => {
                    transform.pattern().prepare(&*self.order);
                    transform_index.insert(&**transform.pattern(), id);
                },
            }
        }
        debug!(
            "built engine with {} reduction rules and {} transforms",
            reduce_index.len(),
            transform_index.len(),
        );

        Engine {
            order: self.order,
            complexity: self.complexity,
            hooks: self.hooks,
            commutative: self.commutative,
            rules: self.rules,
            reduce_index,
            transform_index,
            options: self.options,
        }
    }
}

/// A term-rewriting engine.
///
/// For more information, see the [module-level documentation](self).
pub struct Engine {
    order: Box<dyn CanonicalOrder>,
    complexity: ComplexityFn,
    hooks: ContextHooks,
    commutative: HashSet<Tag>,
    rules: RuleSet,
    reduce_index: DispatchTree<RuleId>,
    transform_index: DispatchTree<RuleId>,
    options: EngineOptions,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules)
            .field("hooks", &self.hooks)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// The options of the engine.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The rules of the engine.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The environment matchers of this engine run in.
    pub fn env(&self) -> MatchEnv<'_> {
        MatchEnv::new(&*self.order, &self.hooks)
    }

    /// Scores the node with the engine's complexity heuristic.
    pub fn complexity(&self, node: &Node, ctx: &Context) -> i64 {
        (self.complexity)(node, ctx)
    }

    /// Returns true if the tag was declared commutative.
    pub fn is_commutative(&self, tag: &Tag) -> bool {
        self.commutative.contains(tag)
    }

    /// Returns the reduction rules that could apply to the node, in dispatch order.
    pub fn candidates(&self, node: &Node) -> Candidates<'_, RuleId> {
        self.reduce_index.query(node)
    }

    /// Returns the transforms that could apply to the node, in dispatch order.
    pub fn transform_candidates(&self, node: &Node) -> Candidates<'_, RuleId> {
        self.transform_index.query(node)
    }

    /// Reduces the node under an empty context.
    pub fn reduce(&self, node: &Node) -> Node {
        self.reduce_in(node, &Context::new())
    }

    /// Reduces the node under the given context.
    ///
    /// Children are reduced first, each under the context the hooks give it. Then the reduction
    /// rules are tried on the node in dispatch order, and the first one that changes it is applied,
    /// after which the new node's children are reduced again and the rules are tried once more.
    /// This repeats until no rule changes the node, or until a budget runs out.
    pub fn reduce_in(&self, node: &Node, ctx: &Context) -> Node {
        Reducer::new(self, &mut ()).run(node, ctx)
    }

    /// Reduces the node under an empty context, also returning every rule application made, in
    /// order.
    ///
    /// Results cached by earlier reductions are reused without replaying their steps, so pass a
    /// freshly built node to see every step.
    pub fn reduce_with_steps(&self, node: &Node) -> (Node, Vec<Step>) {
        let mut steps = Vec::new();
        let reduced = Reducer::new(self, &mut steps).run(node, &Context::new());
        (reduced, steps)
    }

    /// Searches for simpler forms of the node under an empty context.
    pub fn simplify(&self, node: &Node) -> Vec<Node> {
        self.simplify_in(node, &Context::new())
    }
}

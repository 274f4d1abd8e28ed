//! Bottom-up reduction to a local fixed point.

use crate::{
    context::Context,
    node::{meta::MetaKey, Node, WeakNode},
    rule::Rule,
    step::{Step, StepCollector},
};
use log::debug;
use std::rc::Rc;
use super::Engine;

/// The fully-reduced form of a node, as cached in its metadata.
///
/// A node that reduces to a different node only holds a weak reference to it, since the reduced
/// form may contain the original node.
enum Reduced {
    /// The node is its own reduced form.
    Itself,

    /// The node reduces to another node.
    Other(WeakNode),
}

/// The state of one reduction.
///
/// Every function here returns the node it produced along with a flag set when a budget cut the
/// work short. Truncated results are never cached.
pub(super) struct Reducer<'e, 'c> {
    engine: &'e Engine,

    /// Rule applications left before the step budget runs out.
    steps_left: usize,
    collector: &'c mut dyn StepCollector<Step>,
}

impl<'e, 'c> Reducer<'e, 'c> {
    pub(super) fn new(engine: &'e Engine, collector: &'c mut dyn StepCollector<Step>) -> Self {
        Self {
            engine,
            steps_left: engine.options.max_reduce_steps,
            collector,
        }
    }

    /// Reduces the node with the engine's full depth budget.
    pub(super) fn run(mut self, node: &Node, ctx: &Context) -> Node {
        self.reduce(node, ctx, self.engine.options.max_depth, true).0
    }

    /// Reduces a node whose children are already mostly reduced, re-reducing them only down to
    /// the given resume depth.
    pub(super) fn resume(
        mut self,
        node: &Node,
        ctx: &Context,
        depth: usize,
        resume: Option<usize>,
    ) -> Node {
        if depth == 0 {
            return node.clone();
        }
        if let Some(reduced) = self.cached(node, ctx) {
            return reduced;
        }

        let (current, truncated) = self.descend(node, ctx, depth, true, resume);
        let (result, truncated) = self.settle(current, ctx, depth, true, truncated);
        if !truncated {
            self.store(node, &result, ctx);
        }
        result
    }

    /// Returns the cached reduced form of the node, if there is one.
    fn cached(&self, node: &Node, ctx: &Context) -> Option<Node> {
        match &*node.meta().get::<Reduced>(&MetaKey::Reduced(ctx.clone()))? {
            Reduced::Itself => Some(node.clone()),
            Reduced::Other(reduced) => reduced.upgrade(),
        }
    }

    /// Caches the reduced form of the node under both identities.
    fn store(&self, node: &Node, result: &Node, ctx: &Context) {
        result.meta().insert(MetaKey::Reduced(ctx.clone()), Reduced::Itself);
        if !node.ptr_eq(result) {
            node.meta().insert(MetaKey::Reduced(ctx.clone()), Reduced::Other(result.downgrade()));
        }
    }

    /// Reduces the node, visiting at most `depth` levels of it.
    ///
    /// `from_budget` is false when `depth` comes from a rule's resume depth rather than the
    /// engine's depth budget. Nodes left alone because of a resume depth are already reduced, so
    /// they do not count as truncated.
    fn reduce(&mut self, node: &Node, ctx: &Context, depth: usize, from_budget: bool) -> (Node, bool) {
        if depth == 0 {
            if from_budget {
                debug!("depth budget reached at `{}`", node);
            }
            return (node.clone(), from_budget);
        }

        if let Some(reduced) = self.cached(node, ctx) {
            return (reduced, false);
        }

        let (current, truncated) = self.reduce_children(node, ctx, depth - 1, from_budget);
        let (result, truncated) = self.settle(current, ctx, depth, from_budget, truncated);
        if !truncated {
            self.store(node, &result, ctx);
        }
        (result, truncated)
    }

    /// Reduces the children of a node at `depth`, limited by the resume depth if there is one.
    fn descend(
        &mut self,
        node: &Node,
        ctx: &Context,
        depth: usize,
        from_budget: bool,
        resume: Option<usize>,
    ) -> (Node, bool) {
        match resume {
            Some(limit) if limit < depth - 1 => self.reduce_children(node, ctx, limit, false),
            _ => self.reduce_children(node, ctx, depth - 1, from_budget),
        }
    }

    /// Applies rules to a node whose children are reduced, until none applies.
    fn settle(
        &mut self,
        mut current: Node,
        ctx: &Context,
        depth: usize,
        from_budget: bool,
        mut truncated: bool,
    ) -> (Node, bool) {
        loop {
            if self.steps_left == 0 {
                debug!("step budget exhausted at `{}`", current);
                return (current, true);
            }

            let Some((rule, next)) = self.apply_first(&current, ctx) else {
                return (current, truncated);
            };
            self.steps_left -= 1;
            debug!("applied `{}`: `{}` -> `{}`", rule.info().key, current, next);
            self.collector.push(Step {
                rule: Rc::clone(&rule.info().key),
                description: Rc::clone(&rule.info().description),
                before: current,
                after: next.clone(),
            });

            if let Some(reduced) = self.cached(&next, ctx) {
                return (reduced, false);
            }

            let limited = matches!(rule.resume(), Some(limit) if limit < depth - 1);
            let (resumed, resumed_truncated) = self.descend(&next, ctx, depth, from_budget, rule.resume());

            // captures moved below a resume depth keep the truncation of the node they came from
            truncated = resumed_truncated || (limited && truncated);
            current = resumed;
        }
    }

    /// Tries the candidate rules for the node in dispatch order, returning the first one that
    /// changes it along with the replacement.
    ///
    /// Rules that do not apply are flagged in the node's metadata and skipped from then on.
    fn apply_first(&self, node: &Node, ctx: &Context) -> Option<(&'e Rule, Node)> {
        let engine = self.engine;
        let env = engine.env();
        for id in engine.candidates(node) {
            let Some(rule) = engine.rules.rule(id) else {
                continue;
            };

            let tried = MetaKey::Tried(id, ctx.clone());
            if node.meta().contains(&tried) {
                continue;
            }

            match rule.apply(node, ctx, env) {
                Some(next) if next != *node => return Some((rule, next)),
                _ => {
                    node.meta().insert(tried, ());
                },
            }
        }
        None
    }

    /// Reduces each child of the node under its own context, then sorts the children if the tag is
    /// commutative.
    fn reduce_children(
        &mut self,
        node: &Node,
        ctx: &Context,
        depth: usize,
        from_budget: bool,
    ) -> (Node, bool) {
        if node.is_leaf() {
            return (node.clone(), false);
        }

        let contexts = self.engine.hooks.child_contexts(node, ctx);
        let mut children = Vec::with_capacity(contexts.len());
        let mut truncated = false;
        let mut changed = false;
        for (child, child_ctx) in node.children().iter().zip(&contexts) {
            let (reduced, child_truncated) = self.reduce(child, child_ctx, depth, from_budget);
            truncated |= child_truncated;
            changed |= !reduced.ptr_eq(child);
            children.push(reduced);
        }

        let order = &*self.engine.order;
        if node.tag().is_some_and(|tag| self.engine.is_commutative(tag)) && !order.is_sorted(&children) {
            children.sort_by(|a, b| order.compare(a, b));
            changed = true;
        }

        if changed {
            (node.rebuild(children), truncated)
        } else {
            (node.clone(), truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        engine::{EngineBuilder, EngineOptions},
        matcher::{any, capture, fixed, op1},
        node::Interner,
        rule::Template,
        testing::Arith,
    };
    use pretty_assertions::assert_eq;
    use super::*;
    use test_log::test;

    #[test]
    fn reduced_form_is_cached_both_ways() {
        let arith = Arith::new();
        let node = arith.add([arith.mul([Node::int(2), Node::int(3)]), arith.x()]);
        let reduced = arith.engine.reduce(&node);

        let key = MetaKey::Reduced(Context::new());
        assert!(node.meta().contains(&key));
        assert!(reduced.meta().contains(&key));
        assert!(arith.engine.reduce(&node).ptr_eq(&reduced));
    }

    #[test]
    fn failed_rules_are_flagged() {
        let arith = Arith::new();
        let node = arith.add([arith.x(), arith.y()]);
        arith.engine.reduce(&node);

        let add_zero = arith.engine.rules().id_of("add-zero").unwrap();
        assert!(node.meta().contains(&MetaKey::Tried(add_zero, Context::new())));
    }

    #[test]
    fn step_budget_truncates() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let x = Node::symbol(interner.symbol("x"));

        // f(_x) -> f(f(_x)) never terminates
        let engine = EngineBuilder::new()
            .options(EngineOptions::default().max_reduce_steps(3))
            .rule(Rule::new(
                "grow",
                "f(a) = f(f(a))",
                op1(f.clone(), capture("_x")),
                Template::unary(f.clone(), Template::unary(f.clone(), Template::capture("_x"))),
            ).unwrap())
            .unwrap()
            .build();

        let node = Node::unary(f.clone(), x.clone());
        let (reduced, steps) = engine.reduce_with_steps(&node);
        assert_eq!(steps.len(), 3);
        assert_eq!(reduced.height(), 4);
        assert!(!node.meta().contains(&MetaKey::Reduced(Context::new())));
    }

    #[test]
    fn depth_budget_leaves_deep_nodes() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let g = interner.tag("g");
        let x = Node::symbol(interner.symbol("x"));

        // x -> 0 anywhere
        let engine = EngineBuilder::new()
            .options(EngineOptions::default().max_depth(2))
            .rule(Rule::new("x-zero", "x = 0", fixed(x.clone()), Template::node(Node::int(0))).unwrap())
            .unwrap()
            .build();

        let shallow = Node::unary(f.clone(), x.clone());
        assert_eq!(engine.reduce(&shallow), Node::unary(f.clone(), Node::int(0)));

        let deep = Node::unary(f.clone(), Node::unary(g.clone(), x.clone()));
        assert_eq!(engine.reduce(&deep), deep);
        assert!(!deep.meta().contains(&MetaKey::Reduced(Context::new())));
    }

    #[test]
    fn resume_depth_limits_rereduction() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let g = interner.tag("g");
        let h = interner.tag("h");
        let x = Node::symbol(interner.symbol("x"));

        // f(_a) -> g(h(_a)), and h(_) -> 0
        let build = |resume: Option<usize>| {
            let mut wrap = Rule::new(
                "wrap",
                "f(a) = g(h(a))",
                op1(f.clone(), capture("_a")),
                Template::unary(g.clone(), Template::unary(h.clone(), Template::capture("_a"))),
            ).unwrap();
            if let Some(resume) = resume {
                wrap = wrap.resume_depth(resume);
            }
            EngineBuilder::new()
                .rule(wrap)
                .unwrap()
                .rule(Rule::new("h-zero", "h(a) = 0", op1(h.clone(), any()), Template::node(Node::int(0))).unwrap())
                .unwrap()
                .build()
        };

        // each engine gets its own node, since reduced forms are cached on it
        let node = || Node::unary(f.clone(), x.clone());
        let folded = Node::unary(g.clone(), Node::int(0));
        assert_eq!(build(None).reduce(&node()), folded);
        assert_eq!(build(Some(1)).reduce(&node()), folded);
        assert_eq!(
            build(Some(0)).reduce(&node()),
            Node::unary(g.clone(), Node::unary(h.clone(), x.clone())),
        );
    }

    #[test]
    fn depth_budget_of_zero_ignores_cached_forms() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let x = Node::symbol(interner.symbol("x"));

        let build = |options: EngineOptions| {
            EngineBuilder::new()
                .options(options)
                .rule(Rule::new("x-zero", "x = 0", fixed(x.clone()), Template::node(Node::int(0))).unwrap())
                .unwrap()
                .build()
        };

        let node = Node::unary(f.clone(), x.clone());
        assert_eq!(build(EngineOptions::default()).reduce(&node), Node::unary(f, Node::int(0)));
        assert_eq!(build(EngineOptions::default().max_depth(0)).reduce(&node), node);
    }
}

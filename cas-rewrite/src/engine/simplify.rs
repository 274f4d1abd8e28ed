//! Best-first search for simpler equivalent forms.
//!
//! Reduction only ever moves forward: once no rule applies, it stops, even if a detour through a
//! more complex form would lead somewhere simpler. Search explores those detours. Starting from
//! the reduced input, it repeatedly expands the least complex form found so far into its
//! **neighbors**:
//!
//! - structural neighbors, where one child is replaced with one of its own neighbors,
//! - transform neighbors, produced by applying every matching [`Transform`](crate::Transform) to
//!   the form itself.
//!
//! Every neighbor is reduced before it is scored. The search stops when the frontier is empty or
//! the search budget runs out.

use crate::{
    context::Context,
    node::{meta::MetaKey, CanonicalOrder, Node, WeakNode},
};
use log::debug;
use std::{
    cell::RefCell,
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashSet},
};
use super::{reduce::Reducer, Engine};

/// A form found by search, ordered by complexity, then by the engine's canonical order.
#[derive(Clone)]
struct Ranked<'e> {
    complexity: i64,
    node: Node,
    order: &'e dyn CanonicalOrder,
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.complexity.cmp(&other.complexity)
            .then_with(|| self.order.compare(&self.node, &other.node))
    }
}

/// The state of one search.
struct Search<'e> {
    engine: &'e Engine,
}

impl<'e> Search<'e> {
    fn rank(&self, node: Node, ctx: &Context) -> Ranked<'e> {
        Ranked {
            complexity: self.engine.complexity(&node, ctx),
            node,
            order: &*self.engine.order,
        }
    }

    /// Reduces a freshly built neighbor with its own step budget.
    fn settle(&self, node: &Node, ctx: &Context, depth: usize, resume: Option<usize>) -> Node {
        Reducer::new(self.engine, &mut ()).resume(node, ctx, depth, resume)
    }

    /// Returns the forms one rewrite away from the node, each already reduced.
    ///
    /// Neighbor lists are cached in the node's metadata when the whole subtree was within the depth
    /// budget. The cache holds weak references, so a list is recomputed once any of its neighbors
    /// has been dropped.
    fn neighbors(&self, node: &Node, ctx: &Context, depth: usize) -> Vec<Node> {
        let key = MetaKey::Alternatives(ctx.clone());
        let cached = node.meta().get::<RefCell<Vec<WeakNode>>>(&key);
        if let Some(cell) = &cached {
            if let Some(nodes) = cell.borrow().iter().map(WeakNode::upgrade).collect::<Option<Vec<_>>>() {
                return nodes;
            }
        }

        if depth == 0 {
            return Vec::new();
        }

        let engine = self.engine;
        let mut found = Vec::new();

        let contexts = engine.hooks.child_contexts(node, ctx);
        for (index, (child, child_ctx)) in node.children().iter().zip(&contexts).enumerate() {
            for alternative in self.neighbors(child, child_ctx, depth - 1) {
                if let Some(spliced) = node.with_child(index, alternative) {
                    found.push(self.settle(&spliced, ctx, depth, Some(0)));
                }
            }
        }

        let env = engine.env();
        for id in engine.transform_candidates(node) {
            let Some(transform) = engine.rules.transform(id) else {
                continue;
            };
            for (output, resume) in transform.apply(node, ctx, env) {
                found.push(self.settle(&output, ctx, depth, resume));
            }
        }

        let mut unique = HashSet::new();
        found.retain(|neighbor| neighbor != node && unique.insert(neighbor.clone()));

        // a list with a dropped neighbor is stale, and is replaced in place
        if depth > node.height() {
            let weak = found.iter().map(Node::downgrade).collect::<Vec<_>>();
            match cached {
                Some(cell) => *cell.borrow_mut() = weak,
                None => {
                    node.meta().insert(key, RefCell::new(weak));
                },
            }
        }
        found
    }

    fn run(&self, node: &Node, ctx: &Context) -> Vec<Node> {
        let options = &self.engine.options;
        let baseline = self.rank(self.engine.reduce_in(node, ctx), ctx);

        let mut seen = HashSet::from([baseline.node.clone()]);
        let mut results = vec![baseline.clone()];
        let mut frontier = BinaryHeap::from([Reverse(baseline.clone())]);
        let mut pops = 0;

        while pops < options.max_search_steps {
            let Some(Reverse(best)) = frontier.pop() else {
                break;
            };
            pops += 1;
            debug!("expanding `{}` with complexity {}", best.node, best.complexity);

            for neighbor in self.neighbors(&best.node, ctx, options.max_depth) {
                if seen.insert(neighbor.clone()) {
                    let ranked = self.rank(neighbor, ctx);
                    results.push(ranked.clone());
                    frontier.push(Reverse(ranked));
                }
            }
        }
        if !frontier.is_empty() {
            debug!("search budget exhausted with {} forms found", results.len());
        }

        results.sort();
        if results[0].complexity < baseline.complexity {
            results.retain(|ranked| ranked.node != baseline.node);
        }
        results.into_iter()
            .take(options.width)
            .map(|ranked| ranked.node)
            .collect()
    }
}

impl Engine {
    /// Searches for simpler forms of the node under the given context.
    ///
    /// Returns at most [`width`](super::EngineOptions::width) distinct forms, least complex first.
    /// The reduced input is included only if nothing strictly less complex was found, so the first
    /// form is never more complex than [`Engine::reduce_in`] would give.
    pub fn simplify_in(&self, node: &Node, ctx: &Context) -> Vec<Node> {
        Search { engine: self }.run(node, ctx)
    }
}

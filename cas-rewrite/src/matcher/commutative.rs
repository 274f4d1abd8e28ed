//! The matcher for operators whose operands may appear in any order.
//!
//! Matching `add(_a, _b, _c)` against the children of a commutative node means finding an
//! assignment of sub-matchers to distinct children. The search is a backtracking one that commits
//! to the **first** consistent assignment it finds, always trying the lowest available child
//! first. It is not an enumeration of every assignment.
//!
//! To fail fast, the sub-matchers are grouped into chains (see [`crate::poset`]): sub-matcher `a`
//! precedes `b` in a chain if everything `a` can match is canonically smaller than everything `b`
//! can match. When the node's children are sorted, `b` can then only match a child to the right of
//! the one `a` matched, so the scan for `b` starts there. This pruning never changes which
//! assignment is found.

use crate::{
    context::Context,
    node::{CanonicalOrder, Node, Tag},
    poset,
};
use log::trace;
use once_cell::unsync::OnceCell;
use std::{cmp::{Ordering, Reverse}, collections::BTreeSet};
use super::{Captures, Index, Matcher, MatchEnv, Name, Pattern, Probe};

/// One step of the search: which sub-matcher to place, and which earlier step precedes it in its
/// chain.
#[derive(Debug, Clone, Copy)]
struct Slot {
    part: usize,
    previous: Option<usize>,
}

/// Matches a commutative operator.
///
/// For more information, see the [module-level documentation](self).
#[derive(Debug)]
pub struct Commutative {
    tag: Tag,
    parts: Vec<Pattern>,
    rest: Option<Pattern>,
    chains: OnceCell<Vec<Vec<usize>>>,
}

impl Commutative {
    /// Creates a commutative matcher.
    pub fn new(tag: Tag, parts: Vec<Pattern>, rest: Option<Pattern>) -> Self {
        Self { tag, parts, rest, chains: OnceCell::new() }
    }

    /// Returns the chains of sub-matcher indices, computing them on first use.
    fn chains(&self, order: &dyn CanonicalOrder) -> &[Vec<usize>] {
        self.chains.get_or_init(|| {
            let bounds = self.parts.iter().map(|part| part.bound()).collect::<Vec<_>>();
            let mut chains = poset::chains(self.parts.len(), |i, j| {
                order.compare_bounds(&bounds[i], &bounds[j]) == Some(Ordering::Less)
            });

            // strict chains first, then by position in the pattern
            chains.sort_by_key(|chain| {
                let strictness = chain.iter().map(|&i| self.parts[i].strictness()).sum::<usize>();
                (Reverse(strictness), chain[0])
            });
            chains
        })
    }

    /// Flattens the chains into the order the search places sub-matchers in.
    fn slots(&self, order: &dyn CanonicalOrder) -> Vec<Slot> {
        let mut slots = Vec::with_capacity(self.parts.len());
        for chain in self.chains(order) {
            let mut previous = None;
            for &part in chain {
                slots.push(Slot { part, previous });
                previous = Some(slots.len() - 1);
            }
        }
        slots
    }

    /// Places the sub-matcher of slot `k` and every slot after it, backtracking on failure.
    #[allow(clippy::too_many_arguments)]
    fn assign(
        &self,
        slots: &[Slot],
        k: usize,
        node: &Node,
        contexts: &[Context],
        ctx: &Context,
        env: MatchEnv<'_>,
        prune: bool,
        used: &mut [bool],
        positions: &mut [usize],
        captures: Captures,
    ) -> Option<Captures> {
        let Some(slot) = slots.get(k) else {
            return self.finish(node, ctx, env, used, captures);
        };

        let children = node.children();
        let start = match (prune, slot.previous) {
            (true, Some(previous)) => positions[previous] + 1,
            _ => 0,
        };
        for i in start..children.len() {
            if used[i] {
                continue;
            }

            let Some(extended) = self.parts[slot.part].match_node(&children[i], &contexts[i], env, captures.clone()) else {
                continue;
            };

            used[i] = true;
            positions[k] = i;
            if let Some(result) = self.assign(slots, k + 1, node, contexts, ctx, env, prune, used, positions, extended) {
                return Some(result);
            }
            used[i] = false;
        }

        None
    }

    /// Matches the children left over after every sub-matcher has been placed.
    fn finish(
        &self,
        node: &Node,
        ctx: &Context,
        env: MatchEnv<'_>,
        used: &[bool],
        captures: Captures,
    ) -> Option<Captures> {
        let leftover = node.children()
            .iter()
            .zip(used)
            .filter(|(_, used)| !**used)
            .map(|(child, _)| child.clone())
            .collect::<Vec<_>>();

        let result = match &self.rest {
            Some(rest) => {
                let remainder = Node::nary(self.tag.clone(), leftover);
                rest.match_node(&remainder, ctx, env, captures)
            },
            None if leftover.is_empty() => Some(captures),
            None => None,
        };

        if result.is_some() {
            trace!(
                "commutative `{}` matched {} of {} children",
                self.tag,
                self.parts.len(),
                node.children().len(),
            );
        }
        result
    }
}

impl Matcher for Commutative {
    fn match_node(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        if node.tag() != Some(&self.tag) {
            return None;
        }

        let count = node.children().len();
        if count < self.parts.len() || (count > self.parts.len() && self.rest.is_none()) {
            return None;
        }

        let slots = self.slots(env.order);
        let contexts = env.hooks.child_contexts(node, ctx);
        let prune = env.order.is_sorted(node.children());
        let mut used = vec![false; count];
        let mut positions = vec![0; slots.len()];
        self.assign(&slots, 0, node, &contexts, ctx, env, prune, &mut used, &mut positions, captures)
    }

    fn index(&self) -> Index<'_> {
        let first = self.chains.get().and_then(|chains| chains.first());
        Index::Unordered {
            tag: self.tag.clone(),
            children: first
                .into_iter()
                .flatten()
                .map(|&i| Probe::Matcher(&*self.parts[i]))
                .collect(),
        }
    }

    fn bindings(&self, names: &mut BTreeSet<Name>) {
        for part in self.parts.iter().chain(&self.rest) {
            part.bindings(names);
        }
    }

    fn prepare(&self, order: &dyn CanonicalOrder) {
        for part in self.parts.iter().chain(&self.rest) {
            part.prepare(order);
        }
        self.chains(order);
    }

    fn strictness(&self) -> usize {
        1 + self.parts.iter().map(|part| part.strictness()).sum::<usize>()
    }
}

use crate::{context::Context, node::{Arity, Bound, CanonicalOrder, Node, ShapeKey, Tag}};
use std::collections::BTreeSet;
use super::{Captures, Index, Matcher, MatchEnv, Name, Pattern, Probe};

/// Matches branches of one shape, matching each child against the sub-matcher in the same
/// position.
///
/// Each child is matched under the context the engine's hooks give it.
#[derive(Debug)]
pub struct Ordered {
    shape: ShapeKey,
    children: Vec<Pattern>,
}

impl Ordered {
    /// Creates a matcher for branches with the given tag and arity class.
    pub fn new(tag: Tag, arity: Arity, children: Vec<Pattern>) -> Self {
        Self { shape: ShapeKey { tag, arity }, children }
    }
}

impl Matcher for Ordered {
    fn match_node(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>, mut captures: Captures) -> Option<Captures> {
        let branch = node.as_branch()?;
        if *branch.tag() != self.shape.tag
            || branch.arity() != self.shape.arity
            || branch.children().len() != self.children.len()
        {
            return None;
        }

        let contexts = env.hooks.child_contexts(node, ctx);
        for ((child, matcher), child_ctx) in branch.children().iter().zip(&self.children).zip(&contexts) {
            captures = matcher.match_node(child, child_ctx, env, captures)?;
        }
        Some(captures)
    }

    fn is_specific(&self) -> bool {
        self.children.iter().all(|child| child.is_specific())
    }

    fn specific_target(&self) -> Option<Node> {
        let children = self.children
            .iter()
            .map(|child| child.specific_target())
            .collect::<Option<Vec<_>>>()?;
        Node::branch(self.shape.tag.clone(), self.shape.arity, children).ok()
    }

    fn bound(&self) -> Bound {
        match self.specific_target() {
            Some(target) => Bound::Exact(target),
            None => Bound::Branch(self.shape.tag.clone()),
        }
    }

    fn index(&self) -> Index<'_> {
        Index::Ordered {
            shape: self.shape.clone(),
            children: self.children.iter().map(|child| Probe::Matcher(&**child)).collect(),
        }
    }

    fn bindings(&self, names: &mut BTreeSet<Name>) {
        for child in &self.children {
            child.bindings(names);
        }
    }

    fn prepare(&self, order: &dyn CanonicalOrder) {
        for child in &self.children {
            child.prepare(order);
        }
    }

    fn strictness(&self) -> usize {
        1 + self.children.iter().map(|child| child.strictness()).sum::<usize>()
    }
}

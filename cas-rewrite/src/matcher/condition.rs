use crate::{context::Context, node::{Bound, CanonicalOrder, Node}};
use std::{collections::BTreeSet, fmt, rc::Rc};
use super::{Captures, Index, Matcher, MatchEnv, Name, Pattern};

/// A predicate over a node, its context, and the captures bound so far.
type Predicate = Rc<dyn Fn(&Node, &Context, &Captures) -> bool>;

/// Checks a predicate before running an inner matcher.
pub struct Precondition {
    inner: Pattern,
    predicate: Predicate,
}

impl Precondition {
    /// Creates a precondition wrapping `inner`.
    pub fn new(
        inner: Pattern,
        predicate: impl Fn(&Node, &Context, &Captures) -> bool + 'static,
    ) -> Self {
        Self { inner, predicate: Rc::new(predicate) }
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Precondition").field("inner", &self.inner).finish_non_exhaustive()
    }
}

/// Checks a predicate after an inner matcher succeeds.
pub struct Postcondition {
    inner: Pattern,
    predicate: Predicate,
}

impl Postcondition {
    /// Creates a postcondition wrapping `inner`.
    pub fn new(
        inner: Pattern,
        predicate: impl Fn(&Node, &Context, &Captures) -> bool + 'static,
    ) -> Self {
        Self { inner, predicate: Rc::new(predicate) }
    }
}

impl fmt::Debug for Postcondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Postcondition").field("inner", &self.inner).finish_non_exhaustive()
    }
}

/// Forwards the indexing queries of a wrapper to its inner matcher.
macro_rules! delegate_to_inner {
    () => {
        fn is_specific(&self) -> bool {
            self.inner.is_specific()
        }

        fn specific_target(&self) -> Option<Node> {
            self.inner.specific_target()
        }

        fn bound(&self) -> Bound {
            self.inner.bound()
        }

        fn index(&self) -> Index<'_> {
            self.inner.index()
        }

        fn bindings(&self, names: &mut BTreeSet<Name>) {
            self.inner.bindings(names);
        }

        fn prepare(&self, order: &dyn CanonicalOrder) {
            self.inner.prepare(order);
        }

        fn strictness(&self) -> usize {
            self.inner.strictness() + 1
        }
    };
}

impl Matcher for Precondition {
    fn match_node(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        if !(self.predicate)(node, ctx, &captures) {
            return None;
        }
        self.inner.match_node(node, ctx, env, captures)
    }

    delegate_to_inner!();
}

impl Matcher for Postcondition {
    fn match_node(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        let captures = self.inner.match_node(node, ctx, env, captures)?;
        (self.predicate)(node, ctx, &captures).then_some(captures)
    }

    delegate_to_inner!();
}

#[cfg(test)]
mod tests {
    use crate::{matcher::{any, capture, op2, post, pre, tests::try_match}, node::Interner};
    use super::*;

    #[test]
    fn precondition_sees_earlier_captures() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        // f(_a, _b) where _b is only accepted if _a was bound to 1
        let pattern = op2(
            f.clone(),
            capture("_a"),
            pre(capture("_b"), |_, _, captures| captures.get("_a") == Some(&Node::int(1))),
        );
        assert!(try_match(&*pattern, &Node::binary(f.clone(), Node::int(1), Node::int(5))).is_some());
        assert!(try_match(&*pattern, &Node::binary(f, Node::int(2), Node::int(5))).is_none());
    }

    #[test]
    fn postcondition_sees_own_captures() {
        let pattern = post(capture("_n"), |_, _, captures| {
            captures.get("_n").and_then(Node::as_rational).map(|n| n.is_integer()).unwrap_or(false)
        });
        assert!(try_match(&*pattern, &Node::int(4)).is_some());
        assert!(try_match(&*pattern, &Node::fraction(1, 3)).is_none());
    }

    #[test]
    fn predicate_sees_context() {
        let mut interner = Interner::new();
        let x = interner.symbol("x");
        let pattern = pre(any(), |node, ctx, _| ctx.is_free_of_bound(node));
        assert!(try_match(&*pattern, &Node::symbol(x)).is_some());
    }
}

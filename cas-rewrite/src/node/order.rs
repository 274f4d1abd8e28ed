//! Canonical total orders over nodes.
//!
//! The engine never decides on its own how nodes are ordered. A [`CanonicalOrder`] is supplied
//! once, when the [`Engine`](crate::Engine) is built, and is used to sort the operands of
//! commutative operators into a normal form and to break every tie during search.
//!
//! An order may also answer questions about **bounds**: what a matcher guarantees about the nodes
//! it can match (see [`Bound`]). The commutative matcher uses these answers to prune its search.
//! An order that knows nothing about bounds is still correct, just slower.

use super::{Kind, Node, Tag};
use std::cmp::Ordering;

/// A strict total order over nodes.
///
/// Implementations must never return [`Ordering::Equal`] for two nodes that are not structurally
/// equal.
pub trait CanonicalOrder {
    /// Compares two nodes.
    fn compare(&self, a: &Node, b: &Node) -> Ordering;

    /// Compares two bounds. Returns `Some(Ordering::Less)` only if **every** node satisfying `a`
    /// is guaranteed to be less than **every** node satisfying `b` (and likewise for
    /// [`Ordering::Greater`]); otherwise, returns `None`.
    fn compare_bounds(&self, _a: &Bound, _b: &Bound) -> Option<Ordering> {
        None
    }

    /// Returns true if the nodes are sorted in non-decreasing order.
    fn is_sorted(&self, nodes: &[Node]) -> bool {
        nodes.windows(2).all(|pair| self.compare(&pair[0], &pair[1]) != Ordering::Greater)
    }
}

impl<F> CanonicalOrder for F
where
    F: Fn(&Node, &Node) -> Ordering,
{
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        self(a, b)
    }
}

/// What a matcher guarantees about the nodes it matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Nothing is known.
    Unknown,

    /// Matched nodes are rational constants.
    Rational,

    /// Matched nodes are symbols.
    Symbol,

    /// Matched nodes are opaque leaves.
    Opaque,

    /// Matched nodes are branches with the given tag.
    Branch(Tag),

    /// The matched node is always this one.
    Exact(Node),
}

/// The default canonical order.
///
/// Nodes are ordered by kind first (rational constants, then symbols, then opaque leaves, then
/// branches). Within a kind:
///
/// - rational constants are ordered by value,
/// - symbols by identity, then name,
/// - opaque leaves by [`Payload::payload_cmp`](super::Payload::payload_cmp),
/// - branches by tag, then arity, then number of children, then child-wise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOrder;

/// The rank of each kind of node in the [`DefaultOrder`].
fn rank(kind: &Kind) -> u8 {
    match kind {
        Kind::Rational(_) => 0,
        Kind::Symbol(_) => 1,
        Kind::Opaque(_) => 2,
        Kind::Branch(_) => 3,
    }
}

/// The rank of the nodes satisfying a bound, if the bound determines it.
fn bound_rank(bound: &Bound) -> Option<u8> {
    match bound {
        Bound::Unknown => None,
        Bound::Rational => Some(0),
        Bound::Symbol => Some(1),
        Bound::Opaque => Some(2),
        Bound::Branch(_) => Some(3),
        Bound::Exact(node) => Some(rank(node.kind())),
    }
}

/// The tag of the nodes satisfying a bound, if the bound determines it.
fn bound_tag(bound: &Bound) -> Option<&Tag> {
    match bound {
        Bound::Branch(tag) => Some(tag),
        Bound::Exact(node) => node.tag(),
        _ => None,
    }
}

impl CanonicalOrder for DefaultOrder {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        if a.ptr_eq(b) {
            return Ordering::Equal;
        }

        match (a.kind(), b.kind()) {
            (Kind::Rational(x), Kind::Rational(y)) => x.cmp(y),
            (Kind::Symbol(x), Kind::Symbol(y)) => x.cmp(y),
            (Kind::Opaque(x), Kind::Opaque(y)) => x.payload_cmp(&**y),
            (Kind::Branch(x), Kind::Branch(y)) => x.tag().cmp(y.tag())
                .then(x.arity().cmp(&y.arity()))
                .then(x.children().len().cmp(&y.children().len()))
                .then_with(|| {
                    x.children()
                        .iter()
                        .zip(y.children())
                        .map(|(x, y)| self.compare(x, y))
                        .find(|ordering| ordering.is_ne())
                        .unwrap_or(Ordering::Equal)
                }),
            (x, y) => rank(x).cmp(&rank(y)),
        }
    }

    fn compare_bounds(&self, a: &Bound, b: &Bound) -> Option<Ordering> {
        let (rank_a, rank_b) = (bound_rank(a)?, bound_rank(b)?);
        if rank_a != rank_b {
            return Some(rank_a.cmp(&rank_b));
        }

        if let (Bound::Exact(x), Bound::Exact(y)) = (a, b) {
            return Some(self.compare(x, y));
        }

        match (bound_tag(a), bound_tag(b)) {
            (Some(x), Some(y)) if x != y => Some(x.cmp(y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Interner;
    use super::*;

    #[test]
    fn kinds_are_ranked() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let x = Node::symbol(interner.symbol("x"));
        let two = Node::int(2);
        let call = Node::unary(f, x.clone());

        assert_eq!(DefaultOrder.compare(&two, &x), Ordering::Less);
        assert_eq!(DefaultOrder.compare(&x, &call), Ordering::Less);
        assert_eq!(DefaultOrder.compare(&call, &two), Ordering::Greater);
    }

    #[test]
    fn branches_compare_child_wise() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let a = Node::binary(f.clone(), Node::int(1), Node::int(2));
        let b = Node::binary(f, Node::int(1), Node::int(3));
        assert_eq!(DefaultOrder.compare(&a, &b), Ordering::Less);
        assert_eq!(DefaultOrder.compare(&b, &b.clone()), Ordering::Equal);
    }

    #[test]
    fn structurally_equal_nodes_compare_equal() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let a = Node::unary(f.clone(), Node::int(1));
        let b = Node::unary(f, Node::int(1));
        assert!(!a.ptr_eq(&b));
        assert_eq!(DefaultOrder.compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn bounds() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let g = interner.tag("g");
        let order = DefaultOrder;

        assert_eq!(order.compare_bounds(&Bound::Rational, &Bound::Symbol), Some(Ordering::Less));
        assert_eq!(order.compare_bounds(&Bound::Branch(f.clone()), &Bound::Branch(g.clone())), Some(Ordering::Less));
        assert_eq!(order.compare_bounds(&Bound::Branch(f.clone()), &Bound::Branch(f)), None);
        assert_eq!(order.compare_bounds(&Bound::Unknown, &Bound::Rational), None);
        assert_eq!(order.compare_bounds(&Bound::Symbol, &Bound::Symbol), None);
        assert_eq!(
            order.compare_bounds(&Bound::Exact(Node::int(1)), &Bound::Exact(Node::int(2))),
            Some(Ordering::Less),
        );
    }

    #[test]
    fn closures_are_orders() {
        let reversed = |a: &Node, b: &Node| DefaultOrder.compare(b, a);
        assert_eq!(reversed.compare(&Node::int(1), &Node::int(2)), Ordering::Greater);
        assert!(reversed.is_sorted(&[Node::int(3), Node::int(2), Node::int(2)]));
    }
}

//! Composable structural patterns.
//!
//! A [`Matcher`] tests a [`Node`] under a [`Context`] and, on success, returns the
//! [`Captures`] it was given extended with whatever it bound. Matchers are built from the
//! functions in this module and nest freely:
//!
//! ```
//! use cas_rewrite::{matcher::{capture, fixed, op2}, Interner, Node};
//!
//! let mut interner = Interner::new();
//! let pow = interner.tag("pow");
//!
//! // pow(_x, 2)
//! let square = op2(pow, capture("_x"), fixed(Node::int(2)));
//! ```
//!
//! A capture name binds at most once per match attempt. Every later occurrence of the same name
//! must match a structurally equal node, so `f(_x, _x)` matches `f(a, a)` but not `f(a, b)`.
//!
//! Besides matching, a matcher answers a few questions used to index and plan it ahead of time:
//! what it guarantees about the nodes it matches ([`Matcher::bound`]), what shape of node it
//! requires at each position ([`Matcher::index`]), and which capture names it binds
//! ([`Matcher::bindings`]).

mod commutative;
mod condition;
mod leaf;
mod ordered;

pub use commutative::Commutative;
pub use condition::{Postcondition, Precondition};
pub use leaf::{Any, Capture, Fixed, LeafKind};
pub use ordered::Ordered;

use crate::{
    context::{Context, ContextHooks},
    node::{Arity, Bound, CanonicalOrder, Node, ShapeKey, Tag},
};
use std::{collections::{BTreeMap, BTreeSet}, fmt, rc::Rc};

/// The name of a capture.
pub type Name = Rc<str>;

/// A boxed matcher.
pub type Pattern = Box<dyn Matcher>;

/// The captures bound during a match attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    map: BTreeMap<Name, Node>,
}

impl Captures {
    /// Creates an empty set of captures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node bound to the given name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.map.get(name)
    }

    /// Binds the name to the node. If the name is already bound to a node that is not
    /// structurally equal to this one, the binding is inconsistent and [`None`] is returned.
    pub fn bind(mut self, name: &Name, node: &Node) -> Option<Self> {
        match self.map.get(name) {
            Some(bound) => (bound == node).then_some(self),
            None => {
                self.map.insert(Rc::clone(name), node.clone());
                Some(self)
            },
        }
    }

    /// Returns the number of bound names.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over the bindings, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.map.iter().map(|(name, node)| (&**name, node))
    }
}

/// What a matcher needs from the engine while matching.
#[derive(Clone, Copy)]
pub struct MatchEnv<'a> {
    /// The canonical order of the engine.
    pub order: &'a dyn CanonicalOrder,

    /// The enter-context hooks of the engine.
    pub hooks: &'a ContextHooks,
}

impl<'a> MatchEnv<'a> {
    /// Creates a new environment.
    pub fn new(order: &'a dyn CanonicalOrder, hooks: &'a ContextHooks) -> Self {
        Self { order, hooks }
    }
}

impl fmt::Debug for MatchEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchEnv").field("hooks", self.hooks).finish_non_exhaustive()
    }
}

/// One position probed by a matcher, for indexing.
#[derive(Debug, Clone, Copy)]
pub enum Probe<'a> {
    /// A position matched by a sub-matcher.
    Matcher(&'a dyn Matcher),

    /// A position that must hold exactly this node.
    Node(&'a Node),
}

impl<'a> Probe<'a> {
    /// Returns how this position constrains the shape of the node found there.
    pub fn index(&self) -> Index<'a> {
        match *self {
            Probe::Matcher(matcher) => matcher.index(),
            Probe::Node(node) => match node.as_branch() {
                Some(branch) => Index::Ordered {
                    shape: ShapeKey { tag: branch.tag().clone(), arity: branch.arity() },
                    children: branch.children().iter().map(Probe::Node).collect(),
                },
                None => Index::Leaf,
            },
        }
    }
}

/// How a matcher constrains the shape of the node it matches.
#[derive(Debug)]
pub enum Index<'a> {
    /// Any shape; nothing below this position is probed.
    Leaf,

    /// A branch of exactly this shape, whose children are probed in order.
    Ordered {
        /// The required shape.
        shape: ShapeKey,

        /// The probes of each child, in order.
        children: Vec<Probe<'a>>,
    },

    /// A branch with this tag, where each probe may be satisfied by any of its children.
    Unordered {
        /// The required tag.
        tag: Tag,

        /// Probes that must each be satisfied by some child.
        children: Vec<Probe<'a>>,
    },
}

/// A structural pattern over nodes.
pub trait Matcher: fmt::Debug {
    /// Matches the node under the given context, extending the given captures. Returns [`None`]
    /// if the node does not match.
    fn match_node(
        &self,
        node: &Node,
        ctx: &Context,
        env: MatchEnv<'_>,
        captures: Captures,
    ) -> Option<Captures>;

    /// Returns true if this matcher can only ever match one specific node.
    fn is_specific(&self) -> bool {
        false
    }

    /// The one node this matcher can match, if it is specific.
    fn specific_target(&self) -> Option<Node> {
        None
    }

    /// What every node matched by this matcher is guaranteed to satisfy.
    fn bound(&self) -> Bound {
        Bound::Unknown
    }

    /// How this matcher constrains the shape of the node it matches.
    fn index(&self) -> Index<'_> {
        Index::Leaf
    }

    /// Adds every capture name this matcher can bind to `names`.
    fn bindings(&self, _names: &mut BTreeSet<Name>) {}

    /// Precomputes anything that depends on the canonical order. Called once by the engine before
    /// any matching.
    fn prepare(&self, _order: &dyn CanonicalOrder) {}

    /// A rough measure of how much structure this matcher requires. Stricter matchers fail
    /// faster, so they are tried first where the order is free.
    fn strictness(&self) -> usize {
        0
    }
}

/// Matches any node.
pub fn any() -> Pattern {
    Box::new(Any)
}

/// Matches any rational constant.
pub fn rational() -> Pattern {
    Box::new(LeafKind::Rational)
}

/// Matches any symbol.
pub fn symbol() -> Pattern {
    Box::new(LeafKind::Symbol)
}

/// Matches any opaque leaf.
pub fn opaque() -> Pattern {
    Box::new(LeafKind::Opaque)
}

/// Matches nodes structurally equal to the given node.
pub fn fixed(node: Node) -> Pattern {
    Box::new(Fixed::new(node))
}

/// Matches any node and binds it to `name`.
pub fn capture(name: &str) -> Pattern {
    capture_with(name, any())
}

/// Matches nodes matched by `inner` and binds them to `name`.
pub fn capture_with(name: &str, inner: Pattern) -> Pattern {
    Box::new(Capture::new(name, inner))
}

/// Matches unary branches with the given tag.
pub fn op1(tag: Tag, child: Pattern) -> Pattern {
    Box::new(Ordered::new(tag, Arity::Unary, vec![child]))
}

/// Matches binary branches with the given tag.
pub fn op2(tag: Tag, lhs: Pattern, rhs: Pattern) -> Pattern {
    Box::new(Ordered::new(tag, Arity::Binary, vec![lhs, rhs]))
}

/// Matches ternary branches with the given tag.
pub fn op3(tag: Tag, first: Pattern, second: Pattern, third: Pattern) -> Pattern {
    Box::new(Ordered::new(tag, Arity::Ternary, vec![first, second, third]))
}

/// Matches variadic branches with the given tag and exactly as many children as there are
/// patterns, in order.
pub fn opn(tag: Tag, children: Vec<Pattern>) -> Pattern {
    Box::new(Ordered::new(tag, Arity::Variadic, children))
}

/// Matches branches with the given tag whose children are matched by `parts` in some order, with
/// no children left over.
pub fn commutative(tag: Tag, parts: Vec<Pattern>) -> Pattern {
    Box::new(Commutative::new(tag, parts, None))
}

/// Matches branches with the given tag where each of `parts` matches a different child. The
/// children left over are gathered into a variadic branch with the same tag, which must be
/// matched by `rest`.
pub fn commutative_rest(tag: Tag, parts: Vec<Pattern>, rest: Pattern) -> Pattern {
    Box::new(Commutative::new(tag, parts, Some(rest)))
}

/// Matches nodes for which `predicate` holds and that are then matched by `inner`. The predicate
/// sees the captures bound before this matcher.
pub fn pre(
    inner: Pattern,
    predicate: impl Fn(&Node, &Context, &Captures) -> bool + 'static,
) -> Pattern {
    Box::new(Precondition::new(inner, predicate))
}

/// Matches nodes matched by `inner` for which `predicate` then holds. The predicate sees the
/// captures bound by `inner`.
pub fn post(
    inner: Pattern,
    predicate: impl Fn(&Node, &Context, &Captures) -> bool + 'static,
) -> Pattern {
    Box::new(Postcondition::new(inner, predicate))
}

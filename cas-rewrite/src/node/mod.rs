//! The expression tree that the engine rewrites.
//!
//! A [`Node`] is an immutable, reference-counted value: cloning a node is cheap and shares the
//! underlying tree. A node is either a **leaf** (an exact rational constant, a [`Symbol`], or an
//! opaque [`Payload`]) or a **branch** carrying an operator [`Tag`] and an ordered list of
//! children.
//!
//! Branches come in four [`Arity`] classes: unary, binary and ternary branches always have
//! exactly 1, 2 or 3 children, and variadic branches have any number of children. The arity class
//! is part of a branch's shape, so `f(x)` built as a unary branch and `f(x)` built as a variadic
//! branch are different nodes.
//!
//! # Equality
//!
//! The [`PartialEq`] and [`Eq`] implementations for [`Node`] implement **deep structural
//! equality**: two branches are equal if they have equal tags, equal arity classes, and pairwise
//! equal children in the same order. There is no implicit commutative normalization; `add(x, y)`
//! and `add(y, x)` are different nodes. Engines put the operands of commutative operators into a
//! canonical order instead (see [`CanonicalOrder`]).
//!
//! # Cached state
//!
//! Every node computes its structural hash, its size (number of nodes in the tree), and its height
//! once, when it is built. Each node also owns a [`Meta`] cache used by the engine to memoize
//! work.

mod intern;
mod iter;
pub mod meta;
pub mod order;
mod payload;

pub use intern::{Interner, Symbol, Tag};
pub use iter::PostOrder;
pub use meta::{Meta, MetaKey};
pub use order::{Bound, CanonicalOrder, DefaultOrder};
pub use payload::Payload;

use cas_error::Error;
use crate::error::arity_mismatch;
use rug::Rational;
use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    rc::{Rc, Weak},
};

/// The arity class of a branch node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    /// Exactly one child.
    Unary,

    /// Exactly two children.
    Binary,

    /// Exactly three children.
    Ternary,

    /// Any number of children.
    Variadic,
}

impl Arity {
    /// Returns the number of children a branch of this arity must have, or [`None`] for
    /// [`Arity::Variadic`].
    pub fn len(self) -> Option<usize> {
        match self {
            Self::Unary => Some(1),
            Self::Binary => Some(2),
            Self::Ternary => Some(3),
            Self::Variadic => None,
        }
    }

    /// Returns true if a branch of this arity can have the given number of children.
    pub fn accepts(self, children: usize) -> bool {
        self.len().map(|len| len == children).unwrap_or(true)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unary => write!(f, "unary"),
            Self::Binary => write!(f, "binary"),
            Self::Ternary => write!(f, "ternary"),
            Self::Variadic => write!(f, "variadic"),
        }
    }
}

/// The shape of a branch: its tag and arity class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    /// The tag of the branch.
    pub tag: Tag,

    /// The arity class of the branch.
    pub arity: Arity,
}

/// A branch node.
#[derive(Debug)]
pub struct Branch {
    tag: Tag,
    arity: Arity,
    children: Box<[Node]>,
}

impl Branch {
    /// Returns the tag of the branch.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns the arity class of the branch.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Returns the children of the branch.
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// The kind of a node.
#[derive(Debug)]
pub enum Kind {
    /// An exact rational constant, such as `2` or `-3/4`.
    Rational(Rational),

    /// A symbol reference, such as `x`.
    Symbol(Symbol),

    /// An opaque, non-algebraic payload.
    Opaque(Rc<dyn Payload>),

    /// A tagged branch with ordered children.
    Branch(Branch),
}

/// The shared contents of a [`Node`].
#[derive(Debug)]
struct Inner {
    kind: Kind,
    hash: u64,
    size: usize,
    height: usize,
    meta: Meta,
}

/// An immutable expression tree.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Clone)]
pub struct Node(Rc<Inner>);

/// A weak reference to a [`Node`], which does not keep the node alive.
#[derive(Debug, Clone)]
pub struct WeakNode(Weak<Inner>);

impl WeakNode {
    /// Returns the node, if it is still alive.
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl Node {
    /// Builds a node of the given kind, computing its cached state.
    fn new(kind: Kind) -> Self {
        let mut hasher = DefaultHasher::new();
        let (size, height) = match &kind {
            Kind::Rational(value) => {
                0u8.hash(&mut hasher);
                value.hash(&mut hasher);
                (1, 0)
            },
            Kind::Symbol(symbol) => {
                1u8.hash(&mut hasher);
                symbol.hash(&mut hasher);
                (1, 0)
            },
            Kind::Opaque(payload) => {
                2u8.hash(&mut hasher);
                payload.payload_hash(&mut hasher);
                (1, 0)
            },
            Kind::Branch(branch) => {
                3u8.hash(&mut hasher);
                branch.tag.hash(&mut hasher);
                branch.arity.hash(&mut hasher);
                branch.children.len().hash(&mut hasher);
                let mut size = 1;
                let mut height = 0;
                for child in branch.children.iter() {
                    child.0.hash.hash(&mut hasher);
                    size += child.0.size;
                    height = height.max(child.0.height + 1);
                }
                (size, height)
            },
        };

        Self(Rc::new(Inner {
            kind,
            hash: hasher.finish(),
            size,
            height,
            meta: Meta::default(),
        }))
    }

    /// Creates a rational constant.
    pub fn rational(value: impl Into<Rational>) -> Self {
        Self::new(Kind::Rational(value.into()))
    }

    /// Creates an integer constant.
    pub fn int(value: i64) -> Self {
        Self::rational(value)
    }

    /// Creates the rational constant `numerator / denominator`, in lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    pub fn fraction(numerator: i64, denominator: i64) -> Self {
        Self::rational((numerator, denominator))
    }

    /// Creates a symbol reference.
    pub fn symbol(symbol: Symbol) -> Self {
        Self::new(Kind::Symbol(symbol))
    }

    /// Creates an opaque leaf.
    pub fn opaque(payload: impl Payload) -> Self {
        Self::new(Kind::Opaque(Rc::new(payload)))
    }

    /// Creates a unary branch.
    pub fn unary(tag: Tag, child: Node) -> Self {
        Self::branch_unchecked(tag, Arity::Unary, vec![child])
    }

    /// Creates a binary branch.
    pub fn binary(tag: Tag, lhs: Node, rhs: Node) -> Self {
        Self::branch_unchecked(tag, Arity::Binary, vec![lhs, rhs])
    }

    /// Creates a ternary branch.
    pub fn ternary(tag: Tag, first: Node, second: Node, third: Node) -> Self {
        Self::branch_unchecked(tag, Arity::Ternary, vec![first, second, third])
    }

    /// Creates a variadic branch.
    pub fn nary(tag: Tag, children: impl IntoIterator<Item = Node>) -> Self {
        Self::branch_unchecked(tag, Arity::Variadic, children.into_iter().collect())
    }

    /// Creates a branch of the given arity class, returning an error if the number of children
    /// does not fit the arity.
    pub fn branch(tag: Tag, arity: Arity, children: Vec<Node>) -> Result<Self, Error> {
        if !arity.accepts(children.len()) {
            return Err(arity_mismatch(&tag, Some(arity), children.len()));
        }
        Ok(Self::branch_unchecked(tag, arity, children))
    }

    /// Creates a branch without checking the number of children.
    fn branch_unchecked(tag: Tag, arity: Arity, children: Vec<Node>) -> Self {
        debug_assert!(arity.accepts(children.len()));
        Self::new(Kind::Branch(Branch {
            tag,
            arity,
            children: children.into_boxed_slice(),
        }))
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    /// If the node is a rational constant, returns a reference to its value.
    pub fn as_rational(&self) -> Option<&Rational> {
        match self.kind() {
            Kind::Rational(value) => Some(value),
            _ => None,
        }
    }

    /// If the node is a symbol, returns a reference to it.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.kind() {
            Kind::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// If the node is an opaque leaf holding a `T`, returns a reference to it.
    pub fn as_opaque<T: Payload>(&self) -> Option<&T> {
        match self.kind() {
            Kind::Opaque(payload) => payload.as_any().downcast_ref(),
            _ => None,
        }
    }

    /// If the node is a branch, returns a reference to it.
    pub fn as_branch(&self) -> Option<&Branch> {
        match self.kind() {
            Kind::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    /// Returns true if the node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.as_branch().is_none()
    }

    /// Returns the tag of the node, if it is a branch.
    pub fn tag(&self) -> Option<&Tag> {
        self.as_branch().map(Branch::tag)
    }

    /// Returns the arity class of the node, if it is a branch.
    pub fn arity(&self) -> Option<Arity> {
        self.as_branch().map(Branch::arity)
    }

    /// Returns the shape of the node, if it is a branch.
    pub fn shape(&self) -> Option<ShapeKey> {
        self.as_branch().map(|branch| ShapeKey {
            tag: branch.tag.clone(),
            arity: branch.arity,
        })
    }

    /// Returns the children of the node. Leaves have no children.
    pub fn children(&self) -> &[Node] {
        self.as_branch().map(Branch::children).unwrap_or(&[])
    }

    /// Returns the number of nodes in this tree, including this one.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// Returns the height of this tree. Leaves have height 0.
    pub fn height(&self) -> usize {
        self.0.height
    }

    /// Returns the structural hash of this tree.
    pub fn hash_value(&self) -> u64 {
        self.0.hash
    }

    /// Returns the metadata cache of this node.
    pub fn meta(&self) -> &Meta {
        &self.0.meta
    }

    /// Returns true if both nodes are the same instance (not just structurally equal).
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a weak reference to this node.
    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Rebuilds this branch with new children, keeping its tag and arity class. Returns an error
    /// if the number of children does not fit the arity class, or if this node is a leaf and
    /// children are given.
    ///
    /// Leaves given no children are returned as-is.
    pub fn with_children(&self, children: Vec<Node>) -> Result<Node, Error> {
        match self.as_branch() {
            Some(branch) => Node::branch(branch.tag.clone(), branch.arity, children),
            None if children.is_empty() => Ok(self.clone()),
            None => Err(arity_mismatch(self, None, children.len())),
        }
    }

    /// Rebuilds this branch with the same number of children it already has.
    pub(crate) fn rebuild(&self, children: Vec<Node>) -> Node {
        match self.as_branch() {
            Some(branch) => Self::branch_unchecked(branch.tag.clone(), branch.arity, children),
            None => self.clone(),
        }
    }

    /// Returns a copy of this branch with the child at `index` replaced. Returns [`None`] if the
    /// index is out of bounds.
    pub fn with_child(&self, index: usize, child: Node) -> Option<Node> {
        let branch = self.as_branch()?;
        if index >= branch.children.len() {
            return None;
        }

        let mut children = branch.children.to_vec();
        children[index] = child;
        Some(Self::branch_unchecked(branch.tag.clone(), branch.arity, children))
    }

    /// Returns an iterator that traverses the tree of nodes in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> PostOrder {
        PostOrder::new(self)
    }
}

impl From<Symbol> for Node {
    fn from(symbol: Symbol) -> Self {
        Self::symbol(symbol)
    }
}

impl From<Rational> for Node {
    fn from(value: Rational) -> Self {
        Self::rational(value)
    }
}

/// Checks if two nodes are structurally equal.
///
/// For more information about equality, see the [module-level documentation](self).
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        if self.0.hash != other.0.hash || self.0.size != other.0.size {
            return false;
        }

        match (self.kind(), other.kind()) {
            (Kind::Rational(lhs), Kind::Rational(rhs)) => lhs == rhs,
            (Kind::Symbol(lhs), Kind::Symbol(rhs)) => lhs == rhs,
            (Kind::Opaque(lhs), Kind::Opaque(rhs)) => lhs.payload_eq(&**rhs),
            (Kind::Branch(lhs), Kind::Branch(rhs)) => {
                lhs.tag == rhs.tag
                    && lhs.arity == rhs.arity
                    && lhs.children == rhs.children
            },
            _ => false,
        }
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Rational(value) => write!(f, "{}", value),
            Kind::Symbol(symbol) => write!(f, "{}", symbol),
            Kind::Opaque(payload) => write!(f, "{}", payload),
            Kind::Branch(branch) => {
                write!(f, "{}(", branch.tag)?;
                let mut iter = branch.children.iter();
                if let Some(child) = iter.next() {
                    write!(f, "{}", child)?;
                    for child in iter {
                        write!(f, ", {}", child)?;
                    }
                }
                write!(f, ")")
            },
        }
    }
}

/// Nodes are debug-printed in their display form, since the structure of a deep tree is
/// unreadable otherwise.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self)
    }
}

#[cfg(test)]
mod tests {
    use cas_error::ErrorKind;
    use crate::error::ArityMismatch;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use super::*;

    #[test]
    fn structural_equality() {
        let mut interner = Interner::new();
        let add = interner.tag("add");
        let x = Node::symbol(interner.symbol("x"));

        let a = Node::nary(add.clone(), [Node::int(2), x.clone()]);
        let b = Node::nary(add.clone(), [Node::int(2), x.clone()]);
        let c = Node::nary(add, [x, Node::int(2)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn arity_is_part_of_shape() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let x = Node::symbol(interner.symbol("x"));
        assert_ne!(Node::unary(f.clone(), x.clone()), Node::nary(f, [x]));
    }

    #[test]
    fn equal_nodes_hash_equal() {
        let mut interner = Interner::new();
        let pow = interner.tag("pow");
        let x = interner.symbol("x");
        let a = Node::binary(pow.clone(), Node::symbol(x.clone()), Node::int(2));
        let b = Node::binary(pow, Node::symbol(x), Node::int(2));

        let set = HashSet::from([a]);
        assert!(set.contains(&b));
    }

    #[test]
    fn rationals_normalize() {
        assert_eq!(Node::fraction(6, 4), Node::fraction(3, 2));
        assert_eq!(Node::fraction(4, 2), Node::int(2));
        assert_eq!(Node::fraction(-1, 2).to_string(), "-1/2");
    }

    #[test]
    fn opaque_leaves() {
        let a = Node::opaque(String::from("matrix A"));
        let b = Node::opaque(String::from("matrix A"));
        let c = Node::opaque(7u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_opaque::<String>().map(String::as_str), Some("matrix A"));
        assert_eq!(c.as_opaque::<String>(), None);
    }

    #[test]
    fn cached_state() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let g = interner.tag("g");
        let x = Node::symbol(interner.symbol("x"));
        let tree = Node::binary(f, Node::unary(g, x.clone()), x);
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn branch_checks_arity() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let err = Node::branch(f, Arity::Binary, vec![Node::int(1)]).unwrap_err();
        let kind = err.downcast_ref::<ArityMismatch>().unwrap();
        assert_eq!(kind.expected, 2);
        assert_eq!(kind.found, 1);
        assert!(kind.message().contains("binary"));
    }

    #[test]
    fn with_children_keeps_shape() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let node = Node::binary(f.clone(), Node::int(1), Node::int(2));
        let rebuilt = node.with_children(vec![Node::int(3), Node::int(4)]).unwrap();
        assert_eq!(rebuilt, Node::binary(f, Node::int(3), Node::int(4)));
        assert!(node.with_children(vec![Node::int(3)]).is_err());
    }

    #[test]
    fn with_child_replaces_one() {
        let mut interner = Interner::new();
        let add = interner.tag("add");
        let node = Node::nary(add.clone(), [Node::int(1), Node::int(2), Node::int(3)]);
        let replaced = node.with_child(1, Node::int(9)).unwrap();
        assert_eq!(replaced, Node::nary(add, [Node::int(1), Node::int(9), Node::int(3)]));
        assert!(node.with_child(3, Node::int(0)).is_none());
    }

    #[test]
    fn weak_nodes() {
        let node = Node::int(5);
        let weak = node.downgrade();
        assert_eq!(weak.upgrade(), Some(Node::int(5)));
        drop(node);
        assert!(weak.upgrade().is_none());
    }
}

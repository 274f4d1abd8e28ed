use crate::{context::Context, node::{Bound, CanonicalOrder, Kind, Node}};
use std::{collections::BTreeSet, rc::Rc};
use super::{Captures, Index, Matcher, MatchEnv, Name, Pattern, Probe};

/// Matches any node, binding nothing.
#[derive(Debug, Clone, Copy)]
pub struct Any;

impl Matcher for Any {
    fn match_node(&self, _: &Node, _: &Context, _: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        Some(captures)
    }
}

/// Matches any leaf of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Rational constants.
    Rational,

    /// Symbols.
    Symbol,

    /// Opaque leaves.
    Opaque,
}

impl Matcher for LeafKind {
    fn match_node(&self, node: &Node, _: &Context, _: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        let matches = matches!(
            (self, node.kind()),
            (Self::Rational, Kind::Rational(_))
                | (Self::Symbol, Kind::Symbol(_))
                | (Self::Opaque, Kind::Opaque(_))
        );
        matches.then_some(captures)
    }

    fn bound(&self) -> Bound {
        match self {
            Self::Rational => Bound::Rational,
            Self::Symbol => Bound::Symbol,
            Self::Opaque => Bound::Opaque,
        }
    }

    fn strictness(&self) -> usize {
        1
    }
}

/// Matches nodes structurally equal to a target.
#[derive(Debug, Clone)]
pub struct Fixed {
    target: Node,
}

impl Fixed {
    /// Creates a matcher for the given target.
    pub fn new(target: Node) -> Self {
        Self { target }
    }
}

impl Matcher for Fixed {
    fn match_node(&self, node: &Node, _: &Context, _: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        (*node == self.target).then_some(captures)
    }

    fn is_specific(&self) -> bool {
        true
    }

    fn specific_target(&self) -> Option<Node> {
        Some(self.target.clone())
    }

    fn bound(&self) -> Bound {
        Bound::Exact(self.target.clone())
    }

    fn index(&self) -> Index<'_> {
        Probe::Node(&self.target).index()
    }

    fn strictness(&self) -> usize {
        self.target.size()
    }
}

/// Binds the node matched by an inner matcher to a name.
#[derive(Debug)]
pub struct Capture {
    name: Name,
    inner: Pattern,
}

impl Capture {
    /// Creates a capture of `inner` under `name`.
    pub fn new(name: &str, inner: Pattern) -> Self {
        Self { name: Rc::from(name), inner }
    }

    /// The name this capture binds.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Matcher for Capture {
    fn match_node(&self, node: &Node, ctx: &Context, env: MatchEnv<'_>, captures: Captures) -> Option<Captures> {
        if captures.get(&self.name).map(|bound| bound != node).unwrap_or(false) {
            return None;
        }

        self.inner
            .match_node(node, ctx, env, captures)?
            .bind(&self.name, node)
    }

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
        names.insert(Rc::clone(&self.name));
        self.inner.bindings(names);
    }

    fn prepare(&self, order: &dyn CanonicalOrder) {
        self.inner.prepare(order);
    }

    fn strictness(&self) -> usize {
        self.inner.strictness()
    }
}

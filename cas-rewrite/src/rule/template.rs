use cas_error::Error;
use crate::{
    error::arity_mismatch,
    matcher::{Captures, Name},
    node::{Arity, Node, Tag},
};
use std::{collections::BTreeSet, rc::Rc};

/// A replacement built from captures.
#[derive(Debug, Clone)]
pub enum Template {
    /// The node bound to a capture.
    Capture(Name),

    /// The children of the branch bound to a capture, spliced into the enclosing variadic branch.
    /// A leaf bound to the capture is spliced in as a single child.
    Spread(Name),

    /// A fixed node.
    Node(Node),

    /// A branch whose children are built from templates.
    Branch {
        /// The tag of the branch.
        tag: Tag,

        /// The arity class of the branch.
        arity: Arity,

        /// The templates of the children, in order.
        children: Vec<Template>,
    },
}

impl Template {
    /// The node bound to the capture `name`.
    pub fn capture(name: &str) -> Self {
        Self::Capture(Rc::from(name))
    }

    /// The children of the branch bound to the capture `name`.
    pub fn spread(name: &str) -> Self {
        Self::Spread(Rc::from(name))
    }

    /// A fixed node.
    pub fn node(node: Node) -> Self {
        Self::Node(node)
    }

    /// A unary branch.
    pub fn unary(tag: Tag, child: Template) -> Self {
        Self::Branch { tag, arity: Arity::Unary, children: vec![child] }
    }

    /// A binary branch.
    pub fn binary(tag: Tag, lhs: Template, rhs: Template) -> Self {
        Self::Branch { tag, arity: Arity::Binary, children: vec![lhs, rhs] }
    }

    /// A ternary branch.
    pub fn ternary(tag: Tag, first: Template, second: Template, third: Template) -> Self {
        Self::Branch { tag, arity: Arity::Ternary, children: vec![first, second, third] }
    }

    /// A variadic branch.
    pub fn nary(tag: Tag, children: Vec<Template>) -> Self {
        Self::Branch { tag, arity: Arity::Variadic, children }
    }

    /// Adds every capture name this template reads to `names`.
    pub fn references(&self, names: &mut BTreeSet<Name>) {
        match self {
            Self::Capture(name) | Self::Spread(name) => {
                names.insert(Rc::clone(name));
            },
            Self::Node(_) => {},
            Self::Branch { children, .. } => {
                for child in children {
                    child.references(names);
                }
            },
        }
    }

    /// Checks that every branch in the template will have the right number of children, and that
    /// spreads only appear directly inside variadic branches.
    pub fn check_arity(&self) -> Result<(), Error> {
        match self {
            Self::Spread(name) => Err(arity_mismatch(format!("..{}", name), None, 1)),
            Self::Capture(_) | Self::Node(_) => Ok(()),
            Self::Branch { tag, arity, children } => {
                let spreads = children.iter().any(|child| matches!(child, Self::Spread(_)));
                if *arity != Arity::Variadic && (spreads || !arity.accepts(children.len())) {
                    return Err(arity_mismatch(tag, Some(*arity), children.len()));
                }

                for child in children.iter().filter(|child| !matches!(child, Self::Spread(_))) {
                    child.check_arity()?;
                }
                Ok(())
            },
        }
    }

    /// Builds the replacement node. Returns [`None`] if a capture is missing or a branch would have
    /// the wrong number of children, neither of which happens for a checked template instantiated
    /// with the captures of its own rule.
    pub fn instantiate(&self, captures: &Captures) -> Option<Node> {
        match self {
            Self::Capture(name) => captures.get(name).cloned(),
            Self::Spread(_) => None,
            Self::Node(node) => Some(node.clone()),
            Self::Branch { tag, arity, children } => {
                let mut built = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        Self::Spread(name) => {
                            let spread = captures.get(name)?;
                            if spread.is_leaf() {
                                built.push(spread.clone());
                            } else {
                                built.extend(spread.children().iter().cloned());
                            }
                        },
                        child => built.push(child.instantiate(captures)?),
                    }
                }
                Node::branch(tag.clone(), *arity, built).ok()
            },
        }
    }
}

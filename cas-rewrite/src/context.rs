//! The environment active at a position in an expression tree.
//!
//! A [`Context`] records which symbols are **bound** at a position (for example, the index
//! variable inside a summation) and which side conditions have been assumed there. Contexts are
//! immutable values: entering a binder produces a new context for the affected children, and the
//! context is simply dropped once traversal of that subtree is done.
//!
//! Which children of a branch see which context is decided by the [`ContextHooks`] registered for
//! the branch's tag. Branches without a hook pass their context to every child unchanged.

use crate::node::{Node, Symbol, Tag};
use log::warn;
use std::{collections::{BTreeSet, HashMap}, fmt, rc::Rc};

/// The bound symbols and side conditions active at a position in a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Context {
    bound: Rc<BTreeSet<Symbol>>,
    conditions: Rc<Vec<Node>>,
}

impl Context {
    /// Creates an empty context, with no bound symbols and no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context in which the given symbol is also bound.
    pub fn bind(&self, symbol: Symbol) -> Self {
        if self.bound.contains(&symbol) {
            return self.clone();
        }

        let mut bound = (*self.bound).clone();
        bound.insert(symbol);
        Self {
            bound: Rc::new(bound),
            conditions: Rc::clone(&self.conditions),
        }
    }

    /// Returns a new context in which the given condition is also assumed.
    pub fn assume(&self, condition: Node) -> Self {
        if self.conditions.contains(&condition) {
            return self.clone();
        }

        let mut conditions = (*self.conditions).clone();
        conditions.push(condition);
        Self {
            bound: Rc::clone(&self.bound),
            conditions: Rc::new(conditions),
        }
    }

    /// Returns true if the symbol is bound in this context.
    pub fn is_bound(&self, symbol: &Symbol) -> bool {
        self.bound.contains(symbol)
    }

    /// Returns true if the tree mentions none of the symbols bound in this context.
    pub fn is_free_of_bound(&self, node: &Node) -> bool {
        self.bound.is_empty()
            || node.post_order_iter()
                .filter_map(Node::as_symbol)
                .all(|symbol| !self.bound.contains(symbol))
    }

    /// Returns the bound symbols, in order.
    pub fn bound(&self) -> impl Iterator<Item = &Symbol> {
        self.bound.iter()
    }

    /// Returns the assumed conditions, in the order they were assumed.
    pub fn conditions(&self) -> &[Node] {
        &self.conditions
    }
}

/// A function deciding the context of each child of a branch.
///
/// Given the branch and its own context, it returns one context per child, in order.
pub type Hook = Rc<dyn Fn(&Node, &Context) -> Vec<Context>>;

/// The enter-context hooks of an engine, one per binder tag.
#[derive(Clone, Default)]
pub struct ContextHooks {
    hooks: HashMap<Tag, Hook>,
}

impl fmt::Debug for ContextHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags = self.hooks.keys().collect::<Vec<_>>();
        tags.sort();
        f.debug_struct("ContextHooks").field("tags", &tags).finish()
    }
}

impl ContextHooks {
    /// Creates an empty set of hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the hook for the given tag, replacing any previous one.
    pub fn insert(
        &mut self,
        tag: Tag,
        hook: impl Fn(&Node, &Context) -> Vec<Context> + 'static,
    ) {
        self.hooks.insert(tag, Rc::new(hook));
    }

    /// Returns true if a hook is registered for the given tag.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.hooks.contains_key(tag)
    }

    /// Returns the context of each child of the node, in order.
    ///
    /// If the hook for the node's tag returns the wrong number of contexts, a warning is logged,
    /// children without a context of their own get the node's context, and extra contexts are
    /// ignored.
    pub fn child_contexts(&self, node: &Node, ctx: &Context) -> Vec<Context> {
        let count = node.children().len();
        let Some((tag, hook)) = node.tag().and_then(|tag| Some((tag, self.hooks.get(tag)?))) else {
            return vec![ctx.clone(); count];
        };

        let mut contexts = hook(node, ctx);
        if contexts.len() != count {
            warn!(
                "context hook for `{}` returned {} contexts for {} children",
                tag,
                contexts.len(),
                count,
            );
            contexts.resize(count, ctx.clone());
        }
        contexts
    }
}

/// Creates a hook for a binder whose bound variable is the child at index `variable`.
///
/// The children at the `scoped` indices see the variable as bound; every other child, including
/// the variable itself, sees the binder's own context. If the variable child is not a symbol, no
/// child sees anything new.
pub fn binder(
    variable: usize,
    scoped: impl Into<Vec<usize>>,
) -> impl Fn(&Node, &Context) -> Vec<Context> + 'static {
    let scoped = scoped.into();
    move |node, ctx| {
        let inner = node.children()
            .get(variable)
            .and_then(Node::as_symbol)
            .map(|symbol| ctx.bind(symbol.clone()));
        (0..node.children().len())
            .map(|index| match &inner {
                Some(inner) if scoped.contains(&index) => inner.clone(),
                _ => ctx.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Interner;
    use pretty_assertions::assert_eq;
    use super::*;
    use test_log::test;

    #[test]
    fn bind_and_assume() {
        let mut interner = Interner::new();
        let x = interner.symbol("x");
        let ctx = Context::new().bind(x.clone());
        assert!(ctx.is_bound(&x));
        assert!(!Context::new().is_bound(&x));
        assert_eq!(ctx.bind(x.clone()), ctx);

        let assumed = ctx.assume(Node::int(1)).assume(Node::int(1));
        assert_eq!(assumed.conditions(), &[Node::int(1)]);
        assert_ne!(assumed, ctx);
    }

    #[test]
    fn unhooked_branches_repeat_context() {
        let mut interner = Interner::new();
        let add = interner.tag("add");
        let node = Node::nary(add, [Node::int(1), Node::int(2)]);
        let ctx = Context::new().assume(Node::int(0));
        assert_eq!(ContextHooks::new().child_contexts(&node, &ctx), vec![ctx.clone(), ctx]);
    }

    #[test]
    fn binder_scopes_variable() {
        let mut interner = Interner::new();
        let sum = interner.tag("sum");
        let i = interner.symbol("i");
        let node = Node::ternary(
            sum.clone(),
            Node::symbol(i.clone()),
            Node::int(10),
            Node::symbol(i.clone()),
        );

        let mut hooks = ContextHooks::new();
        hooks.insert(sum, binder(0, [2]));
        let contexts = hooks.child_contexts(&node, &Context::new());
        assert!(!contexts[0].is_bound(&i));
        assert!(!contexts[1].is_bound(&i));
        assert!(contexts[2].is_bound(&i));
        assert!(!contexts[2].is_free_of_bound(&Node::symbol(i)));
    }

    #[test]
    fn wrong_length_is_padded() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let x = interner.symbol("x");
        let node = Node::binary(f.clone(), Node::int(1), Node::int(2));
        let inner = Context::new().bind(x);

        let mut hooks = ContextHooks::new();
        let given = inner.clone();
        hooks.insert(f, move |_, _| vec![given.clone()]);
        assert_eq!(hooks.child_contexts(&node, &Context::new()), vec![inner, Context::new()]);
    }
}

//! A term-rewriting and simplification engine for tagged symbolic expression trees.
//!
//! Expressions are immutable [`Node`]s: rational constants, symbols, opaque leaves, and branches
//! carrying an interned [`Tag`] and ordered children. Rules pair a structural
//! [pattern](matcher) with a replacement, and an [`Engine`] applies them in two ways:
//!
//! - [`Engine::reduce`] rewrites bottom-up to a local fixed point.
//! - [`Engine::simplify`] searches best-first for several equivalent forms, ranked by a complexity
//!   heuristic.
//!
//! The engine knows nothing about arithmetic. The canonical order of nodes, the complexity
//! heuristic, which tags are commutative, and which tags bind variables are all supplied when the
//! engine is built.
//!
//! ```
//! use cas_rewrite::{
//!     matcher::{capture_with, commutative_rest, capture, rational},
//!     EngineBuilder,
//!     Interner,
//!     Node,
//!     Rewrite,
//!     Rule,
//! };
//!
//! let mut interner = Interner::new();
//! let add = interner.tag("add");
//! let mul = interner.tag("mul");
//! let x = Node::symbol(interner.symbol("x"));
//!
//! let fold_mul = mul.clone();
//! let engine = EngineBuilder::new()
//!     .commutative(add.clone())
//!     .commutative(mul.clone())
//!     .rule(Rule::new(
//!         "mul-fold",
//!         "fold constant factors",
//!         commutative_rest(
//!             mul.clone(),
//!             vec![capture_with("_a", rational()), capture_with("_b", rational())],
//!             capture("_rest"),
//!         ),
//!         Rewrite::compute(&["_a", "_b", "_rest"], move |captures, _| {
//!             let product = Node::rational(
//!                 captures.get("_a")?.as_rational()?.clone() * captures.get("_b")?.as_rational()?,
//!             );
//!             let rest = captures.get("_rest")?.children();
//!             if rest.is_empty() {
//!                 return Some(product);
//!             }
//!             Some(Node::nary(fold_mul.clone(), std::iter::once(product).chain(rest.iter().cloned())))
//!         }),
//!     )?)?
//!     .build();
//!
//! let node = Node::nary(add.clone(), [Node::nary(mul, [Node::int(2), Node::int(3)]), x.clone()]);
//! assert_eq!(engine.reduce(&node), Node::nary(add, [Node::int(6), x]));
//! # Ok::<(), cas_error::Error>(())
//! ```

pub mod complexity;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod node;
pub mod poset;
pub mod rule;
pub mod step;

#[cfg(test)]
mod testing;

pub use complexity::default_complexity;
pub use context::{Context, ContextHooks};
pub use engine::{Engine, EngineBuilder, EngineOptions};
pub use node::{
    Arity,
    CanonicalOrder,
    DefaultOrder,
    Interner,
    Kind,
    Node,
    ShapeKey,
    Symbol,
    Tag,
};
pub use rule::{Output, Rewrite, Rule, RuleId, Template, Transform};
pub use step::{Step, StepCollector};

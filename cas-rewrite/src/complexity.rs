//! The default complexity heuristic.
//!
//! Complexity is an informal, arbitrary metric used by [`Engine::simplify`](crate::Engine::simplify)
//! to rank equivalent forms: the lower the number, the simpler the form. An engine can be given
//! any function of a node and its context instead (see
//! [`EngineBuilder::complexity`](crate::EngineBuilder::complexity)); it only has to give the same
//! score to the same node every time.

use crate::node::{Kind, Node};

/// The default complexity heuristic function.
///
/// This function computes complexity using these simple rules:
///
/// - `complexity(p/q) = bits(p) + bits(q)`, where `bits(1) = 1`
/// - `complexity(symbol) = 1`
/// - `complexity(opaque) = 1`
/// - `complexity(branch) = 1 + sum(complexity(children))`
pub fn default_complexity(node: &Node) -> i64 {
    let mut complexity = 0;
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        complexity += match node.kind() {
            Kind::Rational(value) => {
                let numerator = value.numer().significant_bits().max(1);
                let denominator = if *value.denom() == 1 {
                    0
                } else {
                    value.denom().significant_bits()
                };
                i64::from(numerator + denominator)
            },
            Kind::Symbol(_) | Kind::Opaque(_) => 1,
            Kind::Branch(branch) => {
                stack.extend(branch.children());
                1
            },
        };
    }
    complexity
}

#[cfg(test)]
mod tests {
    use crate::node::Interner;
    use super::*;

    #[test]
    fn leaves() {
        let mut interner = Interner::new();
        assert_eq!(default_complexity(&Node::int(0)), 1);
        assert_eq!(default_complexity(&Node::int(1)), 1);
        assert_eq!(default_complexity(&Node::int(6)), 3);
        assert_eq!(default_complexity(&Node::int(-6)), 3);
        assert_eq!(default_complexity(&Node::fraction(1, 2)), 3);
        assert_eq!(default_complexity(&Node::symbol(interner.symbol("x"))), 1);
    }

    #[test]
    fn branches_add_one() {
        let mut interner = Interner::new();
        let add = interner.tag("add");
        let mul = interner.tag("mul");
        let x = Node::symbol(interner.symbol("x"));

        // add(mul(2, 3), x) = 1 + (1 + 2 + 2) + 1
        let node = Node::nary(add, [Node::nary(mul, [Node::int(2), Node::int(3)]), x]);
        assert_eq!(default_complexity(&node), 7);
    }
}

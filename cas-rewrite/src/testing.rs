//! A small arithmetic rule set shared by the engine tests.

use cas_error::Error;
use crate::{
    engine::{Engine, EngineBuilder, EngineOptions},
    matcher::{capture, capture_with, commutative_rest, fixed, op1, op2, opn, rational},
    node::{Interner, Kind, Node, Tag},
    rule::{Output, Rewrite, Rule, Template, Transform},
};
use rand::{rngs::StdRng, Rng};
use std::iter;

/// Folds the two rational captures `_a` and `_b` with `op`, keeping the rest of the operands.
fn fold(tag: Tag, op: fn(&rug::Rational, &rug::Rational) -> rug::Rational) -> Rewrite {
    Rewrite::compute(&["_a", "_b", "_rest"], move |captures, _| {
        let value = Node::rational(op(captures.get("_a")?.as_rational()?, captures.get("_b")?.as_rational()?));
        let rest = captures.get("_rest")?.children();
        if rest.is_empty() {
            return Some(value);
        }
        Some(Node::nary(tag.clone(), iter::once(value).chain(rest.iter().cloned())))
    })
}

/// An engine with a handful of arithmetic rules over `add`, `mul`, `pow`, `sin` and `cos`.
pub(crate) struct Arith {
    pub interner: Interner,
    pub engine: Engine,
    add: Tag,
    mul: Tag,
    pow: Tag,
    sin: Tag,
    cos: Tag,
    x: Node,
    y: Node,
    a: Node,
}

impl Arith {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let mut interner = Interner::new();
        let add = interner.tag("add");
        let mul = interner.tag("mul");
        let pow = interner.tag("pow");
        let sin = interner.tag("sin");
        let cos = interner.tag("cos");
        let x = Node::symbol(interner.symbol("x"));
        let y = Node::symbol(interner.symbol("y"));
        let a = Node::symbol(interner.symbol("a"));

        let engine = Self::rules(&add, &mul, &pow, &sin, &cos)
            .map(|builder| builder.options(options).build())
            .expect("fixture rules are valid");
        Self { interner, engine, add, mul, pow, sin, cos, x, y, a }
    }

    fn rules(add: &Tag, mul: &Tag, pow: &Tag, sin: &Tag, cos: &Tag) -> Result<EngineBuilder, Error> {
        let constants = || vec![capture_with("_a", rational()), capture_with("_b", rational())];
        let square = |tag: &Tag| op2(
            pow.clone(),
            op1(tag.clone(), capture("_x")),
            fixed(Node::int(2)),
        );

        EngineBuilder::new()
            .commutative(add.clone())
            .commutative(mul.clone())
            .rule(Rule::new(
                "mul-fold",
                "fold constant factors",
                commutative_rest(mul.clone(), constants(), capture("_rest")),
                fold(mul.clone(), |a, b| (a * b).into()),
            )?)?
            .rule(Rule::new(
                "add-fold",
                "fold constant terms",
                commutative_rest(add.clone(), constants(), capture("_rest")),
                fold(add.clone(), |a, b| (a + b).into()),
            )?)?
            .rule(Rule::new(
                "add-zero",
                "0+a = a",
                commutative_rest(add.clone(), vec![fixed(Node::int(0))], capture("_rest")),
                Template::nary(add.clone(), vec![Template::spread("_rest")]),
            )?)?
            .rule(Rule::new("add-single", "add(a) = a", opn(add.clone(), vec![capture("_x")]), Template::capture("_x"))?)?
            .rule(Rule::new("mul-single", "mul(a) = a", opn(mul.clone(), vec![capture("_x")]), Template::capture("_x"))?)?
            .rule(Rule::new("add-empty", "add() = 0", opn(add.clone(), Vec::new()), Template::node(Node::int(0)))?)?
            .rule(Rule::new("mul-empty", "mul() = 1", opn(mul.clone(), Vec::new()), Template::node(Node::int(1)))?)?
            .rule(Rule::new(
                "pow-one",
                "a^1 = a",
                op2(pow.clone(), capture("_a"), fixed(Node::int(1))),
                Template::capture("_a"),
            )?)?
            .rule(Rule::new(
                "pythagorean",
                "sin(x)^2 + cos(x)^2 = 1",
                commutative_rest(add.clone(), vec![square(sin), square(cos)], capture("_rem")),
                Template::nary(add.clone(), vec![Template::node(Node::int(1)), Template::spread("_rem")]),
            )?)?
            .transform(Transform::new(
                "square",
                "a*a = a^2",
                opn(mul.clone(), vec![capture("_x"), capture("_x")]),
                vec![Output::new(Template::binary(pow.clone(), Template::capture("_x"), Template::node(Node::int(2))))],
            )?)
    }

    pub fn add(&self, children: impl IntoIterator<Item = Node>) -> Node {
        Node::nary(self.add.clone(), children)
    }

    pub fn mul(&self, children: impl IntoIterator<Item = Node>) -> Node {
        Node::nary(self.mul.clone(), children)
    }

    pub fn pow(&self, base: Node, exponent: Node) -> Node {
        Node::binary(self.pow.clone(), base, exponent)
    }

    pub fn sin(&self, arg: Node) -> Node {
        Node::unary(self.sin.clone(), arg)
    }

    pub fn cos(&self, arg: Node) -> Node {
        Node::unary(self.cos.clone(), arg)
    }

    pub fn x(&self) -> Node {
        self.x.clone()
    }

    pub fn y(&self) -> Node {
        self.y.clone()
    }

    /// Generates a random tree at most `depth` levels deep.
    pub fn random(&self, rng: &mut StdRng, depth: usize) -> Node {
        if depth == 0 || rng.gen_bool(0.3) {
            return match rng.gen_range(0..5) {
                0 | 1 => Node::int(rng.gen_range(-3..=3)),
                2 => self.x.clone(),
                3 => self.y.clone(),
                _ => self.a.clone(),
            };
        }

        match rng.gen_range(0..5) {
            0 | 1 => {
                let count = rng.gen_range(1..=3);
                let children = (0..count).map(|_| self.random(rng, depth - 1)).collect::<Vec<_>>();
                if rng.gen_bool(0.5) {
                    self.add(children)
                } else {
                    self.mul(children)
                }
            },
            2 => self.pow(self.random(rng, depth - 1), self.random(rng, depth - 1)),
            3 => self.sin(self.random(rng, depth - 1)),
            _ => self.cos(self.random(rng, depth - 1)),
        }
    }
}

/// Rebuilds the whole tree from new nodes, leaving every metadata cache empty.
pub(crate) fn fresh(node: &Node) -> Node {
    match node.kind() {
        Kind::Rational(value) => Node::rational(value.clone()),
        Kind::Symbol(symbol) => Node::symbol(symbol.clone()),
        Kind::Opaque(_) => node.clone(),
        Kind::Branch(branch) => node.rebuild(branch.children().iter().map(fresh).collect()),
    }
}

#[cfg(test)]
mod tests {
    use crate::{context::Context, error::UnboundCapture};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use super::*;
    use test_log::test;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn fold_constants() {
        let arith = Arith::new();
        let node = arith.add([arith.mul([Node::int(2), Node::int(3)]), arith.x()]);
        assert_eq!(arith.engine.reduce(&node), arith.add([Node::int(6), arith.x()]));
    }

    #[test]
    fn unbound_capture_fails_registration() {
        let mut interner = Interner::new();
        let f = interner.tag("f");
        let g = interner.tag("g");
        let err = Rule::new(
            "f-to-g",
            "f(_x) = g(_y)",
            op1(f, capture("_x")),
            Template::unary(g, Template::capture("_y")),
        ).unwrap_err();

        assert_eq!(err.downcast_ref::<UnboundCapture>().map(|kind| kind.name.as_str()), Some("_y"));
        assert!(err.to_string().contains("`_y`"));
    }

    #[test]
    fn zero_depth_returns_input() {
        let arith = Arith::with_options(EngineOptions::default().max_depth(0));
        let node = arith.add([arith.mul([Node::int(2), Node::int(3)]), arith.x()]);
        let reduced = arith.engine.reduce(&node);
        assert!(reduced.ptr_eq(&node));
    }

    #[test]
    fn nested_folds() {
        let arith = Arith::new();

        // (0 + x*1*y^1) + (2 + 3) -> 5 + 1*x*y, with the constant sorted first
        let node = arith.add([
            arith.add([Node::int(0), arith.mul([arith.x(), Node::int(1), arith.pow(arith.y(), Node::int(1))])]),
            arith.add([Node::int(2), Node::int(3)]),
        ]);
        assert_eq!(
            arith.engine.reduce(&node),
            arith.add([Node::int(5), arith.mul([Node::int(1), arith.x(), arith.y()])]),
        );
    }

    #[test]
    fn pythagorean_identity_anywhere_in_sum() {
        let arith = Arith::new();
        let a = arith.a.clone();
        let node = arith.add([
            arith.pow(arith.cos(a.clone()), Node::int(2)),
            arith.y(),
            arith.pow(arith.sin(a.clone()), Node::int(2)),
        ]);
        assert_eq!(arith.engine.reduce(&node), arith.add([Node::int(1), arith.y()]));
    }

    #[test]
    fn steps_are_recorded() {
        let arith = Arith::new();
        let node = arith.add([arith.mul([Node::int(2), Node::int(3)]), arith.x()]);
        let (reduced, steps) = arith.engine.reduce_with_steps(&node);
        assert_eq!(reduced, arith.add([Node::int(6), arith.x()]));
        assert_eq!(steps.len(), 1);
        assert_eq!(&*steps[0].rule, "mul-fold");
        assert_eq!(steps[0].before, arith.mul([Node::int(2), Node::int(3)]));
        assert_eq!(steps[0].after, Node::int(6));
    }

    #[test]
    fn reduce_is_idempotent() {
        let arith = Arith::new();
        let mut rng = rng();
        for _ in 0..200 {
            let node = arith.random(&mut rng, 4);
            let reduced = arith.engine.reduce(&node);
            assert_eq!(arith.engine.reduce(&reduced), reduced, "reducing `{}`", node);
            assert_eq!(arith.engine.reduce(&fresh(&reduced)), reduced, "reducing `{}`", node);
        }
    }

    #[test]
    fn reduce_is_deterministic() {
        let arith = Arith::new();
        let mut rng = rng();
        for _ in 0..200 {
            let node = arith.random(&mut rng, 4);
            assert_eq!(
                arith.engine.reduce(&fresh(&node)),
                arith.engine.reduce(&fresh(&node)),
                "reducing `{}`",
                node,
            );
        }
    }

    #[test]
    fn dispatch_is_sound() {
        let arith = Arith::new();
        let env = arith.engine.env();
        let ctx = Context::new();
        let mut rng = rng();
        for _ in 0..100 {
            let raw = arith.random(&mut rng, 4);
            let reduced = arith.engine.reduce(&raw);
            for node in raw.post_order_iter().chain(reduced.post_order_iter()) {
                let candidates = arith.engine.candidates(node).collect::<Vec<_>>();
                for (id, entry) in arith.engine.rules().iter() {
                    let Some(rule) = arith.engine.rules().rule(id) else {
                        continue;
                    };
                    if rule.pattern().match_node(node, &ctx, env, Default::default()).is_some() {
                        assert!(
                            candidates.contains(&id),
                            "`{}` matches `{}` but is not a candidate",
                            entry.info().key,
                            node,
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn dispatch_skips_incompatible_shapes() {
        let arith = Arith::new();
        let pow_one = arith.engine.rules().id_of("pow-one").unwrap();
        let pythagorean = arith.engine.rules().id_of("pythagorean").unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let tree = arith.random(&mut rng, 4);
            for node in tree.post_order_iter() {
                let candidates = arith.engine.candidates(node).collect::<Vec<_>>();
                if node.tag() != Some(&arith.pow) {
                    assert!(!candidates.contains(&pow_one), "pow-one offered for `{}`", node);
                }
                if node.tag() != Some(&arith.add) {
                    assert!(!candidates.contains(&pythagorean), "pythagorean offered for `{}`", node);
                }
            }
        }
    }

    #[test]
    fn simplify_never_regresses() {
        let arith = Arith::new();
        let ctx = Context::new();
        let mut rng = rng();
        for _ in 0..30 {
            let node = arith.random(&mut rng, 3);
            let reduced = arith.engine.reduce(&node);
            let simplified = arith.engine.simplify(&node);
            assert!(
                arith.engine.complexity(&simplified[0], &ctx) <= arith.engine.complexity(&reduced, &ctx),
                "simplifying `{}`",
                node,
            );
        }
    }
}

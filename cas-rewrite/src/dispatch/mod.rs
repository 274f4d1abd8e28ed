//! An index from node shapes to the rules that could match them.
//!
//! Testing every rule against every node is too slow once there are more than a handful of rules.
//! The [`DispatchTree`] indexes each rule's pattern by the shapes it requires, so that a query
//! with a concrete node only yields the rules whose required shapes the node actually has.
//!
//! # Registration
//!
//! A pattern is flattened into the sequence of positions it probes, in pre-order, each with its
//! depth below the pattern's root and the constraint on the node found there:
//!
//! - a **fixed** shape (tag and arity class), for ordered branch matchers and fixed nodes,
//! - a **variable** shape (tag only), for commutative matchers, whose probes may be satisfied by
//!   any of the node's children,
//! - a **wildcard**, for everything else. A wildcard probe does not look below its position.
//!
//! Trailing wildcards constrain nothing and are dropped. The remaining sequence is inserted as a
//! path through the tree: each probe selects a bucket in the current dispatch node, and the step to
//! the next probe follows the bucket's forwarding entry for the **depth delta** between the two
//! probes. The rule is attached to the bucket of its last probe.
//!
//! # Queries
//!
//! See [`DispatchTree::query`].
//!
//! The index is sound: every rule whose pattern matches a node is yielded for that node. It is not
//! exact, so callers still run the full matcher on every candidate.

mod query;

pub use query::Candidates;

use crate::{
    matcher::{Index, Matcher, Probe},
    node::{Node, ShapeKey, Tag},
};
use std::{collections::{BTreeMap, HashMap}, fmt, hash::Hash};

/// The constraint a probe puts on the node at its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Wildcard,
    Fixed(ShapeKey),
    Variable(Tag),
}

/// A probe of a flattened pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    depth: usize,
    key: Key,
}

/// Flattens a probe and everything below it into `steps`, in pre-order.
fn linearize(probe: Probe<'_>, depth: usize, steps: &mut Vec<Step>) {
    match probe.index() {
        Index::Leaf => steps.push(Step { depth, key: Key::Wildcard }),
        Index::Ordered { shape, children } => {
            steps.push(Step { depth, key: Key::Fixed(shape) });
            for child in children {
                linearize(child, depth + 1, steps);
            }
        },
        Index::Unordered { tag, children } => {
            steps.push(Step { depth, key: Key::Variable(tag) });
            for child in children {
                linearize(child, depth + 1, steps);
            }
        },
    }
}

/// Flattens a matcher into the probes that constrain it.
fn probes(matcher: &dyn Matcher) -> Vec<Step> {
    let mut steps = Vec::new();
    linearize(Probe::Matcher(matcher), 0, &mut steps);
    while steps.len() > 1 && steps.last().map(|step| step.key == Key::Wildcard).unwrap_or(false) {
        steps.pop();
    }
    steps
}

/// The results and forwarding entries for one key at one dispatch node.
#[derive(Debug, Clone)]
struct Bucket<T> {
    /// Values whose patterns are fully resolved here.
    results: Vec<T>,

    /// The dispatch node of the next probe, by depth delta to it.
    forward: BTreeMap<isize, usize>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self { results: Vec::new(), forward: BTreeMap::new() }
    }
}

/// A dispatch node, holding one bucket per key seen at this position.
#[derive(Debug, Clone)]
struct DispatchNode<T> {
    wildcard: Bucket<T>,
    fixed: HashMap<ShapeKey, Bucket<T>>,
    variable: HashMap<Tag, Bucket<T>>,
}

impl<T> Default for DispatchNode<T> {
    fn default() -> Self {
        Self {
            wildcard: Bucket::default(),
            fixed: HashMap::new(),
            variable: HashMap::new(),
        }
    }
}

impl<T> DispatchNode<T> {
    /// Returns the bucket for the key, creating it if needed.
    fn bucket_mut(&mut self, key: Key) -> &mut Bucket<T> {
        match key {
            Key::Wildcard => &mut self.wildcard,
            Key::Fixed(shape) => self.fixed.entry(shape).or_default(),
            Key::Variable(tag) => self.variable.entry(tag).or_default(),
        }
    }
}

/// An index from node shapes to values, typically rule identifiers.
///
/// For more information, see the [module-level documentation](self).
#[derive(Debug, Clone)]
pub struct DispatchTree<T> {
    /// The dispatch nodes. The root is at index 0.
    nodes: Vec<DispatchNode<T>>,

    /// The number of values inserted.
    len: usize,
}

impl<T> Default for DispatchTree<T> {
    fn default() -> Self {
        Self { nodes: vec![DispatchNode::default()], len: 0 }
    }
}

impl<T: Copy + Eq + Hash + fmt::Debug> DispatchTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of values inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indexes `value` under the shapes required by `matcher`.
    ///
    /// Commutative matchers should be [prepared](Matcher::prepare) first; an unprepared
    /// commutative matcher is indexed by its tag alone.
    pub fn insert(&mut self, matcher: &dyn Matcher, value: T) {
        let steps = probes(matcher);
        let mut current = 0;
        for (i, step) in steps.iter().enumerate() {
            let next_step = steps.get(i + 1);
            let fresh = self.nodes.len();
            let bucket = self.nodes[current].bucket_mut(step.key.clone());
            match next_step {
                Some(next) => {
                    let delta = next.depth as isize - step.depth as isize;
                    let target = *bucket.forward.entry(delta).or_insert(fresh);
                    if target == fresh {
                        self.nodes.push(DispatchNode::default());
                    }
                    current = target;
                },
                None => bucket.results.push(value),
            }
        }
        self.len += 1;
    }

    /// Returns the values that could match the node, lazily.
    ///
    /// The query walks the dispatch tree and the node's subtree together. A frontier of
    /// `(level, dispatch node, position in the query node)` states is kept in a priority queue
    /// ordered by ascending level, where the level is the number of probes resolved so far. Each
    /// state yields the results of every bucket that applies at its position: the wildcard bucket
    /// always, the fixed bucket whose shape is the node's shape, and the variable bucket whose tag
    /// is the node's tag. Their forwarding entries then move the position by the entry's depth
    /// delta: one level down for `+1`, or up by `-delta` levels and on to the next sibling
    /// otherwise. Below a variable bucket, every child is tried in place of "the first child" or
    /// "the next sibling".
    ///
    /// Each value is yielded at most once. Values are yielded roughly in order of how deep their
    /// patterns probe, so the caller can stop early.
    pub fn query(&self, node: &Node) -> Candidates<'_, T> {
        Candidates::new(self, node)
    }
}

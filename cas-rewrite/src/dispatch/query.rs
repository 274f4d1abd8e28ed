use crate::node::Node;
use log::trace;
use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet, VecDeque},
    fmt,
    hash::Hash,
};
use super::{Bucket, DispatchTree};

/// One step down from a parent to one of its children.
#[derive(Debug, Clone)]
struct Frame {
    parent: Node,
    index: usize,

    /// True if the parent was reached through a variable bucket, in which case any of its children
    /// can stand in for this one.
    variable: bool,
}

/// A pending position in the joint walk of the dispatch tree and the query node.
#[derive(Debug)]
struct State {
    level: usize,
    seq: usize,
    dnode: usize,
    cursor: Vec<Frame>,
}

impl State {
    /// The node at this state's position.
    fn node<'a>(&'a self, root: &'a Node) -> &'a Node {
        match self.cursor.last() {
            Some(frame) => &frame.parent.children()[frame.index],
            None => root,
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// States are popped lowest level first, then in the order they were created.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.level, other.seq).cmp(&(self.level, self.seq))
    }
}

/// Moves a position by a depth delta, returning every position it may land on.
fn advance(cursor: &[Frame], node: &Node, delta: isize, variable: bool) -> Vec<Vec<Frame>> {
    let with = |base: &[Frame], frame: Frame| {
        let mut cursor = base.to_vec();
        cursor.push(frame);
        cursor
    };

    if delta > 0 {
        // pre-order flattening never skips a level on the way down
        let count = node.children().len();
        if delta != 1 || count == 0 {
            return Vec::new();
        }

        return if variable {
            (0..count)
                .map(|index| with(cursor, Frame { parent: node.clone(), index, variable: true }))
                .collect()
        } else {
            vec![with(cursor, Frame { parent: node.clone(), index: 0, variable: false })]
        };
    }

    // pop `-delta` levels, then move to the next sibling
    let up = delta.unsigned_abs();
    if up >= cursor.len() {
        return Vec::new();
    }
    let base = &cursor[..cursor.len() - up - 1];
    let last = &cursor[cursor.len() - up - 1];
    let count = last.parent.children().len();
    if last.variable {
        (0..count)
            .map(|index| with(base, Frame { index, ..last.clone() }))
            .collect()
    } else if last.index + 1 < count {
        vec![with(base, Frame { index: last.index + 1, ..last.clone() })]
    } else {
        Vec::new()
    }
}

/// A lazy sequence of candidate values for a node, created by [`DispatchTree::query`].
pub struct Candidates<'t, T> {
    tree: &'t DispatchTree<T>,
    root: Node,
    frontier: BinaryHeap<State>,
    pending: VecDeque<T>,
    seen: HashSet<T>,
    next_seq: usize,
}

impl<T> fmt::Debug for Candidates<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidates")
            .field("root", &self.root)
            .field("frontier", &self.frontier.len())
            .finish_non_exhaustive()
    }
}

impl<'t, T: Copy + Eq + Hash + fmt::Debug> Candidates<'t, T> {
    /// Starts a query at the root of the tree.
    pub(super) fn new(tree: &'t DispatchTree<T>, node: &Node) -> Self {
        let mut candidates = Self {
            tree,
            root: node.clone(),
            frontier: BinaryHeap::new(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
            next_seq: 0,
        };
        candidates.push(0, 0, Vec::new());
        candidates
    }

    fn push(&mut self, level: usize, dnode: usize, cursor: Vec<Frame>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(State { level, seq, dnode, cursor });
    }

    /// Resolves one state, queueing its results and the states it forwards to.
    fn expand(&mut self, state: State) {
        let tree = self.tree;
        let dnode = &tree.nodes[state.dnode];
        let node = state.node(&self.root).clone();

        let mut buckets: Vec<(&'t Bucket<T>, bool)> = vec![(&dnode.wildcard, false)];
        if let Some(shape) = node.shape() {
            if let Some(bucket) = dnode.fixed.get(&shape) {
                buckets.push((bucket, false));
            }
            if let Some(bucket) = dnode.variable.get(&shape.tag) {
                buckets.push((bucket, true));
            }
        }

        for (bucket, variable) in buckets {
            for &value in &bucket.results {
                if self.seen.insert(value) {
                    trace!("dispatch candidate {:?} at level {} for `{}`", value, state.level, node);
                    self.pending.push_back(value);
                }
            }
            for (&delta, &target) in &bucket.forward {
                for cursor in advance(&state.cursor, &node, delta, variable) {
                    self.push(state.level + 1, target, cursor);
                }
            }
        }
    }
}

impl<T: Copy + Eq + Hash + fmt::Debug> Iterator for Candidates<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.pending.pop_front() {
                return Some(value);
            }
            let state = self.frontier.pop()?;
            self.expand(state);
        }
    }
}

//! Chain decomposition of partially ordered sets.
//!
//! Given `n` items and a strict partial order over them, [`chains`] partitions the items into as
//! few **chains** as possible, where each chain is a sequence of items in which every item
//! precedes the next. This is the constructive side of Dilworth's theorem: the minimum number of
//! chains equals the size of the largest antichain.
//!
//! The decomposition works on item indices only, so it can be used (and tested) independently of
//! what the items are.

/// Attempts to find an augmenting path from `from` in the bipartite graph of the order, updating
/// the matching if one is found.
fn augment(
    from: usize,
    edges: &[Vec<usize>],
    visited: &mut [bool],
    successor_of: &mut [Option<usize>],
    predecessor_of: &mut [Option<usize>],
) -> bool {
    for &to in &edges[from] {
        if visited[to] {
            continue;
        }
        visited[to] = true;

        let free = match predecessor_of[to] {
            None => true,
            Some(other) => augment(other, edges, visited, successor_of, predecessor_of),
        };
        if free {
            successor_of[from] = Some(to);
            predecessor_of[to] = Some(from);
            return true;
        }
    }
    false
}

/// Partitions the items `0..len` into a minimum number of chains under the order `precedes`.
///
/// `precedes(i, j)` must return true only if item `i` strictly precedes item `j`. Consecutive items
/// of each returned chain always satisfy `precedes`. Chains are ordered by their first item, and
/// every item appears in exactly one chain.
///
/// If `precedes` is transitive, the number of chains is minimal.
pub fn chains(len: usize, mut precedes: impl FnMut(usize, usize) -> bool) -> Vec<Vec<usize>> {
    let edges = (0..len)
        .map(|i| (0..len).filter(|&j| i != j && precedes(i, j)).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    // a maximum matching between "left" copies and "right" copies of the items gives a minimum
    // path cover: each matched pair (i, j) links j right after i in some chain
    let mut successor_of = vec![None; len];
    let mut predecessor_of = vec![None; len];
    for from in 0..len {
        let mut visited = vec![false; len];
        augment(from, &edges, &mut visited, &mut successor_of, &mut predecessor_of);
    }

    let mut placed = vec![false; len];
    let mut chains = Vec::new();
    let starts = (0..len)
        .filter(|&i| predecessor_of[i].is_none())
        .chain(0..len);
    for start in starts {
        if placed[start] {
            continue;
        }

        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(item) = current.filter(|&item| !placed[item]) {
            placed[item] = true;
            chain.push(item);
            current = successor_of[item];
        }
        chains.push(chain);
    }

    chains.sort_by_key(|chain| chain[0]);
    chains
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn total_order_is_one_chain() {
        assert_eq!(chains(4, |i, j| i < j), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn antichain_is_all_singletons() {
        assert_eq!(chains(3, |_, _| false), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn empty() {
        assert!(chains(0, |_, _| true).is_empty());
    }

    #[test]
    fn two_interleaved_chains() {
        // evens precede larger evens, odds precede larger odds
        let result = chains(6, |i, j| i % 2 == j % 2 && i < j);
        assert_eq!(result, vec![vec![0, 2, 4], vec![1, 3, 5]]);
    }

    #[test]
    fn consecutive_items_are_ordered() {
        // divisibility order over 1..=8
        let precedes = |i: usize, j: usize| i != j && (j + 1) % (i + 1) == 0;
        let result = chains(8, precedes);

        let mut seen = result.iter().flatten().copied().collect::<Vec<_>>();
        seen.sort();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        for chain in &result {
            for pair in chain.windows(2) {
                assert!(precedes(pair[0], pair[1]));
            }
        }

        // {5, 6, 7, 8} is a largest antichain
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn cycles_still_cover_every_item() {
        let result = chains(3, |i, j| (i + 1) % 3 == j);
        let mut seen = result.iter().flatten().copied().collect::<Vec<_>>();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);
    }
}

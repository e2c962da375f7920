//! Bounded BFS expansion bookkeeping (spec §4.4 steps 1-3).
//!
//! This holds only the pure seen/frontier/edge bookkeeping; the actual batch
//! fetch (which chunks the frontier and issues concurrent database queries)
//! lives in [`crate::graph`], so this module's invariants (5. "BFS never
//! revisits an author...") are testable without a database.

use crate::graph::types::EdgeRow;
use std::collections::HashSet;

/// Graph State (spec §3) during the expansion phase.
pub struct BfsState {
    pub seen: HashSet<i32>,
    pub frontier: Vec<i32>,
    pub strong_edges: Vec<EdgeRow>,
}

impl BfsState {
    pub fn new(roots: &[i32]) -> Self {
        Self {
            seen: HashSet::new(),
            frontier: roots.to_vec(),
            strong_edges: Vec::new(),
        }
    }

    /// `current = frontier \ seen`; marks `current` seen and clears the
    /// frontier, ready for this depth's batch fetch.
    pub fn advance(&mut self) -> Vec<i32> {
        let mut current: Vec<i32> = Vec::new();
        let mut dedup = HashSet::new();
        for id in self.frontier.drain(..) {
            if self.seen.contains(&id) || !dedup.insert(id) {
                continue;
            }
            current.push(id);
        }
        self.seen.extend(current.iter().copied());
        current
    }

    /// Fold one chunk's batch result into `strong_edges` and the next
    /// frontier (spec §4.4 step 2: "append to frontier" iff `eid` is unseen).
    pub fn absorb(&mut self, edges: Vec<EdgeRow>) {
        for edge in edges {
            if !self.seen.contains(&edge.eid) {
                self.frontier.push(edge.eid);
            }
            self.strong_edges.push(edge);
        }
    }

    /// The final unseen frontier, deduplicated, ready for the boundary pass
    /// (spec §4.4 step 3).
    pub fn unseen_frontier(&self) -> Vec<i32> {
        let mut out = Vec::new();
        let mut dedup = HashSet::new();
        for &id in &self.frontier {
            if !self.seen.contains(&id) && dedup.insert(id) {
                out.push(id);
            }
        }
        out
    }
}

/// Split `ids` into chunks of at most `batch_width` (spec §4.4 step 2:
/// "Partition current into chunks of size ≤ B").
pub fn chunk(ids: &[i32], batch_width: usize) -> Vec<Vec<i32>> {
    if batch_width == 0 {
        return vec![ids.to_vec()];
    }
    ids.chunks(batch_width).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(sid: i32, eid: i32) -> EdgeRow {
        EdgeRow {
            sid,
            slabel: String::new(),
            simg: String::new(),
            eid,
            elabel: String::new(),
            eimg: String::new(),
        }
    }

    #[test]
    fn single_root_single_depth_matches_s1() {
        let mut state = BfsState::new(&[1]);
        let current = state.advance();
        assert_eq!(current, vec![1]);
        state.absorb(vec![edge(1, 2)]);
        assert_eq!(state.strong_edges.len(), 1);
        assert_eq!(state.unseen_frontier(), vec![2]);
    }

    #[test]
    fn never_revisits_a_seen_author() {
        let mut state = BfsState::new(&[1, 3]);
        let current = state.advance();
        assert_eq!(current.len(), 2);
        state.absorb(vec![edge(1, 2), edge(3, 2), edge(3, 4)]);
        // 2 appears twice in the raw edge list but the unseen frontier is deduplicated
        assert_eq!(state.unseen_frontier(), vec![2, 4]);
        let seen_len_before = state.seen.len();
        let current2 = state.advance();
        assert_eq!(current2.len(), 2);
        assert!(state.seen.len() >= seen_len_before);
    }

    #[test]
    fn chunk_splits_into_bounded_batches() {
        let ids = vec![1, 2, 3, 4, 5];
        let chunks = chunk(&ids, 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }
}

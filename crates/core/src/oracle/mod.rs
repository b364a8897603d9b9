//! The reachability oracle: cycle and reachability queries over a graph.
//!
//! The audit repeatedly asks whether the certain edges plus a candidate
//! subset of ambiguous edges form a cycle. That query is answered by a
//! [`ReachabilityOracle`] -- an injected capability, so the direct-search
//! backend ([`dfs::DfsOracle`]) and the matrix-power backend
//! (`veriso_accel::MatrixOracle`) substitute for each other transparently.
//! Both must return identical `reachable` and `find_cycle` results for the
//! same input graph.
//!
//! Oracles work over dense `usize` node indices; [`NodeIndexer`] maps
//! [`TransactionId`]s to indices deterministically (sorted id order).

pub mod dfs;

use alloc::collections::vec_deque::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::history::TransactionId;

/// Error raised by a reachability backend.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    /// The process-wide accelerator was used before `initialize` or after
    /// `teardown`.
    EngineNotInitialized,
    /// An edge endpoint or buffer size disagrees with the declared node count.
    DimensionMismatch { node_count: usize, found: usize },
}

/// Answers reachability and cycle queries over a loaded graph.
pub trait ReachabilityOracle {
    /// Installs a graph of `node_count` nodes and the given directed edges.
    ///
    /// `fresh` is `false` when the caller promises the edge set extends the
    /// previously loaded one; backends may then reuse prior work (the
    /// matrix backend amortizes its closure across such calls). Passing
    /// `fresh == false` with an unrelated edge set is safe but forfeits the
    /// reuse.
    ///
    /// # Errors
    ///
    /// [`OracleError::DimensionMismatch`] if an edge endpoint is out of
    /// range; backend-specific errors otherwise.
    fn load(
        &mut self,
        node_count: usize,
        edges: &[(usize, usize)],
        fresh: bool,
    ) -> Result<(), OracleError>;

    /// `true` if a path of at least one edge leads from `from` to `to`.
    fn reachable(&self, from: usize, to: usize) -> bool;

    /// An ordered node sequence forming a cycle, or `None` if acyclic.
    ///
    /// Deterministic: the cycle through the smallest cycle-member index is
    /// returned, found by breadth-first search over sorted adjacency, so
    /// every conforming backend reports the identical sequence.
    fn find_cycle(&self) -> Option<Vec<usize>>;
}

/// Deterministic cycle extraction shared by the oracle backends.
///
/// `adj` must hold sorted adjacency lists; `reach` must answer
/// "path of >= 1 edge" queries over the same graph. Returns the cycle as a
/// node sequence starting at the smallest on-cycle index; the closing edge
/// back to the first node is implicit.
#[must_use]
pub fn extract_cycle<F>(adj: &[Vec<usize>], reach: F) -> Option<Vec<usize>>
where
    F: Fn(usize, usize) -> bool,
{
    let start = (0..adj.len()).find(|&u| reach(u, u))?;

    // shortest path from a successor of `start` back to `start`, restricted
    // to nodes that can still reach `start`
    let mut parent: Vec<Option<usize>> = vec![None; adj.len()];
    let mut queue = VecDeque::new();
    for &next in &adj[start] {
        if next == start {
            return Some(vec![start]);
        }
        if parent[next].is_none() && reach(next, start) {
            parent[next] = Some(start);
            queue.push_back(next);
        }
    }
    while let Some(node) = queue.pop_front() {
        for &next in &adj[node] {
            if next == start {
                let mut path = vec![node];
                let mut current = node;
                while let Some(p) = parent[current] {
                    if p == start {
                        break;
                    }
                    path.push(p);
                    current = p;
                }
                path.push(start);
                path.reverse();
                return Some(path);
            }
            if parent[next].is_none() && reach(next, start) {
                parent[next] = Some(node);
                queue.push_back(next);
            }
        }
    }

    unreachable!("start node lies on a cycle, so a closing path must exist")
}

/// Deterministic mapping between [`TransactionId`]s and dense node indices.
///
/// Ids are assigned indices in sorted order, so the same node set always
/// produces the same numbering regardless of map iteration order.
#[derive(Debug, Clone)]
pub struct NodeIndexer {
    ids: Vec<TransactionId>,
    indices: HashMap<TransactionId, usize>,
}

impl NodeIndexer {
    #[must_use]
    pub fn from_nodes(nodes: impl IntoIterator<Item = TransactionId>) -> Self {
        let mut ids: Vec<TransactionId> = nodes.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        let indices = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, indices }
    }

    #[must_use]
    pub fn index_of(&self, id: TransactionId) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    #[must_use]
    pub fn id_of(&self, index: usize) -> TransactionId {
        self.ids[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexer_is_sorted_and_deduplicated() {
        let a = TransactionId::new(2, 0);
        let b = TransactionId::new(1, 1);
        let indexer = NodeIndexer::from_nodes([a, b, TransactionId::INIT, a]);
        assert_eq!(indexer.len(), 3);
        assert_eq!(indexer.index_of(TransactionId::INIT), Some(0));
        assert_eq!(indexer.index_of(b), Some(1));
        assert_eq!(indexer.index_of(a), Some(2));
        assert_eq!(indexer.id_of(2), a);
    }
}

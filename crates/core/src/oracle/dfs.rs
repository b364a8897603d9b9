//! Direct depth-first-search reachability backend.
//!
//! Adequate for small histories; keeps no state beyond the loaded adjacency
//! lists and answers every query by traversal. The matrix-power backend in
//! `veriso_accel` serves the same contract for large node counts.

use alloc::vec;
use alloc::vec::Vec;

use crate::oracle::{extract_cycle, OracleError, ReachabilityOracle};

/// DFS-based [`ReachabilityOracle`].
#[derive(Debug, Default, Clone)]
pub struct DfsOracle {
    node_count: usize,
    adj: Vec<Vec<usize>>,
}

impl ReachabilityOracle for DfsOracle {
    /// Rebuilds the adjacency lists from the given edges.
    ///
    /// The `fresh` hint is ignored: a direct search has no per-graph setup
    /// cost worth amortizing.
    fn load(
        &mut self,
        node_count: usize,
        edges: &[(usize, usize)],
        _fresh: bool,
    ) -> Result<(), OracleError> {
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for &(u, v) in edges {
            if u >= node_count || v >= node_count {
                return Err(OracleError::DimensionMismatch {
                    node_count,
                    found: u.max(v),
                });
            }
            adj[u].push(v);
        }
        for neighbors in &mut adj {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        self.node_count = node_count;
        self.adj = adj;
        Ok(())
    }

    fn reachable(&self, from: usize, to: usize) -> bool {
        if from >= self.node_count || to >= self.node_count {
            return false;
        }
        let mut visited = vec![false; self.node_count];
        let mut stack: Vec<usize> = self.adj[from].clone();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited[node] {
                visited[node] = true;
                stack.extend(self.adj[node].iter().copied());
            }
        }
        false
    }

    fn find_cycle(&self) -> Option<Vec<usize>> {
        extract_cycle(&self.adj, |u, v| self.reachable(u, v))
    }
}

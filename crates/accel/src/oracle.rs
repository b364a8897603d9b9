//! [`ReachabilityOracle`] backed by the closure engine.

use veriso_core::oracle::{extract_cycle, OracleError, ReachabilityOracle};

use crate::engine;
use crate::engine::AccelError;

impl From<AccelError> for OracleError {
    fn from(error: AccelError) -> Self {
        match error {
            AccelError::NotInitialized => Self::EngineNotInitialized,
            AccelError::BufferSizeMismatch { expected, found } => Self::DimensionMismatch {
                node_count: expected,
                found,
            },
        }
    }
}

/// Answers queries from a precomputed transitive-closure matrix.
///
/// [`load`](ReachabilityOracle::load) costs one closure computation
/// (amortized across extending loads); [`reachable`] afterwards is a
/// single cell lookup.
///
/// [`reachable`]: ReachabilityOracle::reachable
#[derive(Debug, Default)]
pub struct MatrixOracle {
    node_count: usize,
    adj: Vec<Vec<usize>>,
    closure: Vec<u8>,
}

impl ReachabilityOracle for MatrixOracle {
    fn load(
        &mut self,
        node_count: usize,
        edges: &[(usize, usize)],
        fresh: bool,
    ) -> Result<(), OracleError> {
        let mut adj = vec![Vec::new(); node_count];
        let mut matrix = vec![0u8; node_count * node_count];
        for &(from, to) in edges {
            if from >= node_count || to >= node_count {
                return Err(OracleError::DimensionMismatch {
                    node_count,
                    found: from.max(to),
                });
            }
            adj[from].push(to);
            matrix[from * node_count + to] = 1;
        }
        for targets in &mut adj {
            targets.sort_unstable();
            targets.dedup();
        }

        engine::compute_closure(&mut matrix, node_count, fresh)?;

        self.node_count = node_count;
        self.adj = adj;
        self.closure = matrix;
        Ok(())
    }

    fn reachable(&self, from: usize, to: usize) -> bool {
        from < self.node_count
            && to < self.node_count
            && self.closure[from * self.node_count + to] != 0
    }

    fn find_cycle(&self) -> Option<Vec<usize>> {
        extract_cycle(&self.adj, |from, to| self.reachable(from, to))
    }
}

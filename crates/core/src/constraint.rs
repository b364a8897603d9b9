//! Write-order constraint generation.
//!
//! For each key, any two transactions writing it must be ordered in a legal
//! execution, and the losing order drags anti-dependency edges with it:
//! whoever read the earlier version precedes the later writer. Where the
//! certain graph already forces the order (including everything written by
//! `INIT`, which precedes all other writers), the write-write edge and its
//! induced read-write edges are committed to the graphs directly. Where it
//! does not, the pair becomes a [`Constraint`]: two mutually exclusive edge
//! orientations, exactly one of which holds in any legal execution. The
//! audit must find a selection of one orientation per constraint that keeps
//! the combined graph acyclic, or prove that none exists.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::error::Error;
use crate::graph::edge::{Edge, EdgeType};
use crate::graph::precedence::PrecedenceGraph;
use crate::history::{History, TransactionId};
use crate::oracle::dfs::DfsOracle;
use crate::oracle::{NodeIndexer, ReachabilityOracle};

/// One directed edge hypothesis inside a constraint orientation.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEdge<Key> {
    pub from: TransactionId,
    pub to: TransactionId,
    pub edge_type: EdgeType,
    pub key: Key,
}

/// A group of mutually exclusive edge orientations for one unordered writer
/// pair on one key.
///
/// `forward` asserts `first` wrote before `second`; `backward` the reverse.
/// The candidate edges live only in the constraint search -- they are never
/// committed back to the ambiguous graph's base state.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint<Key> {
    pub key: Key,
    pub first: TransactionId,
    pub second: TransactionId,
    pub forward: Vec<CandidateEdge<Key>>,
    pub backward: Vec<CandidateEdge<Key>>,
}

/// Readers of each `(writer, key)` pair, from the read-from graph.
type ReaderMap<Key> = HashMap<(TransactionId, Key), BTreeSet<TransactionId>>;

/// Derives write-write orders and anti-dependency constraints for a built
/// precedence graph.
///
/// Forced orders are committed via `put_edge` (write-write into the certain
/// graph, induced read-write edges into the ambiguous graph); unordered
/// writer pairs are returned as [`Constraint`]s in deterministic
/// `(key, writer, writer)` order.
///
/// # Errors
///
/// [`Error::EdgeTypeMismatch`] on an internal merge-contract violation;
/// oracle errors cannot occur with the internal DFS backend.
pub fn generate_constraints<Key, Value>(
    graph: &mut PrecedenceGraph<Key>,
    history: &History<Key, Value>,
) -> Result<Vec<Constraint<Key>>, Error<Key, Value>>
where
    Key: Ord + Clone + Eq + Hash + Debug,
    Value: Eq + Hash + Clone + Debug,
{
    // writers per key, INIT first in sorted order by construction of its id
    let mut writers_by_key: BTreeMap<Key, BTreeSet<TransactionId>> = BTreeMap::new();
    for (key, _) in history.initial_state() {
        writers_by_key
            .entry(key.clone())
            .or_default()
            .insert(TransactionId::INIT);
    }
    for (id, event) in history.events() {
        if event.is_write() {
            writers_by_key
                .entry(event.key().clone())
                .or_default()
                .insert(id);
        }
    }

    let mut readers: ReaderMap<Key> = HashMap::new();
    for (writer, reader, edge) in graph.read_from().edge_triples() {
        if edge.edge_type() == EdgeType::WriteRead {
            for key in edge.keys() {
                readers
                    .entry((writer, key.clone()))
                    .or_default()
                    .insert(reader);
            }
        }
    }

    // certain-graph reachability decides which writer pairs are pre-ordered
    let indexer = NodeIndexer::from_nodes(graph.certain().nodes().copied());
    let mut certain_edges: Vec<(usize, usize)> = graph
        .certain()
        .edge_triples()
        .filter_map(|(u, v, _)| Some((indexer.index_of(u)?, indexer.index_of(v)?)))
        .collect();
    certain_edges.sort_unstable();
    certain_edges.dedup();
    let mut order = DfsOracle::default();
    order
        .load(indexer.len(), &certain_edges, true)
        .map_err(Error::Oracle)?;

    let orientation = |earlier: TransactionId, later: TransactionId, key: &Key| {
        let mut edges = Vec::new();
        edges.push(CandidateEdge {
            from: earlier,
            to: later,
            edge_type: EdgeType::WriteWrite,
            key: key.clone(),
        });
        if let Some(earlier_readers) = readers.get(&(earlier, key.clone())) {
            for &reader in earlier_readers {
                if reader != later {
                    edges.push(CandidateEdge {
                        from: reader,
                        to: later,
                        edge_type: EdgeType::ReadWrite,
                        key: key.clone(),
                    });
                }
            }
        }
        edges
    };

    let mut constraints = Vec::new();
    let mut committed = 0usize;

    for (key, writers) in &writers_by_key {
        let writers: Vec<TransactionId> = writers.iter().copied().collect();
        for (i, &w1) in writers.iter().enumerate() {
            for &w2 in &writers[i + 1..] {
                let forward_forced = w1.is_init()
                    || order.reachable(
                        indexer.index_of(w1).unwrap_or(usize::MAX),
                        indexer.index_of(w2).unwrap_or(usize::MAX),
                    );
                let backward_forced = !forward_forced
                    && order.reachable(
                        indexer.index_of(w2).unwrap_or(usize::MAX),
                        indexer.index_of(w1).unwrap_or(usize::MAX),
                    );

                let forced = if forward_forced {
                    Some((w1, w2))
                } else if backward_forced {
                    Some((w2, w1))
                } else {
                    None
                };

                match forced {
                    Some((earlier, later)) => {
                        for candidate in orientation(earlier, later, key) {
                            graph.put_edge(
                                candidate.from,
                                candidate.to,
                                Edge::new(candidate.edge_type, [candidate.key]),
                            )?;
                            committed += 1;
                        }
                    }
                    None => constraints.push(Constraint {
                        key: key.clone(),
                        first: w1,
                        second: w2,
                        forward: orientation(w1, w2, key),
                        backward: orientation(w2, w1, key),
                    }),
                };
            }
        }
    }

    tracing::debug!(
        constraints = constraints.len(),
        committed_edges = committed,
        "write-order constraints generated"
    );

    Ok(constraints)
}

//! The auditor: validates a history, generates constraints, and searches
//! for a cycle-free orientation assignment.
//!
//! A verification run moves through four states:
//!
//! 1. **Init -> GraphBuilt** -- [`Auditor::new`] builds the precedence
//!    graphs and asserts the completeness and read-write invariants;
//!    violation is a fatal [`MalformedHistory`] (the log itself is
//!    untrustworthy, the run aborts and is never retried).
//! 2. **GraphBuilt -> ConstraintsReady** -- write-order constraints are
//!    generated on the first [`Auditor::audit`] call and cached.
//! 3. **ConstraintsReady -> Audited / ViolationFound** -- a deterministic
//!    depth-first search selects one orientation per constraint, pruning
//!    any branch the reachability oracle finds cyclic. Success means the
//!    history satisfies the isolation level; exhaustion reports the witness
//!    cycle that proves no legal order exists.
//!
//! A found violation is an expected, valuable outcome and is returned as
//! data ([`AuditOutcome::Violation`]), not as an error.
//!
//! # Isolation levels
//!
//! Serializability audits the transaction graph directly: any cycle over
//! session-order, write-read, write-write, and anti-dependency edges is a
//! violation. Snapshot isolation audits the split graph instead: each
//! transaction becomes a read node and a write node (internal edge
//! read -> write), session-order, write-read, and write-write edges run
//! from the source's write node to the target's read node, and
//! anti-dependencies from the reader's read node to the overwriter's write
//! node. Cycles whose anti-dependencies are adjacent do not close in the
//! split graph, so write skew passes snapshot isolation and fails
//! serializability, while lost updates (a write-write edge closed by a
//! single anti-dependency) fail both.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::constraint::{generate_constraints, CandidateEdge, Constraint};
use crate::error::{Error, MalformedHistory};
use crate::graph::edge::EdgeType;
use crate::graph::precedence::{EdgeCounts, PrecedenceGraph};
use crate::history::{History, TransactionId};
use crate::oracle::{NodeIndexer, ReachabilityOracle};

/// The isolation guarantee to audit against.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Each transaction reads from a point-in-time snapshot; concurrent
    /// writers to the same key conflict, but write skew is legal.
    SnapshotIsolation,
    /// The history must be equivalent to some serial execution.
    Serializable,
}

/// Configuration for a verification run.
#[derive(Debug, Clone, Copy)]
pub struct AuditOptions {
    pub isolation: Isolation,
    /// Upper bound on oracle loads during the constraint search. Exceeding
    /// it aborts with [`Error::SearchLimitExceeded`] ("cannot decide", not
    /// "violates"). `None` means unbounded.
    pub step_limit: Option<u64>,
}

impl AuditOptions {
    #[must_use]
    pub const fn new(isolation: Isolation) -> Self {
        Self {
            isolation,
            step_limit: None,
        }
    }

    #[must_use]
    pub const fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = Some(step_limit);
        self
    }
}

/// One typed edge of a witness cycle.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessEdge<Key> {
    pub from: TransactionId,
    pub to: TransactionId,
    pub edge_type: EdgeType,
    pub keys: Vec<Key>,
}

/// Proof of an isolation violation: the ordered transaction cycle and the
/// edges connecting consecutive members (the last edge closes back to the
/// first transaction).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<Key> {
    pub cycle: Vec<TransactionId>,
    pub edges: Vec<WitnessEdge<Key>>,
}

/// Verdict of a verification run.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome<Key> {
    /// The history satisfies the audited isolation level.
    Passed,
    /// No legal order exists; the witness proves it.
    Violation(Witness<Key>),
}

const fn projected_node_count(isolation: Isolation, nodes: usize) -> usize {
    match isolation {
        Isolation::Serializable => nodes,
        Isolation::SnapshotIsolation => nodes * 2,
    }
}

/// Maps a typed transaction edge to a directed edge of the audited graph.
const fn project_edge(
    isolation: Isolation,
    edge_type: EdgeType,
    u: usize,
    v: usize,
) -> (usize, usize) {
    match isolation {
        Isolation::Serializable => (u, v),
        Isolation::SnapshotIsolation => match edge_type {
            // read node = 2t, write node = 2t + 1
            EdgeType::SessionOrder | EdgeType::WriteRead | EdgeType::WriteWrite => {
                (2 * u + 1, 2 * v)
            }
            EdgeType::ReadWrite => (2 * u, 2 * v + 1),
        },
    }
}

const fn original_index(isolation: Isolation, projected: usize) -> usize {
    match isolation {
        Isolation::Serializable => projected,
        Isolation::SnapshotIsolation => projected / 2,
    }
}

/// Audits one history against one isolation level.
///
/// Owns the history and its precedence graphs; the reachability oracle is
/// injected per [`audit`](Self::audit) call so the direct-search and
/// matrix-power backends substitute for each other.
#[derive(Debug)]
pub struct Auditor<Key, Value>
where
    Key: Ord,
{
    history: History<Key, Value>,
    graph: PrecedenceGraph<Key>,
    indexer: NodeIndexer,
    constraints: Option<Vec<Constraint<Key>>>,
    options: AuditOptions,
}

impl<Key, Value> Auditor<Key, Value>
where
    Key: Ord + Clone + Eq + Hash + Debug,
    Value: Eq + Hash + Clone + Debug,
{
    /// Builds and validates the precedence graphs for a history.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] if the graphs are incomplete or a read matches
    /// no write; [`Error::AmbiguousWriteWriteOrder`] if the log cannot
    /// attribute reads to unique writers.
    pub fn new(history: History<Key, Value>, options: AuditOptions) -> Result<Self, Error<Key, Value>> {
        let graph = PrecedenceGraph::from_history(&history)?;

        if !graph.is_complete(&history) {
            let transaction = history
                .events()
                .map(|(id, _)| id)
                .find(|id| !graph.certain().contains_node(id))
                .unwrap_or(TransactionId::INIT);
            return Err(MalformedHistory::IncompleteGraph { transaction }.into());
        }
        if !graph.read_write_matches(&history) {
            if let Some((transaction, key, value)) = first_unmatched_read(&history) {
                return Err(MalformedHistory::ReadWriteMismatch {
                    transaction,
                    key,
                    value,
                }
                .into());
            }
        }

        let indexer = NodeIndexer::from_nodes(graph.certain().nodes().copied());
        tracing::debug!(
            transactions = indexer.len(),
            isolation = ?options.isolation,
            "history validated, graphs built"
        );

        Ok(Self {
            history,
            graph,
            indexer,
            constraints: None,
            options,
        })
    }

    /// Runs the verification and returns the verdict.
    ///
    /// Idempotent: a second call on the same auditor yields the same verdict
    /// and the same witness cycle. Constraint candidates explored by the
    /// search are scoped to the search and never committed to the graphs.
    ///
    /// # Errors
    ///
    /// [`Error::SearchLimitExceeded`] if the configured step limit runs out;
    /// [`Error::Oracle`] if the backend rejects a load.
    pub fn audit<O>(&mut self, oracle: &mut O) -> Result<AuditOutcome<Key>, Error<Key, Value>>
    where
        O: ReachabilityOracle,
    {
        if self.constraints.is_none() {
            self.constraints = Some(generate_constraints(&mut self.graph, &self.history)?);
        }
        let constraints = self.constraints.clone().unwrap_or_default();

        let isolation = self.options.isolation;
        let node_count = projected_node_count(isolation, self.indexer.len());

        // certain edges plus committed anti-dependencies form the base graph
        let mut base: Vec<(usize, usize)> = Vec::new();
        for (u, v, edge) in self
            .graph
            .certain()
            .edge_triples()
            .chain(self.graph.ambiguous().edge_triples())
        {
            let (Some(ui), Some(vi)) = (self.indexer.index_of(u), self.indexer.index_of(v)) else {
                continue;
            };
            base.push(project_edge(isolation, edge.edge_type(), ui, vi));
        }
        if isolation == Isolation::SnapshotIsolation {
            for t in 0..self.indexer.len() {
                base.push((2 * t, 2 * t + 1));
            }
        }
        base.sort_unstable();
        base.dedup();

        let mut steps = 0u64;
        let limit = self.options.step_limit;

        bump_steps::<Key, Value>(&mut steps, limit)?;
        oracle.load(node_count, &base, true).map_err(Error::Oracle)?;
        if let Some(cycle) = oracle.find_cycle() {
            tracing::debug!(len = cycle.len(), "cycle in the certain graph");
            return Ok(AuditOutcome::Violation(self.witness(&cycle, &[])));
        }

        if constraints.is_empty() {
            tracing::debug!("no ambiguous write orders, certain graph acyclic");
            return Ok(AuditOutcome::Passed);
        }

        let mut edges = base;
        let mut chosen: Vec<CandidateEdge<Key>> = Vec::new();
        let mut first_cycle: Option<(Vec<usize>, Vec<CandidateEdge<Key>>)> = None;
        let mut needs_fresh = false;

        let satisfiable = search(
            &constraints,
            0,
            &SearchContext {
                isolation,
                node_count,
                indexer: &self.indexer,
                step_limit: limit,
            },
            &mut edges,
            &mut chosen,
            oracle,
            &mut steps,
            &mut needs_fresh,
            &mut first_cycle,
        )?;

        if satisfiable {
            tracing::debug!(steps, "acyclic orientation assignment found");
            return Ok(AuditOutcome::Passed);
        }

        let Some((cycle, provisional)) = first_cycle else {
            unreachable!("an unsatisfiable search records at least one cycle")
        };
        tracing::debug!(steps, len = cycle.len(), "no acyclic orientation assignment exists");
        Ok(AuditOutcome::Violation(self.witness(&cycle, &provisional)))
    }

    /// Per-edge-type merged-edge counts, for diagnostics.
    ///
    /// Write-write and committed anti-dependency edges appear only after the
    /// first [`audit`](Self::audit) call has generated the constraints.
    #[must_use]
    pub fn count(&self) -> EdgeCounts {
        self.graph.counts()
    }

    /// Streaming re-audit of incrementally arriving log segments.
    ///
    /// # Errors
    ///
    /// Always fails with [`Error::Unsupported`]; incremental auditing is not
    /// implemented and must not silently degrade to a no-op.
    pub fn continuously_audit(&mut self) -> Result<AuditOutcome<Key>, Error<Key, Value>> {
        Err(Error::Unsupported("continuous audit"))
    }

    #[must_use]
    pub const fn graph(&self) -> &PrecedenceGraph<Key> {
        &self.graph
    }

    #[must_use]
    pub const fn history(&self) -> &History<Key, Value> {
        &self.history
    }

    /// Translates a projected cycle into transactions and connecting edges.
    fn witness(&self, cycle: &[usize], provisional: &[CandidateEdge<Key>]) -> Witness<Key> {
        let mut transactions: Vec<TransactionId> = Vec::new();
        for &index in cycle {
            let id = self
                .indexer
                .id_of(original_index(self.options.isolation, index));
            if transactions.last() != Some(&id) {
                transactions.push(id);
            }
        }
        if transactions.len() > 1 && transactions.first() == transactions.last() {
            transactions.pop();
        }

        let mut edges = Vec::new();
        for position in 0..transactions.len() {
            let from = transactions[position];
            let to = transactions[(position + 1) % transactions.len()];
            if let Some(edge) = self.connecting_edge(from, to, provisional) {
                edges.push(edge);
            }
        }

        Witness {
            cycle: transactions,
            edges,
        }
    }

    /// The first committed or provisional edge connecting `from` to `to`.
    fn connecting_edge(
        &self,
        from: TransactionId,
        to: TransactionId,
        provisional: &[CandidateEdge<Key>],
    ) -> Option<WitnessEdge<Key>> {
        for edge_type in [
            EdgeType::SessionOrder,
            EdgeType::WriteRead,
            EdgeType::WriteWrite,
        ] {
            if let Some(edge) = self.graph.certain().edge_of_type(from, to, edge_type) {
                return Some(WitnessEdge {
                    from,
                    to,
                    edge_type,
                    keys: edge.keys().iter().cloned().collect(),
                });
            }
        }
        if let Some(edge) = self
            .graph
            .ambiguous()
            .edge_of_type(from, to, EdgeType::ReadWrite)
        {
            return Some(WitnessEdge {
                from,
                to,
                edge_type: EdgeType::ReadWrite,
                keys: edge.keys().iter().cloned().collect(),
            });
        }
        provisional
            .iter()
            .find(|candidate| candidate.from == from && candidate.to == to)
            .map(|candidate| WitnessEdge {
                from,
                to,
                edge_type: candidate.edge_type,
                keys: [candidate.key.clone()].into(),
            })
    }
}

/// The first read whose `(key, value)` no write (and no initial-state entry)
/// produced. Mirrors the builder's dangling-read detection for the
/// post-build validation pass.
fn first_unmatched_read<Key, Value>(
    history: &History<Key, Value>,
) -> Option<(TransactionId, Key, Value)>
where
    Key: Eq + Hash + Clone,
    Value: Eq + Hash + Clone,
{
    let mut written: hashbrown::HashSet<(Key, Value)> =
        history.initial_state().iter().cloned().collect();
    for (_, event) in history.events() {
        if event.is_write() {
            written.insert((event.key().clone(), event.value().clone()));
        }
    }
    history.events().find_map(|(id, event)| {
        if !event.is_write() && !written.contains(&(event.key().clone(), event.value().clone())) {
            Some((id, event.key().clone(), event.value().clone()))
        } else {
            None
        }
    })
}

struct SearchContext<'a> {
    isolation: Isolation,
    node_count: usize,
    indexer: &'a NodeIndexer,
    step_limit: Option<u64>,
}

fn bump_steps<Key, Value>(steps: &mut u64, limit: Option<u64>) -> Result<(), Error<Key, Value>> {
    *steps += 1;
    match limit {
        Some(limit) if *steps > limit => Err(Error::SearchLimitExceeded { steps: *steps }),
        _ => Ok(()),
    }
}

/// Depth-first orientation search.
///
/// Tries the forward orientation of each constraint first, in the
/// deterministic order the generator produced them. `needs_fresh` tracks
/// whether the oracle's previously loaded edge set is still a subset of the
/// current one: extending a branch keeps it (`fresh == false` amortizes the
/// backend's setup), while undoing an orientation invalidates it.
#[allow(clippy::too_many_arguments)]
fn search<Key, Value, O>(
    constraints: &[Constraint<Key>],
    index: usize,
    context: &SearchContext<'_>,
    edges: &mut Vec<(usize, usize)>,
    chosen: &mut Vec<CandidateEdge<Key>>,
    oracle: &mut O,
    steps: &mut u64,
    needs_fresh: &mut bool,
    first_cycle: &mut Option<(Vec<usize>, Vec<CandidateEdge<Key>>)>,
) -> Result<bool, Error<Key, Value>>
where
    Key: Ord + Clone + Eq + Hash + Debug,
    Value: Eq + Hash + Clone + Debug,
    O: ReachabilityOracle,
{
    let Some(constraint) = constraints.get(index) else {
        return Ok(true);
    };

    for candidates in [&constraint.forward, &constraint.backward] {
        let edges_mark = edges.len();
        let chosen_mark = chosen.len();
        for candidate in candidates {
            let (Some(u), Some(v)) = (
                context.indexer.index_of(candidate.from),
                context.indexer.index_of(candidate.to),
            ) else {
                continue;
            };
            edges.push(project_edge(context.isolation, candidate.edge_type, u, v));
            chosen.push(candidate.clone());
        }

        bump_steps::<Key, Value>(steps, context.step_limit)?;
        let fresh = core::mem::replace(needs_fresh, false);
        oracle
            .load(context.node_count, edges, fresh)
            .map_err(Error::Oracle)?;

        if let Some(cycle) = oracle.find_cycle() {
            if first_cycle.is_none() {
                *first_cycle = Some((cycle, chosen.clone()));
            }
        } else if search(
            constraints,
            index + 1,
            context,
            edges,
            chosen,
            oracle,
            steps,
            needs_fresh,
            first_cycle,
        )? {
            return Ok(true);
        }

        edges.truncate(edges_mark);
        chosen.truncate(chosen_mark);
        *needs_fresh = true;
    }

    Ok(false)
}

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::error::{Error, MalformedHistory};
use crate::graph::edge::{Edge, EdgeType, EdgeTypeMismatch};
use crate::history::{History, TransactionId};

/// Directed multigraph over transactions with typed, keyed edges.
///
/// Each ordered node pair maps to the list of merged edges connecting it --
/// one entry per [`EdgeType`], so two transactions may be connected by edges
/// of several types simultaneously without collapsing them into one.
#[derive(Debug, Clone)]
pub struct KeyedGraph<Key>
where
    Key: Ord,
{
    nodes: HashSet<TransactionId>,
    edges: HashMap<(TransactionId, TransactionId), Vec<Edge<Key>>>,
}

// Not derived: the derive would bound `Key: Default`.
impl<Key> Default for KeyedGraph<Key>
where
    Key: Ord,
{
    fn default() -> Self {
        Self {
            nodes: HashSet::new(),
            edges: HashMap::new(),
        }
    }
}

impl<Key> KeyedGraph<Key>
where
    Key: Ord + Clone,
{
    pub fn add_node(&mut self, node: TransactionId) {
        self.nodes.insert(node);
    }

    #[must_use]
    pub fn contains_node(&self, node: &TransactionId) -> bool {
        self.nodes.contains(node)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TransactionId> {
        self.nodes.iter()
    }

    /// Inserts an edge, merging with an existing edge of the same type
    /// between the same ordered pair instead of duplicating it.
    ///
    /// Both endpoints are added to the node set if absent.
    ///
    /// # Errors
    ///
    /// [`EdgeTypeMismatch`] only on an internal merge-contract violation.
    pub fn put(
        &mut self,
        u: TransactionId,
        v: TransactionId,
        edge: Edge<Key>,
    ) -> Result<(), EdgeTypeMismatch> {
        self.nodes.insert(u);
        self.nodes.insert(v);
        let list = self.edges.entry((u, v)).or_default();
        match list
            .iter_mut()
            .find(|existing| existing.edge_type() == edge.edge_type())
        {
            Some(existing) => existing.merge(&edge),
            None => {
                list.push(edge);
                Ok(())
            }
        }
    }

    /// The merged edges between `u` and `v`, in insertion order.
    #[must_use]
    pub fn edges_between(&self, u: TransactionId, v: TransactionId) -> &[Edge<Key>] {
        self.edges.get(&(u, v)).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn edge_of_type(
        &self,
        u: TransactionId,
        v: TransactionId,
        edge_type: EdgeType,
    ) -> Option<&Edge<Key>> {
        self.edges_between(u, v)
            .iter()
            .find(|edge| edge.edge_type() == edge_type)
    }

    /// All `(u, v, edge)` triples, in unspecified order.
    pub fn edge_triples(
        &self,
    ) -> impl Iterator<Item = (TransactionId, TransactionId, &Edge<Key>)> {
        self.edges
            .iter()
            .flat_map(|(&(u, v), list)| list.iter().map(move |edge| (u, v, edge)))
    }

    /// Number of merged edges of the given type.
    #[must_use]
    pub fn count_of_type(&self, edge_type: EdgeType) -> usize {
        self.edges
            .values()
            .flat_map(|list| list.iter())
            .filter(|edge| edge.edge_type() == edge_type)
            .count()
    }
}

/// Per-edge-type merged-edge counts, for diagnostics.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCounts {
    pub session_order: usize,
    pub write_read: usize,
    pub write_write: usize,
    pub read_write: usize,
}

/// The three precedence graphs built from one history.
///
/// Built once per verification run. Constraint generation commits forced
/// write orders back into the graphs; the audit's search afterwards treats
/// them as read-only and keeps its candidate edges in its own scoped
/// buffers.
#[derive(Debug, Clone)]
pub struct PrecedenceGraph<Key>
where
    Key: Ord,
{
    read_from: KeyedGraph<Key>,
    certain: KeyedGraph<Key>,
    ambiguous: KeyedGraph<Key>,
}

impl<Key> PrecedenceGraph<Key>
where
    Key: Ord + Clone + Eq + Hash + Debug,
{
    /// Builds the precedence graphs from a history.
    ///
    /// Adds every transaction plus `INIT` as a node of all three graphs,
    /// derives session-order edges from consecutive transactions of each
    /// session, and write-read edges by resolving every read against the
    /// `(key, value)` write index (pre-populated with the initial state as
    /// `INIT` writes). A transaction reading its own write contributes no
    /// edge.
    ///
    /// # Errors
    ///
    /// - [`MalformedHistory::DanglingRead`] if a read matches no write and
    ///   no initial-state entry.
    /// - [`Error::AmbiguousWriteWriteOrder`] if two distinct transactions
    ///   wrote the same `(key, value)` pair, which makes read attribution
    ///   undecidable.
    pub fn from_history<Value>(history: &History<Key, Value>) -> Result<Self, Error<Key, Value>>
    where
        Value: Eq + Hash + Clone + Debug,
    {
        let mut graph = Self {
            read_from: KeyedGraph::default(),
            certain: KeyedGraph::default(),
            ambiguous: KeyedGraph::default(),
        };

        graph.add_node(TransactionId::INIT);
        for (id, _) in history.transactions() {
            graph.add_node(id);
        }

        // session-order edges between consecutive transactions
        for (session_index, session) in history.sessions().iter().enumerate() {
            let mut previous: Option<TransactionId> = None;
            for height in 0..session.len() {
                let current = TransactionId::new(session_index as u64 + 1, height as u64);
                if let Some(previous) = previous {
                    graph.put_edge(previous, current, Edge::keyless(EdgeType::SessionOrder))?;
                }
                previous = Some(current);
            }
        }

        // (key, value) -> writer, seeded with the initial state
        let mut writes: HashMap<(Key, Value), TransactionId> = HashMap::new();
        for (key, value) in history.initial_state() {
            writes.insert((key.clone(), value.clone()), TransactionId::INIT);
        }
        for (id, event) in history.events() {
            if let crate::history::Event::Write { key, value } = event {
                if let Some(&existing) = writes.get(&(key.clone(), value.clone())) {
                    if existing != id {
                        return Err(Error::AmbiguousWriteWriteOrder {
                            key: key.clone(),
                            value: value.clone(),
                            writers: [existing, id],
                        });
                    }
                }
                writes.insert((key.clone(), value.clone()), id);
            }
        }

        for (id, event) in history.events() {
            if let crate::history::Event::Read { key, value } = event {
                let Some(&writer) = writes.get(&(key.clone(), value.clone())) else {
                    return Err(MalformedHistory::DanglingRead {
                        transaction: id,
                        key: key.clone(),
                        value: value.clone(),
                    }
                    .into());
                };
                if writer == id {
                    // a transaction reading its own write is not a dependency
                    continue;
                }
                graph.put_edge(writer, id, Edge::new(EdgeType::WriteRead, [key.clone()]))?;
            }
        }

        tracing::debug!(
            nodes = graph.certain.node_count(),
            counts = ?graph.counts(),
            "precedence graphs built"
        );

        Ok(graph)
    }

    fn add_node(&mut self, node: TransactionId) {
        self.read_from.add_node(node);
        self.certain.add_node(node);
        self.ambiguous.add_node(node);
    }

    /// The single mutation entry point: dispatches an edge by its type.
    ///
    /// `WriteRead` edges go into both the read-from and the certain graph;
    /// `WriteWrite` and `SessionOrder` into the certain graph only;
    /// `ReadWrite` into the ambiguous graph only. Existing edges of the same
    /// type between the same ordered pair are merged, never duplicated.
    ///
    /// # Errors
    ///
    /// [`EdgeTypeMismatch`] on an internal merge-contract violation.
    pub fn put_edge(
        &mut self,
        u: TransactionId,
        v: TransactionId,
        edge: Edge<Key>,
    ) -> Result<(), EdgeTypeMismatch> {
        match edge.edge_type() {
            EdgeType::WriteRead => {
                self.read_from.put(u, v, edge.clone())?;
                self.certain.put(u, v, edge)
            }
            EdgeType::WriteWrite | EdgeType::SessionOrder => self.certain.put(u, v, edge),
            EdgeType::ReadWrite => self.ambiguous.put(u, v, edge),
        }
    }

    #[must_use]
    pub const fn read_from(&self) -> &KeyedGraph<Key> {
        &self.read_from
    }

    #[must_use]
    pub const fn certain(&self) -> &KeyedGraph<Key> {
        &self.certain
    }

    #[must_use]
    pub const fn ambiguous(&self) -> &KeyedGraph<Key> {
        &self.ambiguous
    }

    /// Completeness invariant: every transaction appearing in any event (and
    /// `INIT`) is a node of all three graphs.
    #[must_use]
    pub fn is_complete<Value>(&self, history: &History<Key, Value>) -> bool {
        let present = |id: &TransactionId| {
            self.read_from.contains_node(id)
                && self.certain.contains_node(id)
                && self.ambiguous.contains_node(id)
        };
        present(&TransactionId::INIT) && history.events().all(|(id, _)| present(&id))
    }

    /// Read-write consistency invariant: every read's `(key, value)` pair
    /// matches some write event or initial-state entry for that key.
    #[must_use]
    pub fn read_write_matches<Value>(&self, history: &History<Key, Value>) -> bool
    where
        Value: Eq + Hash + Clone,
    {
        let mut written: HashSet<(Key, Value)> = history
            .initial_state()
            .iter()
            .cloned()
            .collect();
        for (_, event) in history.events() {
            if event.is_write() {
                written.insert((event.key().clone(), event.value().clone()));
            }
        }
        history.events().all(|(_, event)| {
            event.is_write() || written.contains(&(event.key().clone(), event.value().clone()))
        })
    }

    /// Per-edge-type merged-edge counts across the three graphs.
    ///
    /// Write-read edges are counted once (in the certain graph), not again
    /// in the read-from projection.
    #[must_use]
    pub fn counts(&self) -> EdgeCounts {
        EdgeCounts {
            session_order: self.certain.count_of_type(EdgeType::SessionOrder),
            write_read: self.certain.count_of_type(EdgeType::WriteRead),
            write_write: self.certain.count_of_type(EdgeType::WriteWrite),
            read_write: self.ambiguous.count_of_type(EdgeType::ReadWrite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Event, Transaction};

    fn chain_history() -> History<&'static str, u64> {
        // S1 = [T1 w(x=1), T2 r(x=1) w(x=2)], S2 = [T3 r(x=2)]
        History::new(vec![
            vec![
                Transaction::new(vec![Event::write("x", 1)]),
                Transaction::new(vec![Event::read("x", 1), Event::write("x", 2)]),
            ],
            vec![Transaction::new(vec![Event::read("x", 2)])],
        ])
    }

    #[test]
    fn builds_session_order_and_write_read_edges() {
        let history = chain_history();
        let graph = PrecedenceGraph::from_history(&history).unwrap();

        let t1 = TransactionId::new(1, 0);
        let t2 = TransactionId::new(1, 1);
        let t3 = TransactionId::new(2, 0);

        assert!(graph
            .certain()
            .edge_of_type(t1, t2, EdgeType::SessionOrder)
            .is_some());
        let wr12 = graph
            .certain()
            .edge_of_type(t1, t2, EdgeType::WriteRead)
            .unwrap();
        assert!(wr12.keys().contains("x"));
        assert!(graph
            .read_from()
            .edge_of_type(t2, t3, EdgeType::WriteRead)
            .is_some());

        assert_eq!(
            graph.counts(),
            EdgeCounts {
                session_order: 1,
                write_read: 2,
                write_write: 0,
                read_write: 0,
            }
        );
    }

    #[test]
    fn empty_graphs_need_no_key_default() {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        struct Opaque(u64);

        let graph: KeyedGraph<Opaque> = KeyedGraph::default();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.edge_triples().next().is_none());
    }

    #[test]
    fn same_pair_keeps_multiple_edge_types() {
        let history = chain_history();
        let graph = PrecedenceGraph::from_history(&history).unwrap();
        let t1 = TransactionId::new(1, 0);
        let t2 = TransactionId::new(1, 1);
        // T1->T2 carries both a session-order and a write-read edge
        assert_eq!(graph.certain().edges_between(t1, t2).len(), 2);
    }

    #[test]
    fn self_read_is_not_an_edge() {
        let history: History<&str, u64> = History::new(vec![vec![Transaction::new(vec![
            Event::write("x", 1),
            Event::read("x", 1),
        ])]]);
        let graph = PrecedenceGraph::from_history(&history).unwrap();
        let t1 = TransactionId::new(1, 0);
        assert!(graph.read_from().edges_between(t1, t1).is_empty());
    }

    #[test]
    fn dangling_read_is_rejected() {
        let history: History<&str, u64> =
            History::new(vec![vec![Transaction::new(vec![Event::read("x", 7)])]]);
        assert!(matches!(
            PrecedenceGraph::from_history(&history),
            Err(Error::Malformed(MalformedHistory::DanglingRead {
                key: "x",
                value: 7,
                ..
            }))
        ));
    }

    #[test]
    fn initial_state_reads_resolve_to_init() {
        let history: History<&str, u64> = History::with_initial_state(
            vec![vec![Transaction::new(vec![Event::read("x", 0)])]],
            vec![("x", 0)],
        );
        let graph = PrecedenceGraph::from_history(&history).unwrap();
        let t1 = TransactionId::new(1, 0);
        assert!(graph
            .read_from()
            .edge_of_type(TransactionId::INIT, t1, EdgeType::WriteRead)
            .is_some());
    }

    #[test]
    fn duplicate_version_writes_are_ambiguous() {
        let history: History<&str, u64> = History::new(vec![
            vec![Transaction::new(vec![Event::write("x", 1)])],
            vec![Transaction::new(vec![Event::write("x", 1)])],
        ]);
        assert!(matches!(
            PrecedenceGraph::from_history(&history),
            Err(Error::AmbiguousWriteWriteOrder { key: "x", value: 1, .. })
        ));
    }

    #[test]
    fn completeness_and_read_write_validation() {
        let history = chain_history();
        let graph = PrecedenceGraph::from_history(&history).unwrap();
        assert!(graph.is_complete(&history));
        assert!(graph.read_write_matches(&history));

        // a graph built from a shorter history misses the extra transactions
        let shorter: History<&str, u64> = History::new(vec![vec![Transaction::new(vec![
            Event::write("x", 1),
        ])]]);
        let small = PrecedenceGraph::from_history(&shorter).unwrap();
        assert!(!small.is_complete(&history));
    }
}

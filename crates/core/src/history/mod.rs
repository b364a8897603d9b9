//! The history model: sessions of transactions over `(key, value)` events.
//!
//! A [`History`] is constructed once and treated as read-only afterwards.
//! Transactions are addressed by [`TransactionId`] -- 1-based session index
//! plus position within the session -- and the synthetic
//! [`TransactionId::INIT`] transaction owns the initial database state.

pub mod types;

use alloc::vec::Vec;

pub use types::{Event, Session, Transaction, TransactionId};

/// A recorded execution history: sessions plus the initial database state.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History<Key, Value> {
    sessions: Vec<Session<Key, Value>>,
    /// `(key, value)` pairs present before the history ran, attributed to
    /// [`TransactionId::INIT`].
    initial_state: Vec<(Key, Value)>,
}

impl<Key, Value> History<Key, Value> {
    /// A history starting from an empty database.
    #[must_use]
    pub const fn new(sessions: Vec<Session<Key, Value>>) -> Self {
        Self {
            sessions,
            initial_state: Vec::new(),
        }
    }

    /// A history starting from a pre-populated database.
    #[must_use]
    pub const fn with_initial_state(
        sessions: Vec<Session<Key, Value>>,
        initial_state: Vec<(Key, Value)>,
    ) -> Self {
        Self {
            sessions,
            initial_state,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &[Session<Key, Value>] {
        &self.sessions
    }

    #[must_use]
    pub fn initial_state(&self) -> &[(Key, Value)] {
        &self.initial_state
    }

    /// All transactions in session order, with their assigned ids.
    ///
    /// Does not include [`TransactionId::INIT`].
    pub fn transactions(&self) -> impl Iterator<Item = (TransactionId, &Transaction<Key, Value>)> {
        self.sessions.iter().enumerate().flat_map(|(s, session)| {
            session.iter().enumerate().map(move |(h, transaction)| {
                (TransactionId::new(s as u64 + 1, h as u64), transaction)
            })
        })
    }

    /// All events in session order, each paired with its owning transaction.
    pub fn events(&self) -> impl Iterator<Item = (TransactionId, &Event<Key, Value>)> {
        self.transactions()
            .flat_map(|(id, transaction)| transaction.events.iter().map(move |event| (id, event)))
    }

    /// Looks up a transaction by id. `INIT`, out-of-range ids, and ids with
    /// `session_id == 0` yield `None`.
    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction<Key, Value>> {
        let session = (id.session_id as usize).checked_sub(1)?;
        self.sessions
            .get(session)
            .and_then(|session| session.get(id.session_height as usize))
    }

    /// Number of transactions across all sessions, excluding `INIT`.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.sessions.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_session_history() -> History<&'static str, u64> {
        History::new(vec![
            vec![
                Transaction::new(vec![Event::write("x", 1)]),
                Transaction::new(vec![Event::read("x", 1), Event::write("x", 2)]),
            ],
            vec![Transaction::new(vec![Event::read("x", 2)])],
        ])
    }

    #[test]
    fn transaction_ids_are_session_positional() {
        let history = two_session_history();
        let ids: Vec<TransactionId> = history.transactions().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                TransactionId::new(1, 0),
                TransactionId::new(1, 1),
                TransactionId::new(2, 0),
            ]
        );
    }

    #[test]
    fn events_carry_owner_ids() {
        let history = two_session_history();
        let owners: Vec<TransactionId> = history.events().map(|(id, _)| id).collect();
        assert_eq!(owners[0], TransactionId::new(1, 0));
        assert_eq!(owners[1], TransactionId::new(1, 1));
        assert_eq!(owners.len(), 4);
    }

    #[test]
    fn lookup_by_id() {
        let history = two_session_history();
        assert!(history.transaction(TransactionId::new(2, 0)).is_some());
        assert!(history.transaction(TransactionId::new(3, 0)).is_none());
        assert!(history.transaction(TransactionId::INIT).is_none());
        // session_id 0 with nonzero height is not INIT but still invalid
        assert!(history.transaction(TransactionId::new(0, 1)).is_none());
    }
}

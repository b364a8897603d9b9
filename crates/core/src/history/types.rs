use alloc::vec::Vec;
use core::fmt::{Debug, Formatter, Result};

/// Unique identifier for a transaction within a history.
///
/// A transaction is identified by the session it belongs to (`session_id`)
/// and its position within that session (`session_height`). Ordering is
/// lexicographic: first by `session_id`, then by `session_height`.
///
/// [`TransactionId::INIT`] (`(0, 0)`) is the synthetic transaction holding
/// the initial database state. Session 0 is reserved for it; real sessions
/// are numbered from 1.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    /// 1-based session index. Session 0 is reserved for `INIT`.
    pub session_id: u64,
    /// 0-based position of the transaction within its session.
    pub session_height: u64,
}

impl TransactionId {
    /// The synthetic initial-state transaction `(0, 0)`.
    ///
    /// Every value present in the database before the history ran is treated
    /// as written by `INIT`, making it the unique source of all first-write
    /// dependencies.
    pub const INIT: Self = Self {
        session_id: 0,
        session_height: 0,
    };

    #[must_use]
    pub const fn new(session_id: u64, session_height: u64) -> Self {
        Self {
            session_id,
            session_height,
        }
    }

    /// Returns `true` for the synthetic initial-state transaction.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        self.session_id == 0 && self.session_height == 0
    }
}

/// A single read or write operation within a transaction.
///
/// Events reference their owning transaction by position only: iterating a
/// [`History`](super::History) yields `(TransactionId, &Event)` pairs, so no
/// back-pointer is stored.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event<Key, Value> {
    Read { key: Key, value: Value },
    Write { key: Key, value: Value },
}

impl<Key, Value> Event<Key, Value> {
    pub const fn read(key: Key, value: Value) -> Self {
        Self::Read { key, value }
    }

    pub const fn write(key: Key, value: Value) -> Self {
        Self::Write { key, value }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        match self {
            Self::Read { key, .. } | Self::Write { key, .. } => key,
        }
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        match self {
            Self::Read { value, .. } | Self::Write { value, .. } => value,
        }
    }
}

impl<Key, Value> Debug for Event<Key, Value>
where
    Key: Debug,
    Value: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Read { key, value } => write!(f, "{key:?}=>{value:?}"),
            Self::Write { key, value } => write!(f, "{key:?}<={value:?}"),
        }
    }
}

/// An ordered sequence of events executed atomically.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct Transaction<Key, Value> {
    pub events: Vec<Event<Key, Value>>,
}

impl<Key, Value> Transaction<Key, Value> {
    #[must_use]
    pub const fn new(events: Vec<Event<Key, Value>>) -> Self {
        Self { events }
    }
}

impl<Key, Value> Debug for Transaction<Key, Value>
where
    Key: Debug,
    Value: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{:?}", self.events)
    }
}

/// The ordered sequence of transactions issued by one client.
///
/// Consecutive transactions of a session define the session-order edges.
pub type Session<Key, Value> = Vec<Transaction<Key, Value>>;

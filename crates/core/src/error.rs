//! Error taxonomy for graph construction and auditing.
//!
//! Validation errors are fatal and abort the run before any audit attempt;
//! they are never silently recovered. A detected isolation violation is not
//! an error: the audit reports it as data
//! ([`AuditOutcome::Violation`](crate::audit::AuditOutcome::Violation)).

use derive_more::From;

use crate::graph::edge::{EdgeType, EdgeTypeMismatch};
use crate::history::TransactionId;
use crate::oracle::OracleError;

/// A structural defect in the recorded history.
///
/// Any of these means the log itself is untrustworthy; the run aborts and is
/// not retried.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedHistory<Key, Value> {
    /// A transaction referenced by an event is missing from a graph's node set.
    IncompleteGraph { transaction: TransactionId },
    /// A read observes a `(key, value)` pair that no write (and no
    /// initial-state entry) produced.
    DanglingRead {
        transaction: TransactionId,
        key: Key,
        value: Value,
    },
    /// A read's recorded value disagrees with every write on its key.
    ReadWriteMismatch {
        transaction: TransactionId,
        key: Key,
        value: Value,
    },
}

/// Error raised while building graphs or auditing a history.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum Error<Key, Value> {
    /// The history failed completeness or read/write validation.
    Malformed(MalformedHistory<Key, Value>),
    /// Two distinct transactions wrote the same `(key, value)` pair, so the
    /// per-key write succession order cannot be determined from the log.
    /// This means "cannot decide", not "violates".
    AmbiguousWriteWriteOrder {
        key: Key,
        value: Value,
        writers: [TransactionId; 2],
    },
    /// Internal contract violation: an edge merge was attempted across
    /// different edge types. Indicates a bug, not user-recoverable.
    EdgeTypeMismatch(EdgeTypeMismatch),
    /// The operation is explicitly not implemented.
    Unsupported(&'static str),
    /// The constraint search exceeded its configured step limit before
    /// reaching a verdict.
    SearchLimitExceeded { steps: u64 },
    /// The reachability backend rejected a query.
    Oracle(OracleError),
}

impl<Key, Value> Error<Key, Value> {
    /// Returns the edge type pair of an [`Error::EdgeTypeMismatch`], if any.
    #[must_use]
    pub const fn mismatched_types(&self) -> Option<(EdgeType, EdgeType)> {
        match self {
            Self::EdgeTypeMismatch(mismatch) => Some((mismatch.expected, mismatch.found)),
            _ => None,
        }
    }
}

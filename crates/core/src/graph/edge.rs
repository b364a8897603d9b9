use alloc::collections::BTreeSet;
use core::fmt::Debug;

/// The four kinds of precedence edges between transactions.
///
/// `SessionOrder`, `WriteRead`, and `WriteWrite` are *certain*: derivable
/// deterministically from the log, they hold in any legal execution.
/// `ReadWrite` anti-dependencies are *ambiguous* in general -- several
/// transactions can overwrite the version a reader observed, and only one
/// succession order is the true one.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeType {
    SessionOrder,
    WriteRead,
    WriteWrite,
    ReadWrite,
}

impl EdgeType {
    /// Certain edges hold in any legal execution of the history.
    #[must_use]
    pub const fn is_certain(self) -> bool {
        !matches!(self, Self::ReadWrite)
    }
}

/// Attempted merge of two edges with different types.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTypeMismatch {
    pub expected: EdgeType,
    pub found: EdgeType,
}

/// A typed edge between two transactions, carrying the keys that witness it.
///
/// Multiple edges of the same type between the same ordered node pair merge
/// their key sets rather than duplicating; for merge lookup purposes an edge
/// is identified by its type alone. Session-order edges carry no keys.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<Key>
where
    Key: Ord,
{
    edge_type: EdgeType,
    keys: BTreeSet<Key>,
}

impl<Key> Edge<Key>
where
    Key: Ord,
{
    #[must_use]
    pub fn new(edge_type: EdgeType, keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            edge_type,
            keys: keys.into_iter().collect(),
        }
    }

    /// An edge witnessed by no key (session order).
    #[must_use]
    pub const fn keyless(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            keys: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn edge_type(&self) -> EdgeType {
        self.edge_type
    }

    #[must_use]
    pub const fn keys(&self) -> &BTreeSet<Key> {
        &self.keys
    }

    /// Unions `other`'s witnessing keys into this edge.
    ///
    /// Key accumulation is idempotent: merging the same key twice leaves a
    /// single entry.
    ///
    /// # Errors
    ///
    /// [`EdgeTypeMismatch`] if the types differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), EdgeTypeMismatch>
    where
        Key: Clone,
    {
        if self.edge_type != other.edge_type {
            return Err(EdgeTypeMismatch {
                expected: self.edge_type,
                found: other.edge_type,
            });
        }
        self.keys.extend(other.keys.iter().cloned());
        Ok(())
    }
}

//! The edge model and the three precedence graphs.
//!
//! [`PrecedenceGraph`] holds three node-aligned graphs over one node set
//! (every transaction of the history plus [`TransactionId::INIT`]):
//!
//! - **read-from** -- write-read edges only;
//! - **certain** -- session-order, write-read, and write-write edges, which
//!   must hold in any legal execution;
//! - **ambiguous** -- read-write anti-dependencies, which may or may not
//!   hold depending on the true write succession order.
//!
//! [`TransactionId::INIT`]: crate::history::TransactionId::INIT

pub mod edge;
pub mod precedence;

pub use edge::{Edge, EdgeType, EdgeTypeMismatch};
pub use precedence::{EdgeCounts, KeyedGraph, PrecedenceGraph};

//! Isolation auditing for recorded transactional histories.
//!
//! `veriso_core` decides whether a recorded execution history of database
//! transactions is consistent with a target isolation guarantee. It ingests
//! per-transaction read/write events grouped into sessions, builds typed
//! precedence graphs over the transactions, and searches for a dependency
//! cycle that would prove the guarantee was violated.
//!
//! # Pipeline
//!
//! 1. **History model** ([`history`]) -- transactions grouped into sessions,
//!    each an ordered sequence of read/write events over `(key, value)`
//!    pairs, plus a synthetic `INIT` transaction carrying the initial
//!    database state.
//! 2. **Precedence graphs** ([`graph`]) -- three node-aligned graphs built
//!    from the history: *read-from* (write-read edges only), *certain*
//!    (session-order, write-read, and write-write edges, which hold in any
//!    legal execution), and *ambiguous* (read-write anti-dependencies).
//! 3. **Constraints** ([`constraint`]) -- per-key write orders that are not
//!    forced by the certain graph become choice constraints: two mutually
//!    exclusive edge orientations, exactly one of which holds.
//! 4. **Reachability oracle** ([`oracle`]) -- answers `reachable` and
//!    `find_cycle` over the certain edges plus a candidate orientation
//!    subset. Backed either by direct depth-first search ([`DfsOracle`])
//!    or by the matrix-power backend in `veriso_accel`; both must agree on
//!    every query.
//! 5. **Auditor** ([`audit`]) -- validates the graphs, generates the
//!    constraints, and searches for a cycle-free orientation assignment.
//!    Failure produces a witness cycle: an ordered sequence of transactions
//!    and the typed edges connecting them.
//!
//! # Entry point
//!
//! ```rust,ignore
//! use veriso_core::audit::{AuditOptions, Auditor, Isolation};
//! use veriso_core::oracle::dfs::DfsOracle;
//!
//! let mut auditor = Auditor::new(history, AuditOptions::new(Isolation::Serializable))?;
//! let mut oracle = DfsOracle::default();
//! match auditor.audit(&mut oracle)? {
//!     AuditOutcome::Passed => println!("history satisfies the isolation level"),
//!     AuditOutcome::Violation(witness) => println!("cycle: {:?}", witness.cycle),
//! }
//! ```
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on the public
//!   types (`History`, `TransactionId`, `EdgeType`, `AuditOutcome`, errors).
//!
//! This crate is `no_std` compatible (requires `alloc`). The matrix-power
//! reachability backend lives in the separate `veriso_accel` crate.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod audit;
pub mod constraint;
pub mod error;
pub mod graph;
pub mod history;
pub mod oracle;

pub use audit::{AuditOptions, AuditOutcome, Auditor, Isolation};
pub use error::Error;
pub use oracle::dfs::DfsOracle;
pub use oracle::ReachabilityOracle;

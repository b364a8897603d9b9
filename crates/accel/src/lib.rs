//! Matrix-power reachability backend.
//!
//! The auditor's search issues many reachability queries against graphs
//! that mostly grow edge by edge. This crate answers them from a full
//! transitive-closure matrix instead of walking the graph per query: the
//! closure is computed by repeated boolean matrix squaring (`log n` rounds
//! over bit-packed rows), and an extending load reuses the previous
//! closure as its starting point, so only the new paths are discovered.
//!
//! The closure engine is a process-wide singleton and must be brought up
//! with [`engine::initialize`] before the first load; [`MatrixOracle`]
//! implements [`ReachabilityOracle`] on top of it and is interchangeable
//! with [`veriso_core::DfsOracle`].
//!
//! ```no_run
//! use veriso_accel::{engine, MatrixOracle};
//! use veriso_core::ReachabilityOracle;
//!
//! engine::initialize();
//! let mut oracle = MatrixOracle::default();
//! oracle.load(3, &[(0, 1), (1, 2)], true)?;
//! assert!(oracle.reachable(0, 2));
//! engine::teardown();
//! # Ok::<(), veriso_core::oracle::OracleError>(())
//! ```
//!
//! [`ReachabilityOracle`]: veriso_core::ReachabilityOracle

pub mod engine;
pub mod oracle;

pub use engine::{initialize, is_initialized, teardown, AccelError};
pub use oracle::MatrixOracle;

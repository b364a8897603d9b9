//! Random history generation for the verification test suites.
//!
//! Every generated read observes a version some write (or the initial
//! state) actually produced, so the histories pass the auditor's
//! well-formedness validation by construction. Whether they satisfy an
//! isolation level is up to the audit.

pub mod generator;

pub use generator::{
    generate_mult_histories, generate_single_history, GeneratedHistory, HistParams,
};

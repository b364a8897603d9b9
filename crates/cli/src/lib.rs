//! veriso CLI -- generate transactional histories and audit their
//! isolation guarantees.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use veriso_core::audit::Isolation;

#[derive(Debug, Parser)]
#[command(
    name = "veriso",
    about = "Isolation auditing for recorded transactional histories"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate random transactional histories
    Generate(GenerateArgs),
    /// Audit the isolation guarantee of recorded histories
    Audit(AuditArgs),
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Number of histories to generate
    #[arg(long)]
    pub n_hist: u64,
    /// Number of sessions per history
    #[arg(long)]
    pub n_session: u64,
    /// Number of keys
    #[arg(long)]
    pub n_key: u64,
    /// Number of transactions per session
    #[arg(long)]
    pub n_txn: u64,
    /// Number of events per transaction
    #[arg(long)]
    pub n_evt: u64,
    /// Output directory for generated history files
    #[arg(long)]
    pub output_dir: PathBuf,
}

#[derive(Debug, Parser)]
pub struct AuditArgs {
    /// Input directory containing history JSON files
    #[arg(long)]
    pub input_dir: PathBuf,
    /// Isolation level to audit against
    #[arg(long)]
    pub isolation: IsolationLevel,
    /// Reachability backend to use
    #[arg(long, default_value = "direct")]
    pub backend: Backend,
    /// Abort the search after this many reachability loads
    #[arg(long)]
    pub step_limit: Option<u64>,
    /// Print witness details on FAIL and edge counts on PASS
    #[arg(long)]
    pub verbose: bool,
    /// Output results as JSON (one object per file)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IsolationLevel {
    SnapshotIsolation,
    Serializable,
}

/// Which [`ReachabilityOracle`] answers the audit's queries.
///
/// [`ReachabilityOracle`]: veriso_core::ReachabilityOracle
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// Per-query depth-first search
    Direct,
    /// Process-wide transitive-closure engine
    Matrix,
}

impl From<IsolationLevel> for Isolation {
    fn from(level: IsolationLevel) -> Self {
        match level {
            IsolationLevel::SnapshotIsolation => Self::SnapshotIsolation,
            IsolationLevel::Serializable => Self::Serializable,
        }
    }
}

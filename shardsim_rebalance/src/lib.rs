//! Load-balancing heuristics and the simulation loop that evaluates them.
//!
//! Each round a [`Heuristic`] proposes [`Action`]s against the current
//! [`ClusterState`](shardsim_shard::ClusterState), the actions are applied,
//! the cluster is resharded and an [`AnalysisResult`] snapshot is recorded.
#![deny(missing_docs)]

pub mod action;
pub mod analysis;
pub mod heuristic;
pub mod simulation;
pub mod stats;

pub use action::Action;
pub use analysis::{analyze, sample_evenly, AnalysisResult};
pub use heuristic::{Heuristic, DEFAULT_PERCENTILE};
pub use simulation::{ActionFilter, PassThrough, Round, RoundOutcome, Simulation, SimulationReport};
pub use stats::{quantile, summarize, BoxSummary, SummaryStats};

use shardsim_shard::ShardError;

/// Result type alias for rebalancing operations.
pub type Result<T> = std::result::Result<T, RebalanceError>;

/// Rebalancing errors. All of them abort a simulation run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RebalanceError {
    /// State-model failure, e.g. an action naming an unknown tenant.
    #[error(transparent)]
    Shard(#[from] ShardError),
    /// Percentile outside `[0, 1]`.
    #[error("percentile {0} is outside [0, 1]")]
    InvalidPercentile(f64),
    /// Budget that is negative or not a number.
    #[error("invalid budget: {0}")]
    InvalidBudget(f64),
}

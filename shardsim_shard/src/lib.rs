//! Shuffle-shard placement of tenants onto ingesters.
//!
//! [`ClusterState`] owns every tenant and ingester and keeps the
//! bidirectional assignment as index relations. [`Resharder`] rebuilds that
//! assignment from scratch, deterministically from each tenant's seed and
//! perturbation nonce.
#![deny(missing_docs)]

pub mod population;
pub mod reshard;
pub mod seed;
pub mod state;

pub use population::{generate, PopulationConfig};
pub use reshard::{DriftMode, Resharder};
pub use seed::{Md5SeedDeriver, SeedDeriver};
pub use state::{shard_width_for, ClusterState, Ingester, Tenant, LOAD_PER_SHARD};

/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, ShardError>;

/// Placement and state-model errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShardError {
    /// A cluster needs at least one ingester to place tenants on.
    #[error("cluster has no ingesters")]
    NoIngesters,
    /// Shard width must be at least one.
    #[error("tenant {tenant} has a shard width of zero")]
    ZeroShardWidth {
        /// Offending tenant.
        tenant: String,
    },
    /// Tenant identifiers must be unique.
    #[error("duplicate tenant id: {0}")]
    DuplicateTenant(String),
    /// Ingester identifiers must be unique.
    #[error("duplicate ingester id: {0}")]
    DuplicateIngester(String),
    /// Lookup of a tenant that is not part of the cluster.
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),
}

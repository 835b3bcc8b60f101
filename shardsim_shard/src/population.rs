//! Synthetic initial population.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::state::{shard_width_for, ClusterState, Ingester, Tenant, LOAD_PER_SHARD};
use crate::Result;

/// Size and seed of a generated population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of ingesters.
    pub ingesters: usize,
    /// Number of tenants.
    pub tenants: usize,
    /// Seed for the tenant load draws.
    pub seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self { ingesters: 500, tenants: 5000, seed: 0 }
    }
}

/// Generate `ingester-<i>` and `tenant-<i>` with heavy-tailed loads
/// `|N(0,1) * N(0,1) * 2e6 + 1|` and a shard width sized to the load.
///
/// The returned state is unplaced; reshard it before use.
pub fn generate(config: &PopulationConfig) -> Result<ClusterState> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let ingesters = (0..config.ingesters).map(|i| Ingester::new(format!("ingester-{i}"))).collect();
    let tenants = (0..config.tenants)
        .map(|i| {
            let a: f64 = rng.sample(StandardNormal);
            let b: f64 = rng.sample(StandardNormal);
            let load = (a * b * LOAD_PER_SHARD + 1.0).abs().trunc();
            Tenant::new(format!("tenant-{i}"), load, shard_width_for(load))
        })
        .collect::<Result<Vec<_>>>()?;
    ClusterState::new(ingesters, tenants)
}

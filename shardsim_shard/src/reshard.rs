//! Deterministic shuffle-shard resharding.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::seed::{Md5SeedDeriver, SeedDeriver};
use crate::state::ClusterState;

/// Mean of the per-reshard organic load drift.
pub const DRIFT_MEAN: f64 = 500.0;
/// Standard deviation of the per-reshard organic load drift.
pub const DRIFT_STD_DEV: f64 = 1000.0;

/// Whether resharding also drifts tenant load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftMode {
    /// Add a N(500, 1000) draw to every tenant's load on every pass, clamped
    /// at zero. Load accumulates across passes.
    #[default]
    Accumulate,
    /// Leave loads untouched. The drift draw is still consumed so placement
    /// is identical to [`DriftMode::Accumulate`].
    Frozen,
}

/// Recomputes tenant placement and ingester load from scratch.
#[derive(Debug, Clone)]
pub struct Resharder<D = Md5SeedDeriver> {
    deriver: D,
    namespace: String,
    drift: DriftMode,
}

impl Default for Resharder<Md5SeedDeriver> {
    fn default() -> Self {
        Self::new(Md5SeedDeriver)
    }
}

impl<D: SeedDeriver> Resharder<D> {
    /// Resharder using `deriver` for per-tenant base seeds.
    pub fn new(deriver: D) -> Self {
        Self { deriver, namespace: String::new(), drift: DriftMode::default() }
    }

    /// Namespace passed to the seed deriver alongside each tenant id.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Select how load drifts between passes.
    pub fn with_drift(mut self, drift: DriftMode) -> Self {
        self.drift = drift;
        self
    }

    /// Current drift mode.
    pub fn drift(&self) -> DriftMode {
        self.drift
    }

    /// Reset every ingester, then for each tenant: seed a private stream from
    /// `derive(id) + nonce`, drift the load, draw `min(shard_width, ingesters)`
    /// distinct ingesters and give each an even share of the tenant's load.
    pub fn reshard(&self, state: &mut ClusterState) {
        let ClusterState { ingesters, tenants, .. } = state;
        let count = ingesters.len();
        for ingester in ingesters.iter_mut() {
            ingester.reset();
        }

        for (tenant_idx, tenant) in tenants.iter_mut().enumerate() {
            let seed = self.deriver.derive(tenant.id(), &self.namespace);
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tenant.nonce()));

            let step: f64 = rng.sample(StandardNormal);
            if self.drift == DriftMode::Accumulate {
                tenant.set_load(tenant.load() + step * DRIFT_STD_DEV + DRIFT_MEAN);
            }

            let width = (tenant.shard_width() as usize).min(count);
            let share = tenant.load() / width as f64;
            tenant.ingesters.clear();
            while tenant.ingesters.len() < width {
                let pick = rng.gen_range(0..count);
                if tenant.ingesters.contains(&pick) {
                    continue;
                }
                tenant.ingesters.push(pick);
                let ingester = &mut ingesters[pick];
                ingester.tenants.push(tenant_idx);
                ingester.load += share;
            }
        }
    }
}

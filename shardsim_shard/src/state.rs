//! In-memory cluster model: tenants, ingesters and their assignment.

use std::collections::{HashMap, HashSet};

use crate::{Result, ShardError};

/// Load one shard is expected to carry before a tenant should widen.
pub const LOAD_PER_SHARD: f64 = 2_000_000.0;

/// Shard width a tenant of the given load should have: `max(1, ceil(load / LOAD_PER_SHARD))`.
pub fn shard_width_for(load: f64) -> u32 {
    (load / LOAD_PER_SHARD).ceil().max(1.0) as u32
}

/// A logical workload spread across `shard_width` ingesters.
#[derive(Debug, Clone, PartialEq)]
pub struct Tenant {
    id: String,
    nonce: u64,
    load: f64,
    shard_width: u32,
    /// Ingester indices in assignment order.
    pub(crate) ingesters: Vec<usize>,
}

impl Tenant {
    /// Create an unplaced tenant. Negative loads are clamped to zero.
    pub fn new(id: impl Into<String>, load: f64, shard_width: u32) -> Result<Self> {
        let id = id.into();
        if shard_width == 0 {
            return Err(ShardError::ZeroShardWidth { tenant: id });
        }
        Ok(Self {
            id,
            nonce: 0,
            load: load.max(0.0),
            shard_width,
            ingesters: Vec::new(),
        })
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Perturbation nonce mixed into the placement seed.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Current load in records.
    pub fn load(&self) -> f64 {
        self.load
    }

    /// Desired number of ingesters.
    pub fn shard_width(&self) -> u32 {
        self.shard_width
    }

    /// Indices of the ingesters the tenant is placed on, in draw order.
    pub fn ingesters(&self) -> &[usize] {
        &self.ingesters
    }

    /// Bump the nonce so the next reshard draws a different stream.
    pub fn perturb(&mut self) {
        self.nonce += 1;
    }

    /// Change the desired shard width.
    pub fn set_shard_width(&mut self, shard_width: u32) -> Result<()> {
        if shard_width == 0 {
            return Err(ShardError::ZeroShardWidth { tenant: self.id.clone() });
        }
        self.shard_width = shard_width;
        Ok(())
    }

    pub(crate) fn set_load(&mut self, load: f64) {
        self.load = load.max(0.0);
    }
}

/// A serving node holding shares of one or more tenants.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingester {
    id: String,
    pub(crate) load: f64,
    pub(crate) tenants: Vec<usize>,
}

impl Ingester {
    /// Create an empty ingester.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), load: 0.0, tenants: Vec::new() }
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Aggregate load of all tenant shares placed here.
    pub fn load(&self) -> f64 {
        self.load
    }

    /// Indices of the tenants placed here.
    pub fn tenants(&self) -> &[usize] {
        &self.tenants
    }

    pub(crate) fn reset(&mut self) {
        self.load = 0.0;
        self.tenants.clear();
    }
}

/// Owned arena of ingesters and tenants.
///
/// Assignment is stored as indices on both sides and only rewritten by
/// [`crate::Resharder`]; everything else reads it.
#[derive(Debug, Clone)]
pub struct ClusterState {
    pub(crate) ingesters: Vec<Ingester>,
    pub(crate) tenants: Vec<Tenant>,
    tenant_index: HashMap<String, usize>,
}

impl ClusterState {
    /// Build a cluster from its population. Fails on an empty ingester set
    /// or duplicate identifiers.
    pub fn new(ingesters: Vec<Ingester>, tenants: Vec<Tenant>) -> Result<Self> {
        if ingesters.is_empty() {
            return Err(ShardError::NoIngesters);
        }
        let mut seen = HashSet::with_capacity(ingesters.len());
        for ingester in &ingesters {
            if !seen.insert(ingester.id()) {
                return Err(ShardError::DuplicateIngester(ingester.id().to_string()));
            }
        }
        let mut tenant_index = HashMap::with_capacity(tenants.len());
        for (idx, tenant) in tenants.iter().enumerate() {
            if tenant_index.insert(tenant.id().to_string(), idx).is_some() {
                return Err(ShardError::DuplicateTenant(tenant.id().to_string()));
            }
        }
        Ok(Self { ingesters, tenants, tenant_index })
    }

    /// All ingesters, in population order.
    pub fn ingesters(&self) -> &[Ingester] {
        &self.ingesters
    }

    /// All tenants, in population order.
    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    /// Look up a tenant by identifier.
    pub fn tenant(&self, id: &str) -> Option<&Tenant> {
        self.tenant_index.get(id).map(|&idx| &self.tenants[idx])
    }

    /// Mutable tenant lookup; an unknown id is an error.
    pub fn tenant_mut(&mut self, id: &str) -> Result<&mut Tenant> {
        match self.tenant_index.get(id) {
            Some(&idx) => Ok(&mut self.tenants[idx]),
            None => Err(ShardError::UnknownTenant(id.to_string())),
        }
    }

    /// Number of ingesters a tenant is actually spread across:
    /// `min(shard_width, ingester count)`.
    pub fn effective_width(&self, tenant: &Tenant) -> usize {
        (tenant.shard_width() as usize).min(self.ingesters.len())
    }

    /// Whether perturbing the tenant can move it: it is not already on every ingester.
    pub fn is_movable(&self, tenant: &Tenant) -> bool {
        (tenant.shard_width() as usize) < self.ingesters.len()
    }

    /// Sum of all ingester loads.
    pub fn total_ingester_load(&self) -> f64 {
        self.ingesters.iter().map(Ingester::load).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_for_load() {
        assert_eq!(shard_width_for(0.0), 1);
        assert_eq!(shard_width_for(1.0), 1);
        assert_eq!(shard_width_for(2_000_000.0), 1);
        assert_eq!(shard_width_for(2_000_001.0), 2);
        assert_eq!(shard_width_for(5_000_000.0), 3);
    }

    #[test]
    fn rejects_degenerate_population() {
        let t = Tenant::new("t", 1.0, 1).unwrap();
        assert_eq!(ClusterState::new(vec![], vec![t.clone()]).unwrap_err(), ShardError::NoIngesters);
        assert!(matches!(Tenant::new("t", 1.0, 0), Err(ShardError::ZeroShardWidth { .. })));

        let dup = ClusterState::new(vec![Ingester::new("a"), Ingester::new("a")], vec![]);
        assert_eq!(dup.unwrap_err(), ShardError::DuplicateIngester("a".into()));
        let dup = ClusterState::new(vec![Ingester::new("a")], vec![t.clone(), t]);
        assert_eq!(dup.unwrap_err(), ShardError::DuplicateTenant("t".into()));
    }

    #[test]
    fn tenant_lookup_and_mutation() {
        let tenants = vec![Tenant::new("t0", 10.0, 1).unwrap(), Tenant::new("t1", 20.0, 4).unwrap()];
        let mut state = ClusterState::new(vec![Ingester::new("i0"), Ingester::new("i1")], tenants).unwrap();

        assert_eq!(state.tenant("t1").map(Tenant::load), Some(20.0));
        assert!(state.tenant("nope").is_none());
        assert_eq!(state.tenant_mut("nope").unwrap_err(), ShardError::UnknownTenant("nope".into()));

        let t1 = state.tenant("t1").unwrap();
        assert_eq!(state.effective_width(t1), 2);
        assert!(!state.is_movable(t1));

        let t0 = state.tenant_mut("t0").unwrap();
        t0.perturb();
        t0.perturb();
        assert_eq!(t0.nonce(), 2);
        assert!(t0.set_shard_width(0).is_err());
        assert_eq!(t0.shard_width(), 1);
    }
}

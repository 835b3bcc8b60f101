//! Balancing actions proposed by heuristics.
use serde::{Deserialize, Serialize};
use shardsim_shard::{shard_width_for, ClusterState};

use crate::Result;

/// A single mutation of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    /// Bump the tenant's nonce; it lands on a fresh shard at the next reshard.
    Perturb {
        /// Tenant id.
        tenant: String,
    },
    /// Resize the shard width to fit the tenant's current load.
    Widen {
        /// Tenant id.
        tenant: String,
    },
}

impl Action {
    /// Tenant the action targets.
    pub fn tenant(&self) -> &str {
        match self {
            Action::Perturb { tenant } | Action::Widen { tenant } => tenant,
        }
    }

    /// Apply to `state`. Fails if the tenant does not exist.
    pub fn apply(&self, state: &mut ClusterState) -> Result<()> {
        let tenant = state.tenant_mut(self.tenant())?;
        match self {
            Action::Perturb { .. } => tenant.perturb(),
            Action::Widen { .. } => {
                let width = shard_width_for(tenant.load());
                tenant.set_shard_width(width)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RebalanceError;
    use shardsim_shard::{Ingester, ShardError, Tenant};

    fn state() -> ClusterState {
        let tenants = vec![Tenant::new("big", 5_000_000.0, 1).unwrap(), Tenant::new("tiny", 3.0, 4).unwrap()];
        ClusterState::new(vec![Ingester::new("i0"), Ingester::new("i1")], tenants).unwrap()
    }

    #[test]
    fn perturb_bumps_nonce() {
        let mut state = state();
        let action = Action::Perturb { tenant: "big".into() };
        action.apply(&mut state).unwrap();
        action.apply(&mut state).unwrap();
        assert_eq!(state.tenant("big").unwrap().nonce(), 2);
        assert_eq!(state.tenant("tiny").unwrap().nonce(), 0);
    }

    #[test]
    fn widen_sizes_to_load() {
        let mut state = state();
        Action::Widen { tenant: "big".into() }.apply(&mut state).unwrap();
        assert_eq!(state.tenant("big").unwrap().shard_width(), 3);
        // Widen also shrinks an oversized shard down to at least one.
        Action::Widen { tenant: "tiny".into() }.apply(&mut state).unwrap();
        assert_eq!(state.tenant("tiny").unwrap().shard_width(), 1);
    }

    #[test]
    fn unknown_tenant_is_an_error() {
        let mut state = state();
        let err = Action::Perturb { tenant: "ghost".into() }.apply(&mut state).unwrap_err();
        assert_eq!(err, RebalanceError::Shard(ShardError::UnknownTenant("ghost".into())));
    }
}

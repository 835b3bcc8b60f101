//! Planning heuristics. They read the cluster and propose actions, never mutate it.
use serde::{Deserialize, Serialize};
use shardsim_shard::{ClusterState, LOAD_PER_SHARD};

use crate::action::Action;
use crate::stats::quantile;
use crate::{RebalanceError, Result};

/// Percentile above which an ingester counts as hot.
pub const DEFAULT_PERCENTILE: f64 = 0.95;

fn default_percentile() -> f64 {
    DEFAULT_PERCENTILE
}

/// A balancing strategy.
///
/// `budget` caps the cumulative tenant load a budgeted heuristic selects in
/// one call; the last selected tenant may overshoot it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "heuristic", rename_all = "kebab-case")]
pub enum Heuristic {
    /// Perturb the largest movable tenant on each of the most loaded ingesters.
    LargestTenantOnLargestIngester,
    /// Perturb tenants mostly placed on ingesters above a load percentile.
    AbovePercentile {
        /// Load quantile in `[0, 1]` an ingester must exceed to be hot.
        #[serde(default = "default_percentile")]
        percentile: f64,
    },
    /// Widen every tenant whose load outgrew its shard width. Ignores the budget.
    GrowShardWidth,
}

impl Heuristic {
    /// Hot-ingester heuristic at the default percentile.
    pub fn above_percentile() -> Self {
        Heuristic::AbovePercentile { percentile: DEFAULT_PERCENTILE }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::LargestTenantOnLargestIngester => "largest-tenant-on-largest-ingester",
            Heuristic::AbovePercentile { .. } => "above-percentile",
            Heuristic::GrowShardWidth => "grow-shard-width",
        }
    }

    /// Propose actions for `state` within `budget`.
    pub fn plan(&self, state: &ClusterState, budget: f64) -> Result<Vec<Action>> {
        if budget.is_nan() || budget < 0.0 {
            return Err(RebalanceError::InvalidBudget(budget));
        }
        match *self {
            Heuristic::LargestTenantOnLargestIngester => Ok(largest_tenant_on_largest_ingester(state, budget)),
            Heuristic::AbovePercentile { percentile } => {
                if !(0.0..=1.0).contains(&percentile) {
                    return Err(RebalanceError::InvalidPercentile(percentile));
                }
                Ok(above_percentile(state, budget, percentile))
            }
            Heuristic::GrowShardWidth => Ok(grow_shard_width(state)),
        }
    }
}

/// First item with the strictly highest key; ties go to the earliest.
fn first_max<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> f64) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for item in items {
        let k = key(&item);
        if best.as_ref().map_or(true, |(_, b)| k > *b) {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

fn largest_tenant_on_largest_ingester(state: &ClusterState, budget: f64) -> Vec<Action> {
    let ingesters = state.ingesters();
    let tenants = state.tenants();
    let mut seen_ingesters = vec![false; ingesters.len()];
    let mut seen_tenants = vec![false; tenants.len()];
    let mut selected = 0.0;
    let mut actions = Vec::new();

    while selected < budget {
        let candidates = (0..ingesters.len()).filter(|&i| !seen_ingesters[i]);
        let Some(ingester) = first_max(candidates, |&i| ingesters[i].load()) else {
            // every ingester already gave up a tenant
            break;
        };

        let eligible = ingesters[ingester]
            .tenants()
            .iter()
            .copied()
            .filter(|&t| !seen_tenants[t] && state.is_movable(&tenants[t]));
        let Some(tenant) = first_max(eligible, |&t| tenants[t].load()) else {
            break;
        };

        seen_ingesters[ingester] = true;
        seen_tenants[tenant] = true;
        selected += tenants[tenant].load();
        actions.push(Action::Perturb { tenant: tenants[tenant].id().to_string() });
    }
    actions
}

fn above_percentile(state: &ClusterState, budget: f64, percentile: f64) -> Vec<Action> {
    let ingesters = state.ingesters();
    let tenants = state.tenants();

    let mut loads: Vec<f64> = ingesters.iter().map(|i| i.load()).collect();
    loads.sort_by(f64::total_cmp);
    let Some(threshold) = quantile(percentile, &loads) else {
        return Vec::new();
    };
    let hot: Vec<bool> = ingesters.iter().map(|i| i.load() > threshold).collect();

    // +1 per hot ingester, -1 per other ingester.
    let mut scores: Vec<(usize, i64)> = tenants
        .iter()
        .enumerate()
        .filter(|(_, t)| state.is_movable(t))
        .map(|(idx, t)| {
            let score: i64 = t.ingesters().iter().map(|&i| if hot[i] { 1 } else { -1 }).sum();
            (idx, score)
        })
        .collect();
    // Stable: equal scores keep population order.
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let mut touched = vec![false; ingesters.len()];
    let mut selected = 0.0;
    let mut actions = Vec::new();
    for (idx, score) in scores {
        if selected >= budget || score <= 0 {
            break;
        }
        let tenant = &tenants[idx];
        if tenant.ingesters().iter().any(|&i| touched[i]) {
            continue;
        }
        for &i in tenant.ingesters() {
            touched[i] = true;
        }
        selected += tenant.load();
        actions.push(Action::Perturb { tenant: tenant.id().to_string() });
    }
    actions
}

fn grow_shard_width(state: &ClusterState) -> Vec<Action> {
    state
        .tenants()
        .iter()
        .filter(|t| t.load() > t.shard_width() as f64 * LOAD_PER_SHARD)
        .map(|t| Action::Widen { tenant: t.id().to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardsim_shard::{generate, DriftMode, Ingester, PopulationConfig, Resharder, Tenant};

    /// One ingester per tenant, with tenant `k` pinned to ingester `k % ingesters`.
    fn pinned(ingesters: usize, loads: &[f64]) -> ClusterState {
        let nodes = (0..ingesters).map(|i| Ingester::new(format!("i{i}"))).collect();
        let tenants = loads.iter().enumerate().map(|(i, &l)| Tenant::new(format!("t{i}"), l, 1).unwrap()).collect();
        let mut state = ClusterState::new(nodes, tenants).unwrap();
        // Pick each tenant's seed so its first draw lands on the wanted ingester.
        let seeds: Vec<u64> = (0..loads.len())
            .map(|k| {
                let want = k % ingesters;
                (0u64..)
                    .find(|&seed| {
                        let mut single = ClusterState::new(
                            (0..ingesters).map(|i| Ingester::new(format!("i{i}"))).collect(),
                            vec![Tenant::new("single", 1.0, 1).unwrap()],
                        )
                        .unwrap();
                        Resharder::new(move |_: &str, _: &str| seed).with_drift(DriftMode::Frozen).reshard(&mut single);
                        single.tenants()[0].ingesters()[0] == want
                    })
                    .unwrap()
            })
            .collect();
        let deriver = move |id: &str, _: &str| seeds[id[1..].parse::<usize>().unwrap()];
        Resharder::new(deriver).with_drift(DriftMode::Frozen).reshard(&mut state);
        state
    }

    fn perturbed(actions: &[Action]) -> Vec<&str> {
        actions.iter().map(Action::tenant).collect()
    }

    fn population() -> ClusterState {
        let mut state = generate(&PopulationConfig { ingesters: 40, tenants: 400, seed: 5 }).unwrap();
        Resharder::default().reshard(&mut state);
        state
    }

    #[test]
    fn largest_on_largest_walks_ingesters_by_load() {
        // i0: t0(100) + t3(30); i1: t1(50); i2: t2(10)
        let state = pinned(3, &[100.0, 50.0, 10.0, 30.0]);
        let actions = Heuristic::LargestTenantOnLargestIngester.plan(&state, 1e9).unwrap();
        assert_eq!(perturbed(&actions), vec!["t0", "t1", "t2"]);

        let actions = Heuristic::LargestTenantOnLargestIngester.plan(&state, 120.0).unwrap();
        assert_eq!(perturbed(&actions), vec!["t0", "t1"]);
    }

    #[test]
    fn largest_on_largest_stops_without_eligible_tenant() {
        let nodes = vec![Ingester::new("i0"), Ingester::new("i1")];
        let tenants = vec![Tenant::new("wide", 1000.0, 2).unwrap(), Tenant::new("small", 5.0, 1).unwrap()];
        let mut state = ClusterState::new(nodes, tenants).unwrap();
        Resharder::default().with_drift(DriftMode::Frozen).reshard(&mut state);
        // "wide" covers every ingester, so the second ingester has nothing movable.
        let actions = Heuristic::LargestTenantOnLargestIngester.plan(&state, 1e9).unwrap();
        assert_eq!(perturbed(&actions), vec!["small"]);
    }

    #[test]
    fn above_percentile_targets_hot_ingesters() {
        // 20 ingesters, one tenant each; i19 is hottest and alone above p95.
        let mut loads: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        loads[19] = 1000.0;
        let state = pinned(20, &loads);
        let actions = Heuristic::above_percentile().plan(&state, 1e9).unwrap();
        assert_eq!(perturbed(&actions), vec!["t19"]);

        let strict = Heuristic::AbovePercentile { percentile: 0.5 }.plan(&state, 1e9).unwrap();
        assert_eq!(strict.len(), 10);
        assert!(strict.iter().all(|a| a.tenant()[1..].parse::<usize>().unwrap() >= 10));
    }

    #[test]
    fn above_percentile_skips_tenants_sharing_touched_ingesters() {
        // t0 and t4 share i0; i0 and i1 are hot.
        let state = pinned(4, &[10.0, 900.0, 20.0, 5.0, 40.0]);
        let actions = Heuristic::AbovePercentile { percentile: 0.5 }.plan(&state, 1e9).unwrap();
        assert_eq!(perturbed(&actions), vec!["t0", "t1"]);
    }

    #[test]
    fn budgets_are_respected() {
        let state = population();
        let max_tenant = state.tenants().iter().map(|t| t.load()).fold(0.0, f64::max);
        let total = state.total_ingester_load();
        for heuristic in [Heuristic::LargestTenantOnLargestIngester, Heuristic::above_percentile()] {
            for budget in [total / 100.0, total / 20.0, total / 2.0] {
                let actions = heuristic.plan(&state, budget).unwrap();
                let selected: f64 = actions.iter().map(|a| state.tenant(a.tenant()).unwrap().load()).sum();
                assert!(selected <= budget + max_tenant, "{} overshot {budget}", heuristic.name());
            }
        }
    }

    #[test]
    fn zero_budget_plans_nothing() {
        let state = population();
        assert!(Heuristic::LargestTenantOnLargestIngester.plan(&state, 0.0).unwrap().is_empty());
        assert!(Heuristic::above_percentile().plan(&state, 0.0).unwrap().is_empty());
    }

    #[test]
    fn grow_shard_width_flags_outgrown_tenants() {
        let nodes = (0..5).map(|i| Ingester::new(format!("i{i}"))).collect();
        let tenants = vec![
            Tenant::new("big", 5_000_000.0, 1).unwrap(),
            Tenant::new("fits", 4_000_000.0, 2).unwrap(),
            Tenant::new("small", 10.0, 1).unwrap(),
        ];
        let mut state = ClusterState::new(nodes, tenants).unwrap();
        let actions = Heuristic::GrowShardWidth.plan(&state, 0.0).unwrap();
        assert_eq!(actions, vec![Action::Widen { tenant: "big".into() }]);
        actions[0].apply(&mut state).unwrap();
        assert_eq!(state.tenant("big").unwrap().shard_width(), 3);
    }

    #[test]
    fn invalid_arguments() {
        let state = population();
        assert_eq!(
            Heuristic::above_percentile().plan(&state, -1.0).unwrap_err(),
            RebalanceError::InvalidBudget(-1.0)
        );
        assert!(Heuristic::GrowShardWidth.plan(&state, f64::NAN).is_err());
        assert_eq!(
            Heuristic::AbovePercentile { percentile: 1.5 }.plan(&state, 1.0).unwrap_err(),
            RebalanceError::InvalidPercentile(1.5)
        );
    }

    #[test]
    fn heuristic_names_round_trip_through_serde() {
        let h: Heuristic = serde_json::from_str(r#"{"heuristic":"above-percentile"}"#).unwrap();
        assert_eq!(h, Heuristic::above_percentile());
        let h: Heuristic = serde_json::from_str(r#"{"heuristic":"grow-shard-width"}"#).unwrap();
        assert_eq!(h.name(), "grow-shard-width");
    }
}

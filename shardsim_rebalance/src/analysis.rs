//! Per-round snapshots of cluster balance.
use std::fmt;

use serde::{Deserialize, Serialize};
use shardsim_shard::ClusterState;

use crate::stats::{summarize, SummaryStats};

/// Snapshot of tenant and ingester distributions after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Load per tenant.
    pub tenant_loads: SummaryStats,
    /// Load per shard, `tenant load / ingesters placed on`.
    pub tenant_shard_loads: SummaryStats,
    /// Load per ingester.
    pub ingester_loads: SummaryStats,
    /// Tenants placed on each ingester.
    pub ingester_tenant_counts: SummaryStats,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tenant loads:           {}", self.tenant_loads)?;
        writeln!(f, "tenant shard loads:     {}", self.tenant_shard_loads)?;
        writeln!(f, "ingester loads:         {}", self.ingester_loads)?;
        write!(f, "ingester tenant counts: {}", self.ingester_tenant_counts)
    }
}

/// Summarize the current placement.
pub fn analyze(state: &ClusterState) -> AnalysisResult {
    let tenants = state.tenants();
    let ingesters = state.ingesters();
    AnalysisResult {
        tenant_loads: summarize(tenants.iter().map(|t| t.load()).collect()),
        tenant_shard_loads: summarize(
            tenants.iter().map(|t| t.load() / state.effective_width(t) as f64).collect(),
        ),
        ingester_loads: summarize(ingesters.iter().map(|i| i.load()).collect()),
        ingester_tenant_counts: summarize(ingesters.iter().map(|i| i.tenants().len() as f64).collect()),
    }
}

/// Pick roughly `count` evenly spaced entries from `history`, always
/// keeping the first and the last.
pub fn sample_evenly<T>(history: &[T], count: usize) -> Vec<&T> {
    let Some(last) = history.len().checked_sub(1) else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![&history[last]];
    }
    let stride = history.len() / (count - 1);
    if stride == 0 {
        return history.iter().collect();
    }
    history
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0 || *i == last)
        .map(|(_, a)| a)
        .collect()
}

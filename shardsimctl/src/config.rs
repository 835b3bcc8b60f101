//! Simulation config loaded from YAML.
use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use shardsim_rebalance::{Heuristic, Round};
use shardsim_shard::{DriftMode, PopulationConfig};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub population: PopulationConfig,
    /// Seed namespace, e.g. a zone name.
    pub namespace: String,
    pub drift: DriftMode,
    /// Snapshots shown in the longitudinal summary.
    pub samples: usize,
    pub schedule: Vec<Phase>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            namespace: String::new(),
            drift: DriftMode::default(),
            samples: 10,
            schedule: vec![Phase {
                repeat: 1000,
                steps: vec![
                    Step { heuristic: Heuristic::above_percentile(), budget: Budget::Fraction { fraction: 0.05, decay: false } },
                    Step { heuristic: Heuristic::GrowShardWidth, budget: Budget::Fraction { fraction: 1.0, decay: true } },
                ],
            }],
        }
    }
}

/// `steps` run in order, the whole list `repeat` times.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Phase {
    #[serde(default = "one")]
    pub repeat: usize,
    pub steps: Vec<Step>,
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub heuristic: Heuristic,
    #[serde(default)]
    pub budget: Budget,
}

/// Budget of a step, resolved against the initial total ingester load.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Absolute { absolute: f64 },
    /// `fraction * total`, divided by `iteration + 1` when `decay` is set.
    Fraction {
        fraction: f64,
        #[serde(default)]
        decay: bool,
    },
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Absolute { absolute: 0.0 }
    }
}

impl Budget {
    pub fn resolve(&self, total_load: f64, iteration: usize) -> f64 {
        match *self {
            Budget::Absolute { absolute } => absolute,
            Budget::Fraction { fraction, decay: false } => fraction * total_load,
            Budget::Fraction { fraction, decay: true } => fraction * total_load / (iteration + 1) as f64,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Expand the schedule into concrete rounds.
    pub fn rounds(&self, total_load: f64) -> Vec<Round> {
        let mut rounds = Vec::new();
        for phase in &self.schedule {
            for iteration in 0..phase.repeat {
                for step in &phase.steps {
                    rounds.push(Round::new(step.heuristic, step.budget.resolve(total_load, iteration)));
                }
            }
        }
        rounds
    }
}

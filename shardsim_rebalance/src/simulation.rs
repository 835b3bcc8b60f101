//! The propose → apply → reshard → summarize loop.
use serde::{Deserialize, Serialize};
use shardsim_shard::{ClusterState, Md5SeedDeriver, Resharder, SeedDeriver};
use tracing::{debug, info};

use crate::action::Action;
use crate::analysis::{analyze, AnalysisResult};
use crate::heuristic::Heuristic;
use crate::Result;

/// One scheduled round: which heuristic to run and with what budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Strategy to plan with.
    pub heuristic: Heuristic,
    /// Load budget handed to the heuristic.
    pub budget: f64,
}

impl Round {
    /// Round running `heuristic` under `budget`.
    pub fn new(heuristic: Heuristic, budget: f64) -> Self {
        Self { heuristic, budget }
    }
}

/// Policy hook between planning and application.
pub trait ActionFilter {
    /// Return the actions that should actually be applied.
    fn filter(&self, state: &ClusterState, actions: Vec<Action>) -> Vec<Action>;
}

impl<F> ActionFilter for F
where
    F: Fn(&ClusterState, Vec<Action>) -> Vec<Action>,
{
    fn filter(&self, state: &ClusterState, actions: Vec<Action>) -> Vec<Action> {
        self(state, actions)
    }
}

/// Applies every proposed action.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ActionFilter for PassThrough {
    fn filter(&self, _state: &ClusterState, actions: Vec<Action>) -> Vec<Action> {
        actions
    }
}

/// What a single round did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Actions were applied and a snapshot recorded.
    Applied {
        /// Number of actions applied.
        actions: usize,
    },
    /// Nothing to do; no reshard, no snapshot.
    Skipped,
}

/// Everything a run produced, for the reporting sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Initial snapshot followed by one entry per applied round.
    pub history: Vec<AnalysisResult>,
    /// Rounds that applied at least one action.
    pub rounds_applied: usize,
    /// Rounds with nothing to apply.
    pub rounds_skipped: usize,
    /// Sorted ingester loads before the first round.
    pub initial_ingester_loads: Vec<f64>,
    /// Sorted ingester loads after the last round.
    pub final_ingester_loads: Vec<f64>,
}

/// Drives heuristics against a cluster and records snapshots.
///
/// The cluster handed in must already be resharded once; its analysis is
/// the first history entry.
pub struct Simulation<D = Md5SeedDeriver, F = PassThrough> {
    state: ClusterState,
    resharder: Resharder<D>,
    filter: F,
    history: Vec<AnalysisResult>,
    rounds_applied: usize,
    rounds_skipped: usize,
}

impl<D: SeedDeriver> Simulation<D, PassThrough> {
    /// Start from a resharded `state`, applying every proposed action.
    pub fn new(state: ClusterState, resharder: Resharder<D>) -> Self {
        let initial = analyze(&state);
        Self {
            state,
            resharder,
            filter: PassThrough,
            history: vec![initial],
            rounds_applied: 0,
            rounds_skipped: 0,
        }
    }
}

impl<D: SeedDeriver, F: ActionFilter> Simulation<D, F> {
    /// Replace the action filter.
    pub fn with_filter<G: ActionFilter>(self, filter: G) -> Simulation<D, G> {
        Simulation {
            state: self.state,
            resharder: self.resharder,
            filter,
            history: self.history,
            rounds_applied: self.rounds_applied,
            rounds_skipped: self.rounds_skipped,
        }
    }

    /// Current cluster.
    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// Snapshots recorded so far, initial one first.
    pub fn history(&self) -> &[AnalysisResult] {
        &self.history
    }

    /// Run one round. Any error leaves the cluster as it was after the
    /// last successfully applied action and should abort the run.
    pub fn step(&mut self, round: &Round) -> Result<RoundOutcome> {
        let planned = round.heuristic.plan(&self.state, round.budget)?;
        let actions = self.filter.filter(&self.state, planned);
        if actions.is_empty() {
            debug!(heuristic = round.heuristic.name(), budget = round.budget, "no actions to apply");
            self.rounds_skipped += 1;
            return Ok(RoundOutcome::Skipped);
        }

        info!(heuristic = round.heuristic.name(), budget = round.budget, actions = actions.len(), "applying actions");
        for action in &actions {
            action.apply(&mut self.state)?;
        }
        self.resharder.reshard(&mut self.state);
        self.history.push(analyze(&self.state));
        self.rounds_applied += 1;
        Ok(RoundOutcome::Applied { actions: actions.len() })
    }

    /// Run every round in order and hand back the report.
    pub fn run<'a>(mut self, rounds: impl IntoIterator<Item = &'a Round>) -> Result<SimulationReport> {
        for round in rounds {
            self.step(round)?;
        }
        info!(
            applied = self.rounds_applied,
            skipped = self.rounds_skipped,
            snapshots = self.history.len(),
            "simulation complete"
        );
        Ok(self.into_report())
    }

    /// Finish without running further rounds.
    pub fn into_report(self) -> SimulationReport {
        let loads = |a: Option<&AnalysisResult>| a.map(|a| a.ingester_loads.raw_data.clone()).unwrap_or_default();
        SimulationReport {
            initial_ingester_loads: loads(self.history.first()),
            final_ingester_loads: loads(self.history.last()),
            rounds_applied: self.rounds_applied,
            rounds_skipped: self.rounds_skipped,
            history: self.history,
        }
    }
}

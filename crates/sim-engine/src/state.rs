//! Per-run session state.

use serde::{Deserialize, Serialize};
use sim_core::{
    BusinessMetrics, DecisionRecord, ImpactMultipliers, Phase, ScenarioRecord, MAX_DECISIONS,
};
use std::collections::BTreeMap;

/// Everything one simulation run owns.
///
/// Fields are private: the engine transitions in [`crate::engine`] are the
/// only way to move a run forward, and the resolver only touches the
/// generated-scenario cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub(crate) step: u32,
    pub(crate) history: Vec<DecisionRecord>,
    pub(crate) metrics: BusinessMetrics,
    pub(crate) current_key: Option<String>,
    pub(crate) generated: BTreeMap<String, ScenarioRecord>,
    pub(crate) multipliers: ImpactMultipliers,
    pub(crate) completed: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            step: 0,
            history: Vec::new(),
            metrics: BusinessMetrics::INITIAL,
            current_key: None,
            generated: BTreeMap::new(),
            multipliers: ImpactMultipliers::default(),
            completed: false,
        }
    }

    /// 0 before a topic is chosen, then the 1-based number of the decision
    /// being presented.
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    pub fn metrics(&self) -> &BusinessMetrics {
        &self.metrics
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// Scenarios generated (or synthesized) during this run.
    pub fn generated(&self) -> &BTreeMap<String, ScenarioRecord> {
        &self.generated
    }

    pub fn multipliers(&self) -> &ImpactMultipliers {
        &self.multipliers
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Cash exhausted; implies completion once a decision has been applied.
    pub fn is_game_over(&self) -> bool {
        self.metrics.is_bankrupt()
    }

    pub fn decisions_left(&self) -> usize {
        MAX_DECISIONS.saturating_sub(self.history.len())
    }

    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else if self.current_key.is_none() {
            Phase::SelectingTopic
        } else {
            Phase::InScenario
        }
    }

    pub(crate) fn cache_mut(&mut self) -> &mut BTreeMap<String, ScenarioRecord> {
        &mut self.generated
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

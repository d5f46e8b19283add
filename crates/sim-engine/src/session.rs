//! One player's run: state, resolver and a seeded RNG behind one handle.

use crate::engine;
use crate::resolver::{Resolved, Resolver};
use crate::state::SessionState;
use crate::summary::{self, ClosingAnalysis, TopicSuggestions};
use crate::ScenarioGenerator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sim_content::ScenarioRepository;
use sim_core::{BranchChoice, BusinessMetrics, MetricKind, ScenarioRecord, StateError};
use std::sync::Arc;
use tracing::{debug, info};

/// What a decision did, for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    /// The scenario the decision was made on.
    pub record: ScenarioRecord,
    pub choice: BranchChoice,
    pub metrics: BusinessMetrics,
    pub next_key: Option<String>,
    pub completed: bool,
    pub game_over: bool,
}

pub struct Session<G> {
    state: SessionState,
    resolver: Resolver<G>,
    rng: ChaCha8Rng,
    profile: Option<String>,
}

impl<G: ScenarioGenerator> Session<G> {
    pub fn new(repo: Arc<ScenarioRepository>, generator: G, seed: u64) -> Self {
        debug!(seed, "new session");
        Self {
            state: SessionState::new(),
            resolver: Resolver::new(repo, generator),
            rng: ChaCha8Rng::seed_from_u64(seed),
            profile: None,
        }
    }

    /// Business description passed to the generator, e.g. "pizza franchise
    /// in a college town". Blank profiles are ignored.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        let profile = profile.trim();
        self.profile = (!profile.is_empty()).then(|| profile.to_string());
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn metrics(&self) -> &BusinessMetrics {
        self.state.metrics()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn repository(&self) -> &ScenarioRepository {
        self.resolver.repository()
    }

    pub fn select_topic(&mut self, key: &str) -> Result<(), StateError> {
        self.state = engine::select_topic(&self.state, key)?;
        Ok(())
    }

    /// Resolve the scenario currently being presented. `None` when no topic
    /// has been selected.
    pub async fn current_scenario(&mut self) -> Option<Resolved> {
        let key = self.state.current_key()?.to_string();
        let resolved = self
            .resolver
            .resolve(
                &key,
                self.state.cache_mut(),
                self.profile.as_deref(),
                &mut self.rng,
            )
            .await;
        Some(resolved)
    }

    /// Resolve the current scenario and apply `choice` to it.
    pub async fn choose_branch(
        &mut self,
        choice: BranchChoice,
    ) -> Result<DecisionOutcome, StateError> {
        let phase = self.state.phase();
        let Some(resolved) = self.current_scenario().await else {
            return Err(StateError::WrongPhase {
                op: "choose_branch",
                phase,
            });
        };
        self.state = engine::choose_branch(
            &self.state,
            &resolved.record,
            choice,
            self.resolver.repository(),
            &mut self.rng,
        )?;
        let completed = self.state.is_completed();
        let outcome = DecisionOutcome {
            record: resolved.record,
            choice,
            metrics: *self.state.metrics(),
            next_key: (!completed)
                .then(|| self.state.current_key().map(str::to_string))
                .flatten(),
            completed,
            game_over: self.state.is_game_over(),
        };
        if completed {
            info!(
                decisions = self.state.history().len(),
                game_over = outcome.game_over,
                health = outcome.metrics.health(),
                "run finished"
            );
        }
        Ok(outcome)
    }

    pub fn set_impact_multiplier(&mut self, metric: MetricKind, factor: f64) -> Result<(), StateError> {
        self.state = engine::set_impact_multiplier(&self.state, metric, factor)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = engine::reset(&self.state);
    }

    pub async fn suggest_topics(&mut self, custom: Option<&str>) -> TopicSuggestions {
        summary::suggest_topics(
            self.resolver.generator(),
            self.profile.as_deref(),
            custom,
            &mut self.rng,
        )
        .await
    }

    pub async fn closing_analysis(&self) -> ClosingAnalysis {
        summary::closing_analysis(
            self.resolver.generator(),
            self.state.history(),
            self.state.metrics(),
            self.profile.as_deref(),
        )
        .await
    }
}

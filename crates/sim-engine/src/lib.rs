#![deny(warnings)]

//! Decision-state engine for Franchise Cockpit.
//!
//! The engine is a set of pure transitions over [`SessionState`]; the
//! [`Resolver`] turns scenario keys into records (repository, session cache,
//! generator, procedural fallback) and [`Session`] ties both together with a
//! seeded RNG for the front end. Nothing here touches the network: generation
//! goes through the [`ScenarioGenerator`] trait.

pub mod engine;
pub mod procedural;
pub mod resolver;
pub mod session;
pub mod state;
pub mod summary;

pub use engine::{choose_branch, next_scenario_key, reset, select_topic, set_impact_multiplier};
pub use resolver::{Resolved, Resolver, ScenarioSource};
pub use session::{DecisionOutcome, Session};
pub use state::SessionState;
pub use summary::{ClosingAnalysis, Provenance, TopicSuggestions};

use sim_core::{BusinessMetrics, DecisionRecord, GenerationError, ScenarioRecord};

/// External text generator used for custom scenarios, personalized topics and
/// the closing analysis. Every failure is recoverable by the caller.
#[allow(async_fn_in_trait)]
pub trait ScenarioGenerator {
    /// Generate a scenario for `topic`. The returned record's name is ignored;
    /// the resolver keys it by `topic`.
    async fn generate_scenario(
        &self,
        topic: &str,
        profile: Option<&str>,
    ) -> Result<ScenarioRecord, GenerationError>;

    /// Suggest scenario topics tailored to a business profile.
    async fn generate_topics(
        &self,
        profile: &str,
        custom_topic: Option<&str>,
    ) -> Result<Vec<String>, GenerationError>;

    /// Narrative analysis of a finished run.
    async fn generate_analysis(
        &self,
        history: &[DecisionRecord],
        metrics: &BusinessMetrics,
        profile: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Generator with no backend; every call reports [`GenerationError::Unavailable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineGenerator;

impl ScenarioGenerator for OfflineGenerator {
    async fn generate_scenario(
        &self,
        _topic: &str,
        _profile: Option<&str>,
    ) -> Result<ScenarioRecord, GenerationError> {
        Err(GenerationError::Unavailable("offline mode".into()))
    }

    async fn generate_topics(
        &self,
        _profile: &str,
        _custom_topic: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        Err(GenerationError::Unavailable("offline mode".into()))
    }

    async fn generate_analysis(
        &self,
        _history: &[DecisionRecord],
        _metrics: &BusinessMetrics,
        _profile: Option<&str>,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("offline mode".into()))
    }
}

#![deny(warnings)]

//! Hosted text generation for Franchise Cockpit scenarios, topics and the
//! closing analysis.

pub mod client;
pub mod config;
pub mod prompt;

pub use client::AnthropicClient;
pub use config::{ConfigurationError, GeneratorConfig};

use sim_core::{BusinessMetrics, DecisionRecord, GenerationError, ScenarioRecord};
use sim_engine::{OfflineGenerator, ScenarioGenerator};
use tracing::{info, warn};

/// The generator a front end runs with: the hosted client when configured,
/// otherwise offline.
#[derive(Debug, Clone)]
pub enum Generator {
    Anthropic(AnthropicClient),
    Offline(OfflineGenerator),
}

impl Generator {
    /// Build from `config`; configuration problems degrade to offline mode.
    pub fn from_config(config: Result<GeneratorConfig, ConfigurationError>) -> Self {
        match config.and_then(AnthropicClient::new) {
            Ok(client) => {
                info!(model = client.model_id(), "scenario generation enabled");
                Generator::Anthropic(client)
            }
            Err(e) => {
                warn!(error = %e, "scenario generation disabled, running offline");
                Generator::Offline(OfflineGenerator)
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Generator::Offline(_))
    }
}

impl ScenarioGenerator for Generator {
    async fn generate_scenario(
        &self,
        topic: &str,
        profile: Option<&str>,
    ) -> Result<ScenarioRecord, GenerationError> {
        match self {
            Generator::Anthropic(c) => c.generate_scenario(topic, profile).await,
            Generator::Offline(o) => o.generate_scenario(topic, profile).await,
        }
    }

    async fn generate_topics(
        &self,
        profile: &str,
        custom_topic: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        match self {
            Generator::Anthropic(c) => c.generate_topics(profile, custom_topic).await,
            Generator::Offline(o) => o.generate_topics(profile, custom_topic).await,
        }
    }

    async fn generate_analysis(
        &self,
        history: &[DecisionRecord],
        metrics: &BusinessMetrics,
        profile: Option<&str>,
    ) -> Result<String, GenerationError> {
        match self {
            Generator::Anthropic(c) => c.generate_analysis(history, metrics, profile).await,
            Generator::Offline(o) => o.generate_analysis(history, metrics, profile).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_runs_offline() {
        let g = Generator::from_config(Ok(GeneratorConfig::default()));
        assert!(g.is_offline());
        let g = Generator::from_config(Err(ConfigurationError::MissingApiKey));
        assert!(g.is_offline());
    }

    #[test]
    fn configured_key_enables_client() {
        let cfg = GeneratorConfig {
            api_key: Some("sk-test".into()),
            ..GeneratorConfig::default()
        };
        assert!(!Generator::from_config(Ok(cfg)).is_offline());
    }

    #[tokio::test]
    async fn offline_generator_reports_unavailable() {
        let g = Generator::Offline(OfflineGenerator);
        assert!(matches!(
            g.generate_scenario("Anything", None).await,
            Err(GenerationError::Unavailable(_))
        ));
    }
}

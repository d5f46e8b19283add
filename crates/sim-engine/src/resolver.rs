//! Scenario key → record resolution.

use crate::procedural::procedural_scenario;
use crate::ScenarioGenerator;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_content::{validate_generated, ScenarioRepository};
use sim_core::{GenerationError, ScenarioRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a resolved record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioSource {
    Repository,
    Cached,
    Generated,
    Fallback,
}

impl ScenarioSource {
    /// Procedurally synthesized after a generation failure; front ends
    /// surface this as a notice.
    pub fn is_fallback(self) -> bool {
        self == ScenarioSource::Fallback
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub record: ScenarioRecord,
    pub source: ScenarioSource,
}

pub struct Resolver<G> {
    repo: Arc<ScenarioRepository>,
    generator: G,
}

impl<G: ScenarioGenerator> Resolver<G> {
    pub fn new(repo: Arc<ScenarioRepository>, generator: G) -> Self {
        Self { repo, generator }
    }

    pub fn repository(&self) -> &ScenarioRepository {
        &self.repo
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Resolve `key`: repository first, then the session cache, then the
    /// generator. Generation failures of any kind are replaced by a
    /// procedural scenario. Generated and fallback records are cached under
    /// `key`, so each key reaches the generator at most once per session.
    pub async fn resolve<R: Rng + ?Sized>(
        &self,
        key: &str,
        cache: &mut BTreeMap<String, ScenarioRecord>,
        profile: Option<&str>,
        rng: &mut R,
    ) -> Resolved {
        if let Some(record) = self.repo.get(key) {
            return Resolved {
                record: record.clone(),
                source: ScenarioSource::Repository,
            };
        }
        if let Some(record) = cache.get(key) {
            debug!(key, "scenario served from session cache");
            return Resolved {
                record: record.clone(),
                source: ScenarioSource::Cached,
            };
        }

        let (record, source) = match self.generate(key, profile).await {
            Ok(record) => {
                info!(key, "generated scenario");
                (record, ScenarioSource::Generated)
            }
            Err(e) => {
                warn!(key, error = %e, "scenario generation failed, using procedural fallback");
                (
                    procedural_scenario(key, &self.repo, rng),
                    ScenarioSource::Fallback,
                )
            }
        };
        cache.insert(key.to_string(), record.clone());
        Resolved { record, source }
    }

    async fn generate(
        &self,
        key: &str,
        profile: Option<&str>,
    ) -> Result<ScenarioRecord, GenerationError> {
        let mut record = self.generator.generate_scenario(key, profile).await?;
        record.name = key.to_string();
        validate_generated(&record, &self.repo)?;
        Ok(record)
    }
}

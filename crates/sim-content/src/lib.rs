#![deny(warnings)]

//! Static scenario content for Franchise Cockpit.
//!
//! Provides:
//! - The hand-authored scenario repository, embedded at build time
//! - The suggested topic list and helpers for custom topics
//! - Schema checks applied to generated scenario records

use rand::seq::SliceRandom;
use rand::Rng;
use sim_core::{validate_record, ScenarioRecord, ValidationError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

const BUILTIN_SCENARIOS: &str = include_str!("../assets/scenarios.yaml");

/// Number of topics offered on the topic selection screen.
pub const DEFAULT_TOPIC_SAMPLE: usize = 6;

/// Suggested scenario topics, in authored order.
pub const FRANCHISE_TOPICS: [&str; 15] = [
    "Location Selection",
    "Hiring First Manager",
    "Marketing Campaign Launch",
    "Supply Chain Disruption",
    "Competitor Opening Nearby",
    "Customer Complaint Handling",
    "Expansion Opportunity",
    "Regulatory Changes",
    "Technology Upgrade",
    "Economic Downturn",
    "Customer Loyalty Program",
    "Staff Training Initiative",
    "Quality Control Issues",
    "Community Relations Event",
    "Lease Renewal Negotiation",
];

const TITLE_ADJECTIVES: [&str; 8] = [
    "Critical",
    "Strategic",
    "Unexpected",
    "Challenging",
    "Exciting",
    "Pivotal",
    "Emerging",
    "Urgent",
];

const TITLE_CONTEXTS: [&str; 8] = [
    "Decision",
    "Opportunity",
    "Challenge",
    "Situation",
    "Dilemma",
    "Crossroads",
    "Moment",
    "Development",
];

/// Errors loading a scenario table.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("scenario table is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scenario table: {0}")]
    Invalid(#[from] ValidationError),
    #[error("scenario table is empty")]
    Empty,
}

/// Read-only lookup of scenario key → record.
///
/// Never empty; keys are unique; iteration follows authored order.
#[derive(Clone, Debug)]
pub struct ScenarioRepository {
    records: Vec<ScenarioRecord>,
    index: BTreeMap<String, usize>,
}

impl ScenarioRepository {
    /// The embedded franchise scenario table.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_yaml(BUILTIN_SCENARIOS)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ContentError> {
        let records: Vec<ScenarioRecord> = serde_yaml::from_str(text)?;
        Self::from_records(records)
    }

    /// Build from records, validating each and rejecting duplicate keys.
    /// Suggested next keys are not checked here.
    pub fn from_records(records: Vec<ScenarioRecord>) -> Result<Self, ContentError> {
        if records.is_empty() {
            return Err(ContentError::Empty);
        }
        let mut index = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            validate_record(record)?;
            if index.insert(record.name.clone(), i).is_some() {
                return Err(ValidationError::DuplicateScenario(record.name.clone()).into());
            }
        }
        debug!(count = records.len(), "loaded scenario repository");
        Ok(Self { records, index })
    }

    pub fn get(&self, key: &str) -> Option<&ScenarioRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Scenario keys in authored order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Uniformly random key from the whole table.
    pub fn random_key<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let i = rng.gen_range(0..self.records.len());
        &self.records[i].name
    }

    /// Up to `n` distinct keys drawn without replacement.
    pub fn sample_keys<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<&str> {
        self.records
            .choose_multiple(rng, n)
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Schema check for a generated record: the record must be complete and every
/// suggested next scenario must exist in `repo`.
pub fn validate_generated(
    record: &ScenarioRecord,
    repo: &ScenarioRepository,
) -> Result<(), ValidationError> {
    validate_record(record)?;
    if let Some(next) = record.next_keys().find(|k| !repo.contains(k)) {
        return Err(ValidationError::UnknownNextScenario {
            scenario: record.name.clone(),
            next: next.to_string(),
        });
    }
    Ok(())
}

/// Up to `n` distinct suggested topics in random order.
pub fn sample_topics<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<String> {
    FRANCHISE_TOPICS
        .choose_multiple(rng, n)
        .map(|t| t.to_string())
        .collect()
}

/// Turn free text into a scenario key: trimmed, with each word capitalized
/// and the rest lowercased. Blank input yields `None`.
pub fn normalize_topic(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_alpha = false;
    for ch in trimmed.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    Some(out)
}

/// Headline such as "Pivotal Technology Upgrade Moment".
pub fn decorate_title<R: Rng + ?Sized>(base: &str, rng: &mut R) -> String {
    let adjective = TITLE_ADJECTIVES[rng.gen_range(0..TITLE_ADJECTIVES.len())];
    let context = TITLE_CONTEXTS[rng.gen_range(0..TITLE_CONTEXTS.len())];
    format!("{adjective} {base} {context}")
}

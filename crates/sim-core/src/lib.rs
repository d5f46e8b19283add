#![deny(warnings)]

//! Core domain models and invariants for Franchise Cockpit.
//!
//! This crate defines the serializable types shared by the simulator: the
//! four-metric business state and its bounded update rule, scenario records
//! with their two branches, the decision history entry, per-metric impact
//! multipliers, and the error taxonomy used across the workspace.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decisions in one simulation run.
pub const MAX_DECISIONS: usize = 5;

/// Cash reserve at which the cash component of the health score saturates.
pub const HEALTHY_CASH_FLOW: i64 = 100_000;

/// Lower bound of the percentage-style metrics.
pub const PERCENT_MIN: i32 = 0;
/// Upper bound of the percentage-style metrics.
pub const PERCENT_MAX: i32 = 100;

/// The four tracked business metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Cash reserves in dollars (unbounded).
    CashFlow,
    /// Customer satisfaction percentage.
    CustomerSatisfaction,
    /// Growth potential percentage.
    GrowthPotential,
    /// Risk level percentage (lower is better).
    RiskLevel,
}

impl MetricKind {
    /// All metrics in display order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::CashFlow,
        MetricKind::CustomerSatisfaction,
        MetricKind::GrowthPotential,
        MetricKind::RiskLevel,
    ];

    /// Wire name, e.g. `customer_satisfaction`.
    pub fn key(self) -> &'static str {
        match self {
            MetricKind::CashFlow => "cash_flow",
            MetricKind::CustomerSatisfaction => "customer_satisfaction",
            MetricKind::GrowthPotential => "growth_potential",
            MetricKind::RiskLevel => "risk_level",
        }
    }

    /// Human-readable label, e.g. `Customer Satisfaction`.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::CashFlow => "Cash Flow",
            MetricKind::CustomerSatisfaction => "Customer Satisfaction",
            MetricKind::GrowthPotential => "Growth Potential",
            MetricKind::RiskLevel => "Risk Level",
        }
    }

    /// Whether the metric is clamped into [0, 100].
    pub fn is_percentage(self) -> bool {
        !matches!(self, MetricKind::CashFlow)
    }

    /// Whether an increase is good news for the business.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, MetricKind::RiskLevel)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "cash_flow" | "cash" => Ok(MetricKind::CashFlow),
            "customer_satisfaction" | "satisfaction" => Ok(MetricKind::CustomerSatisfaction),
            "growth_potential" | "growth" => Ok(MetricKind::GrowthPotential),
            "risk_level" | "risk" => Ok(MetricKind::RiskLevel),
            _ => Err(ParseError::UnknownMetric(s.to_string())),
        }
    }
}

/// Four-metric business state.
///
/// `cash_flow` is never clamped; the other three fields stay in [0, 100]
/// after every [`apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessMetrics {
    /// Cash reserves in dollars; reaching zero or below ends the run.
    pub cash_flow: i64,
    /// Customer satisfaction in [0, 100].
    pub customer_satisfaction: i32,
    /// Growth potential in [0, 100].
    pub growth_potential: i32,
    /// Risk level in [0, 100].
    pub risk_level: i32,
}

impl BusinessMetrics {
    /// Starting values for every new run.
    pub const INITIAL: BusinessMetrics = BusinessMetrics {
        cash_flow: 100_000,
        customer_satisfaction: 50,
        growth_potential: 50,
        risk_level: 30,
    };

    /// Read one metric as a wide integer.
    pub fn get(&self, kind: MetricKind) -> i64 {
        match kind {
            MetricKind::CashFlow => self.cash_flow,
            MetricKind::CustomerSatisfaction => i64::from(self.customer_satisfaction),
            MetricKind::GrowthPotential => i64::from(self.growth_potential),
            MetricKind::RiskLevel => i64::from(self.risk_level),
        }
    }

    /// True once cash reserves are exhausted.
    pub fn is_bankrupt(&self) -> bool {
        self.cash_flow <= 0
    }

    /// Overall health score in [0, 100].
    pub fn health(&self) -> u8 {
        health(self)
    }

    /// Status tier for the current health score.
    pub fn status(&self) -> BusinessStatus {
        BusinessStatus::from_health(self.health())
    }
}

impl Default for BusinessMetrics {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Signed per-metric deltas applied when a branch is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequences {
    pub cash_flow: i64,
    pub customer_satisfaction: i32,
    pub growth_potential: i32,
    pub risk_level: i32,
}

impl Consequences {
    /// Read one delta as a wide integer.
    pub fn get(&self, kind: MetricKind) -> i64 {
        match kind {
            MetricKind::CashFlow => self.cash_flow,
            MetricKind::CustomerSatisfaction => i64::from(self.customer_satisfaction),
            MetricKind::GrowthPotential => i64::from(self.growth_potential),
            MetricKind::RiskLevel => i64::from(self.risk_level),
        }
    }

    /// Scale each delta by its multiplier, truncating toward zero.
    pub fn scaled(&self, multipliers: &ImpactMultipliers) -> Consequences {
        Consequences {
            cash_flow: scale(self.cash_flow, multipliers.cash_flow),
            customer_satisfaction: narrow(scale(
                i64::from(self.customer_satisfaction),
                multipliers.customer_satisfaction,
            )),
            growth_potential: narrow(scale(
                i64::from(self.growth_potential),
                multipliers.growth_potential,
            )),
            risk_level: narrow(scale(i64::from(self.risk_level), multipliers.risk_level)),
        }
    }
}

fn scale(delta: i64, factor: Decimal) -> i64 {
    (Decimal::from(delta) * factor)
        .trunc()
        .to_i64()
        .unwrap_or(delta)
}

fn narrow(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn clamp_percent(v: i32) -> i32 {
    v.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Apply consequences to metrics, returning the updated state.
///
/// The three percentage metrics are clamped into [0, 100]; out-of-range
/// results are truncated to the nearest bound. `cash_flow` is not clamped.
pub fn apply(consequences: &Consequences, metrics: &BusinessMetrics) -> BusinessMetrics {
    BusinessMetrics {
        cash_flow: metrics.cash_flow.saturating_add(consequences.cash_flow),
        customer_satisfaction: clamp_percent(
            metrics
                .customer_satisfaction
                .saturating_add(consequences.customer_satisfaction),
        ),
        growth_potential: clamp_percent(
            metrics
                .growth_potential
                .saturating_add(consequences.growth_potential),
        ),
        risk_level: clamp_percent(metrics.risk_level.saturating_add(consequences.risk_level)),
    }
}

/// Weighted health score in [0, 100].
///
/// 0.4 × min(cash / 100000, 1) + 0.3 × satisfaction + 0.2 × growth − 0.1 × risk,
/// with percentages taken as fractions, clamped to [0, 1] and scaled.
/// Halves round to even, so 60.5 scores 60.
pub fn health(metrics: &BusinessMetrics) -> u8 {
    let cash = (metrics.cash_flow as f64 / HEALTHY_CASH_FLOW as f64).min(1.0);
    let score = 0.4 * cash + 0.3 * (f64::from(metrics.customer_satisfaction) / 100.0)
        + 0.2 * (f64::from(metrics.growth_potential) / 100.0)
        - 0.1 * (f64::from(metrics.risk_level) / 100.0);
    (score.clamp(0.0, 1.0) * 100.0).round_ties_even() as u8
}

/// Five-tier classification of the health score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    Thriving,
    Stable,
    Challenged,
    Struggling,
    Critical,
}

impl BusinessStatus {
    pub fn from_health(score: u8) -> Self {
        match score {
            80..=u8::MAX => BusinessStatus::Thriving,
            60..=79 => BusinessStatus::Stable,
            40..=59 => BusinessStatus::Challenged,
            20..=39 => BusinessStatus::Struggling,
            _ => BusinessStatus::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusinessStatus::Thriving => "Thriving",
            BusinessStatus::Stable => "Stable",
            BusinessStatus::Challenged => "Challenged",
            BusinessStatus::Struggling => "Struggling",
            BusinessStatus::Critical => "Critical",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BusinessStatus::Thriving => {
                "Your franchise is in excellent condition with strong financials and growth."
            }
            BusinessStatus::Stable => "Your franchise is performing well with good prospects.",
            BusinessStatus::Challenged => {
                "Your franchise faces some challenges but remains viable."
            }
            BusinessStatus::Struggling => {
                "Your franchise is experiencing significant difficulties and needs attention."
            }
            BusinessStatus::Critical => {
                "Your franchise is in critical condition and at risk of failure."
            }
        }
    }
}

impl fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two outcomes of a scenario the user picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchChoice {
    BestCase,
    WorstCase,
}

impl BranchChoice {
    pub const ALL: [BranchChoice; 2] = [BranchChoice::BestCase, BranchChoice::WorstCase];

    pub fn key(self) -> &'static str {
        match self {
            BranchChoice::BestCase => "best_case",
            BranchChoice::WorstCase => "worst_case",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BranchChoice::BestCase => "Best Case",
            BranchChoice::WorstCase => "Worst Case",
        }
    }
}

impl fmt::Display for BranchChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BranchChoice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "best_case" | "best" | "b" => Ok(BranchChoice::BestCase),
            "worst_case" | "worst" | "w" => Ok(BranchChoice::WorstCase),
            _ => Err(ParseError::UnknownChoice(s.to_string())),
        }
    }
}

/// One selectable outcome of a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Short title, e.g. "Prime Commercial Area".
    pub title: String,
    /// One or two sentences describing the approach.
    pub description: String,
    /// Deltas applied when this branch is chosen.
    pub consequences: Consequences,
    /// Suggested successor scenario keys; may name unknown scenarios.
    pub next_scenarios: Vec<String>,
}

/// A decision point with its two branches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario key, also used as the display title.
    pub name: String,
    pub description: String,
    pub best_case: Branch,
    pub worst_case: Branch,
}

impl ScenarioRecord {
    pub fn branch(&self, choice: BranchChoice) -> &Branch {
        match choice {
            BranchChoice::BestCase => &self.best_case,
            BranchChoice::WorstCase => &self.worst_case,
        }
    }

    /// All suggested successor keys across both branches.
    pub fn next_keys(&self) -> impl Iterator<Item = &str> {
        self.best_case
            .next_scenarios
            .iter()
            .chain(self.worst_case.next_scenarios.iter())
            .map(String::as_str)
    }
}

/// Immutable history entry for one decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Key of the scenario the decision was taken on.
    pub scenario: String,
    pub choice: BranchChoice,
    /// Title of the chosen branch.
    pub title: String,
    /// Consequences as applied, after impact multipliers.
    pub consequences: Consequences,
}

/// Per-metric factors applied to consequences before they are recorded.
///
/// Factors live on a 0.1 grid in [0.0, 2.0] and default to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactMultipliers {
    cash_flow: Decimal,
    customer_satisfaction: Decimal,
    growth_potential: Decimal,
    risk_level: Decimal,
}

impl ImpactMultipliers {
    pub const MIN: Decimal = Decimal::ZERO;
    pub const MAX: Decimal = Decimal::TWO;

    pub fn get(&self, kind: MetricKind) -> Decimal {
        match kind {
            MetricKind::CashFlow => self.cash_flow,
            MetricKind::CustomerSatisfaction => self.customer_satisfaction,
            MetricKind::GrowthPotential => self.growth_potential,
            MetricKind::RiskLevel => self.risk_level,
        }
    }

    /// Store a factor snapped to the 0.1 grid and clamped into range.
    /// Returns the value actually stored.
    pub fn set(&mut self, kind: MetricKind, factor: Decimal) -> Decimal {
        let snapped = factor
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .clamp(Self::MIN, Self::MAX);
        let slot = match kind {
            MetricKind::CashFlow => &mut self.cash_flow,
            MetricKind::CustomerSatisfaction => &mut self.customer_satisfaction,
            MetricKind::GrowthPotential => &mut self.growth_potential,
            MetricKind::RiskLevel => &mut self.risk_level,
        };
        *slot = snapped;
        snapped
    }

    /// Like [`ImpactMultipliers::set`] but from a float slider value.
    pub fn set_f64(&mut self, kind: MetricKind, factor: f64) -> Result<Decimal, StateError> {
        if !factor.is_finite() {
            return Err(StateError::NonFiniteMultiplier(factor));
        }
        let dec = Decimal::from_f64(factor).ok_or(StateError::NonFiniteMultiplier(factor))?;
        Ok(self.set(kind, dec))
    }

    /// True when every factor is exactly 1.0.
    pub fn is_neutral(&self) -> bool {
        MetricKind::ALL.iter().all(|k| self.get(*k) == Decimal::ONE)
    }
}

impl Default for ImpactMultipliers {
    fn default() -> Self {
        Self {
            cash_flow: Decimal::ONE,
            customer_satisfaction: Decimal::ONE,
            growth_potential: Decimal::ONE,
            risk_level: Decimal::ONE,
        }
    }
}

/// Lifecycle phase of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No topic chosen yet.
    SelectingTopic,
    /// A scenario is awaiting a branch choice.
    InScenario,
    /// Decision budget spent or cash exhausted.
    Completed,
}

/// Errors parsing user-facing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),
    #[error("unknown branch choice `{0}`")]
    UnknownChoice(String),
}

/// Schema violations of scenario records.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// Scenario key is blank.
    #[error("scenario name must not be empty")]
    EmptyName,
    /// Scenario description is blank.
    #[error("scenario `{0}` has an empty description")]
    EmptyDescription(String),
    /// A branch title or description is blank.
    #[error("{choice} branch of `{scenario}` is missing its title or description")]
    EmptyBranch {
        scenario: String,
        choice: BranchChoice,
    },
    /// Two records share a key.
    #[error("duplicate scenario `{0}`")]
    DuplicateScenario(String),
    /// A generated record references a successor that does not exist.
    #[error("`{scenario}` suggests unknown next scenario `{next}`")]
    UnknownNextScenario { scenario: String, next: String },
}

/// Validate the shape of a single record (non-empty text everywhere).
pub fn validate_record(record: &ScenarioRecord) -> Result<(), ValidationError> {
    if record.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if record.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription(record.name.clone()));
    }
    for choice in BranchChoice::ALL {
        let b = record.branch(choice);
        if b.title.trim().is_empty() || b.description.trim().is_empty() {
            return Err(ValidationError::EmptyBranch {
                scenario: record.name.clone(),
                choice,
            });
        }
    }
    Ok(())
}

/// Failures reported by a scenario/topic/analysis generator.
///
/// All of these are recoverable: callers fall back to local content.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No backend configured (e.g. offline mode, missing credentials).
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    /// Transport failure or timeout.
    #[error("request failed: {0}")]
    Request(String),
    /// Credentials rejected by the backend.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Non-success HTTP status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Payload could not be parsed into the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Payload parsed but violates the scenario schema.
    #[error("schema violation: {0}")]
    Schema(#[from] ValidationError),
}

/// Engine transitions invoked outside their valid phase.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("`{op}` is not valid while {phase:?}")]
    WrongPhase { op: &'static str, phase: Phase },
    #[error("scenario `{given}` is not the current scenario `{expected}`")]
    ScenarioMismatch { expected: String, given: String },
    #[error("impact multiplier must be finite, got {0}")]
    NonFiniteMultiplier(f64),
    #[error("topic must not be empty")]
    EmptyTopic,
}

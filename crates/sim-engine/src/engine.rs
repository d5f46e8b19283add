//! Pure state transitions: each takes the current state and an input and
//! returns the next state.

use crate::state::SessionState;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sim_content::ScenarioRepository;
use sim_core::{
    apply, BranchChoice, DecisionRecord, MetricKind, Phase, ScenarioRecord, StateError,
    MAX_DECISIONS,
};
use tracing::{debug, info, warn};

/// Start a run on `key`. Resolution is deferred until the scenario is shown.
pub fn select_topic(state: &SessionState, key: &str) -> Result<SessionState, StateError> {
    let phase = state.phase();
    if phase != Phase::SelectingTopic {
        return Err(StateError::WrongPhase {
            op: "select_topic",
            phase,
        });
    }
    let key = key.trim();
    if key.is_empty() {
        return Err(StateError::EmptyTopic);
    }
    let mut next = state.clone();
    next.current_key = Some(key.to_string());
    next.step = 1;
    info!(topic = key, "topic selected");
    Ok(next)
}

/// Record and apply the chosen branch of `scenario`, then either finish the
/// run or move on to a successor scenario.
///
/// The run completes after [`MAX_DECISIONS`] decisions or as soon as cash
/// flow drops to zero or below.
pub fn choose_branch<R: Rng + ?Sized>(
    state: &SessionState,
    scenario: &ScenarioRecord,
    choice: BranchChoice,
    repo: &ScenarioRepository,
    rng: &mut R,
) -> Result<SessionState, StateError> {
    let phase = state.phase();
    if phase != Phase::InScenario {
        return Err(StateError::WrongPhase {
            op: "choose_branch",
            phase,
        });
    }
    let current = state.current_key().unwrap_or_default();
    if scenario.name != current {
        return Err(StateError::ScenarioMismatch {
            expected: current.to_string(),
            given: scenario.name.clone(),
        });
    }

    let branch = scenario.branch(choice);
    let applied = branch.consequences.scaled(&state.multipliers);
    let mut next = state.clone();
    next.history.push(DecisionRecord {
        scenario: scenario.name.clone(),
        choice,
        title: branch.title.clone(),
        consequences: applied,
    });
    next.metrics = apply(&applied, &state.metrics);
    info!(
        scenario = %scenario.name,
        choice = %choice,
        cash_flow = next.metrics.cash_flow,
        health = next.metrics.health(),
        "decision applied"
    );

    if next.history.len() >= MAX_DECISIONS {
        next.completed = true;
        info!(decisions = next.history.len(), "decision budget spent");
        return Ok(next);
    }
    if next.metrics.is_bankrupt() {
        next.completed = true;
        warn!(cash_flow = next.metrics.cash_flow, "cash exhausted, run over");
        return Ok(next);
    }

    let key = next_scenario_key(&branch.next_scenarios, repo, rng);
    debug!(next = %key, "advancing");
    next.current_key = Some(key);
    next.step += 1;
    Ok(next)
}

/// Uniform pick among the suggestions that exist in `repo`, else a uniform
/// pick from the whole repository.
pub fn next_scenario_key<R: Rng + ?Sized>(
    suggestions: &[String],
    repo: &ScenarioRepository,
    rng: &mut R,
) -> String {
    let valid: Vec<&String> = suggestions.iter().filter(|k| repo.contains(k)).collect();
    match valid.choose(rng) {
        Some(k) => (*k).clone(),
        None => {
            debug!(?suggestions, "no usable suggestion, drawing from repository");
            repo.random_key(rng).to_string()
        }
    }
}

/// Set one impact multiplier. Allowed in any phase; the factor persists
/// across decisions until changed or reset.
pub fn set_impact_multiplier(
    state: &SessionState,
    metric: MetricKind,
    factor: f64,
) -> Result<SessionState, StateError> {
    let mut next = state.clone();
    let stored: Decimal = next.multipliers.set_f64(metric, factor)?;
    debug!(metric = %metric, %stored, "impact multiplier set");
    Ok(next)
}

/// Back to a fresh run: initial metrics, no history, empty cache, neutral
/// multipliers.
pub fn reset(state: &SessionState) -> SessionState {
    debug!(step = state.step, decisions = state.history.len(), "reset");
    SessionState::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sim_core::{BusinessMetrics, Consequences};

    fn repo() -> ScenarioRepository {
        ScenarioRepository::builtin().unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn deltas(cash: i64, sat: i32, growth: i32, risk: i32) -> Consequences {
        Consequences {
            cash_flow: cash,
            customer_satisfaction: sat,
            growth_potential: growth,
            risk_level: risk,
        }
    }

    /// Choose `choice` on whatever the current repository scenario is.
    fn step(
        state: &SessionState,
        repo: &ScenarioRepository,
        choice: BranchChoice,
        rng: &mut ChaCha8Rng,
    ) -> SessionState {
        let key = state.current_key().unwrap().to_string();
        let scenario = repo.get(&key).unwrap().clone();
        choose_branch(state, &scenario, choice, repo, rng).unwrap()
    }

    #[test]
    fn location_selection_worst_case() {
        let repo = repo();
        let mut rng = rng();
        let s0 = SessionState::new();
        assert_eq!(s0.phase(), Phase::SelectingTopic);

        let s1 = select_topic(&s0, "Location Selection").unwrap();
        assert_eq!(s1.phase(), Phase::InScenario);
        assert_eq!(s1.step(), 1);

        let s2 = step(&s1, &repo, BranchChoice::WorstCase, &mut rng);
        assert_eq!(
            *s2.metrics(),
            BusinessMetrics {
                cash_flow: 95_000,
                customer_satisfaction: 45,
                growth_potential: 55,
                risk_level: 20
            }
        );
        assert_eq!(s2.step(), 2);
        assert_eq!(s2.history().len(), 1);
        assert_eq!(s2.history()[0].title, "Budget-Friendly Location");
        assert_eq!(s2.history()[0].choice, BranchChoice::WorstCase);
        let next = s2.current_key().unwrap();
        assert!(next == "Hiring First Manager" || next == "Marketing Campaign Launch");
        // The input state is untouched.
        assert_eq!(s1.history().len(), 0);
    }

    #[test]
    fn fifth_decision_completes_run() {
        let repo = repo();
        let mut rng = rng();
        let mut s = select_topic(&SessionState::new(), "Customer Loyalty Program").unwrap();
        for i in 0..MAX_DECISIONS {
            assert!(!s.is_completed(), "completed early at decision {i}");
            s = step(&s, &repo, BranchChoice::WorstCase, &mut rng);
        }
        assert!(s.is_completed());
        assert_eq!(s.phase(), Phase::Completed);
        assert_eq!(s.history().len(), MAX_DECISIONS);
        assert_eq!(s.decisions_left(), 0);
        assert!(s.metrics().cash_flow > 0);
        assert!(matches!(
            choose_branch(
                &s,
                repo.get(s.current_key().unwrap()).unwrap(),
                BranchChoice::BestCase,
                &repo,
                &mut rng
            ),
            Err(StateError::WrongPhase { .. })
        ));
    }

    #[test]
    fn bankruptcy_completes_early() {
        let repo = repo();
        let mut rng = rng();
        let s = select_topic(&SessionState::new(), "Expansion Opportunity").unwrap();
        // Aggressive expansion costs the whole starting cash.
        let s = step(&s, &repo, BranchChoice::BestCase, &mut rng);
        assert_eq!(s.metrics().cash_flow, 0);
        assert!(s.is_game_over());
        assert!(s.is_completed());
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.step(), 1);
    }

    #[test]
    fn unknown_suggestions_fall_back_to_repository() {
        let repo = repo();
        let mut rng = rng();
        let custom = record(
            "Drive-Thru Pilot",
            deltas(-1000, 1, 1, 1),
            deltas(-500, 0, 0, 0),
            &["Moon Base", "Space Elevator"],
        );
        let s = select_topic(&SessionState::new(), "Drive-Thru Pilot").unwrap();
        let s = choose_branch(&s, &custom, BranchChoice::BestCase, &repo, &mut rng).unwrap();
        let key = s.current_key().unwrap();
        assert!(repo.contains(key));
        assert_eq!(s.step(), 2);
    }

    #[test]
    fn mismatched_scenario_rejected() {
        let repo = repo();
        let mut rng = rng();
        let s = select_topic(&SessionState::new(), "Location Selection").unwrap();
        let other = repo.get("Technology Upgrade").unwrap();
        assert_eq!(
            choose_branch(&s, other, BranchChoice::BestCase, &repo, &mut rng),
            Err(StateError::ScenarioMismatch {
                expected: "Location Selection".to_string(),
                given: "Technology Upgrade".to_string()
            })
        );
    }

    #[test]
    fn select_topic_guards() {
        let s = SessionState::new();
        assert_eq!(select_topic(&s, "   "), Err(StateError::EmptyTopic));
        let s = select_topic(&s, "Location Selection").unwrap();
        assert_eq!(
            select_topic(&s, "Technology Upgrade"),
            Err(StateError::WrongPhase {
                op: "select_topic",
                phase: Phase::InScenario
            })
        );
    }

    #[test]
    fn multipliers_scale_recorded_and_applied_consequences() {
        let repo = repo();
        let mut rng = rng();
        let s = set_impact_multiplier(&SessionState::new(), MetricKind::CashFlow, 1.5).unwrap();
        let s = set_impact_multiplier(&s, MetricKind::RiskLevel, 0.5).unwrap();
        let s = select_topic(&s, "Location Selection").unwrap();
        let s = step(&s, &repo, BranchChoice::WorstCase, &mut rng);
        let applied = s.history()[0].consequences;
        assert_eq!(applied, deltas(-7500, -5, 5, -5));
        assert_eq!(s.metrics().cash_flow, 92_500);
        assert_eq!(s.metrics().risk_level, 25);
        // Factors persist into the next decision.
        assert_eq!(s.multipliers().get(MetricKind::CashFlow), Decimal::new(15, 1));
        assert!(set_impact_multiplier(&s, MetricKind::CashFlow, f64::INFINITY).is_err());
    }

    #[test]
    fn reset_restores_initial_state() {
        let repo = repo();
        let mut rng = rng();
        let s = set_impact_multiplier(&SessionState::new(), MetricKind::GrowthPotential, 2.0).unwrap();
        let mut s = select_topic(&s, "Location Selection").unwrap();
        s.cache_mut().insert(
            "Custom".to_string(),
            record("Custom", deltas(0, 0, 0, 0), deltas(0, 0, 0, 0), &[]),
        );
        let s = step(&s, &repo, BranchChoice::BestCase, &mut rng);
        let fresh = reset(&s);
        assert_eq!(*fresh.metrics(), BusinessMetrics::INITIAL);
        assert!(fresh.history().is_empty());
        assert!(fresh.generated().is_empty());
        assert!(fresh.multipliers().is_neutral());
        assert_eq!(fresh.step(), 0);
        assert_eq!(fresh.current_key(), None);
        assert!(!fresh.is_completed());
        assert_eq!(reset(&fresh), fresh);
    }

    proptest! {
        #[test]
        fn next_key_is_always_in_repository(seed in any::<u64>(), junk in "[a-z]{1,12}") {
            let repo = repo();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let key = next_scenario_key(&[junk], &repo, &mut rng);
            prop_assert!(repo.contains(&key));

            let key = next_scenario_key(&[], &repo, &mut rng);
            prop_assert!(repo.contains(&key));

            let picks = ["Economic Downturn".to_string(), "Nowhere".to_string()];
            prop_assert_eq!(next_scenario_key(&picks, &repo, &mut rng), "Economic Downturn");
        }

        #[test]
        fn random_walk_respects_invariants(seed in any::<u64>(), choices in proptest::collection::vec(any::<bool>(), 5)) {
            let repo = repo();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut s = select_topic(&SessionState::new(), repo.random_key(&mut rng)).unwrap();
            for best in choices {
                if s.is_completed() {
                    break;
                }
                let choice = if best { BranchChoice::BestCase } else { BranchChoice::WorstCase };
                s = step(&s, &repo, choice, &mut rng);
                let m = s.metrics();
                prop_assert!((0..=100).contains(&m.customer_satisfaction));
                prop_assert!((0..=100).contains(&m.growth_potential));
                prop_assert!((0..=100).contains(&m.risk_level));
                if !s.is_completed() {
                    prop_assert!(repo.contains(s.current_key().unwrap()));
                    prop_assert_eq!(s.step() as usize, s.history().len() + 1);
                }
            }
            prop_assert!(s.is_completed());
        }
    }
}

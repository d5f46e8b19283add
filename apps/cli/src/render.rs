//! Plain-text screens.

use sim_core::{BusinessMetrics, Consequences, DecisionRecord, MetricKind, ScenarioRecord};
use sim_engine::summary::{describe_impact, format_cash};
use sim_engine::SessionState;

const RULE: &str = "------------------------------------------------------------";

fn signed_cash(delta: i64) -> String {
    if delta >= 0 {
        format!("+{}", format_cash(delta))
    } else {
        format_cash(delta)
    }
}

fn delta(kind: MetricKind, value: i64) -> String {
    if kind.is_percentage() {
        format!("{value:+}%")
    } else {
        signed_cash(value)
    }
}

pub fn dashboard(metrics: &BusinessMetrics) {
    let status = metrics.status();
    println!("{RULE}");
    println!(
        "Cash Flow: {} | Satisfaction: {}% | Growth: {}% | Risk: {}%",
        format_cash(metrics.cash_flow),
        metrics.customer_satisfaction,
        metrics.growth_potential,
        metrics.risk_level
    );
    println!("Health: {}/100 ({}) {}", metrics.health(), status.label(), status.description());
    println!("{RULE}");
}

pub fn consequences_line(c: &Consequences) -> String {
    MetricKind::ALL
        .iter()
        .map(|&k| format!("{} {}", k.label(), delta(k, c.get(k))))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn scenario(headline: &str, step: u32, record: &ScenarioRecord, fallback: bool) {
    println!();
    println!("Decision {step}: {headline}");
    if fallback {
        println!("(Scenario generation was unavailable; this scenario was assembled locally.)");
    }
    println!("{}", record.description);
    println!();
    println!("  [b] {}: {}", record.best_case.title, record.best_case.description);
    println!("      {}", consequences_line(&record.best_case.consequences));
    println!("  [w] {}: {}", record.worst_case.title, record.worst_case.description);
    println!("      {}", consequences_line(&record.worst_case.consequences));
}

pub fn decision(record: &DecisionRecord) {
    println!();
    println!("You chose: {} ({})", record.title, record.choice.label());
    println!("  {}", consequences_line(&record.consequences));
    println!("  {}", describe_impact(&record.consequences));
}

pub fn summary(state: &SessionState) {
    println!();
    println!("=== Simulation complete ===");
    if state.is_game_over() {
        println!("Your franchise ran out of cash.");
    }
    dashboard(state.metrics());
    for (i, d) in state.history().iter().enumerate() {
        println!("{}. {}: {} ({})", i + 1, d.scenario, d.title, d.choice.label());
        println!("   {}", describe_impact(&d.consequences));
    }
}

pub fn multipliers(state: &SessionState) {
    let m = state.multipliers();
    let parts: Vec<String> = MetricKind::ALL
        .iter()
        .map(|&k| format!("{} x{}", k.key(), m.get(k)))
        .collect();
    println!("Impact multipliers: {}", parts.join(", "));
}

pub fn help() {
    println!("Commands: b | w | m <metric> <factor> | multipliers | reset | quit");
    println!("Metrics: cash, satisfaction, growth, risk. Factors range 0.0-2.0 in 0.1 steps.");
}

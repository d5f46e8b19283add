use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_ai::prompt::{parse_scenario, scenario_prompt};

const REPLY: &str = r#"Here is the scenario you asked for:
{
  "description": "A regional mall offers you a kiosk at a steep discount.",
  "best_case": {
    "title": "Open a Branded Kiosk",
    "description": "Staff the kiosk full-time with a custom build-out.",
    "consequences": {"cash_flow": -18000, "customer_satisfaction": 8, "growth_potential": 18, "risk_level": 6},
    "next_scenarios": ["Hiring First Manager", "Marketing Campaign Launch"]
  },
  "worst_case": {
    "title": "Weekend Pop-Up Only",
    "description": "Run the kiosk on weekends with existing staff.",
    "consequences": {"cash_flow": -2500, "customer_satisfaction": 2, "growth_potential": 4, "risk_level": -2},
    "next_scenarios": ["Staff Training Initiative"]
  }
}"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_generated_scenario", |b| {
        b.iter(|| parse_scenario(black_box(REPLY), "Mall Kiosk").map(|r| r.best_case.consequences))
    });
    c.bench_function("build_scenario_prompt", |b| {
        b.iter(|| scenario_prompt(black_box("Mall Kiosk"), Some("smoothie franchise")).len())
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);

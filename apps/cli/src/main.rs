#![deny(warnings)]

//! Terminal front end: pick a topic, make five decisions, read the verdict.

mod render;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use sim_ai::{Generator, GeneratorConfig};
use sim_content::{decorate_title, normalize_topic, ScenarioRepository};
use sim_core::{BranchChoice, BusinessMetrics, BusinessStatus, Consequences, MetricKind};
use sim_engine::{ClosingAnalysis, OfflineGenerator, Session, SessionState};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Auto mode picks the ambitious branch only if it leaves at least this much cash.
const AUTO_CASH_FLOOR: i64 = 20_000;

#[derive(Debug, Default)]
struct Args {
    seed: Option<u64>,
    profile: Option<String>,
    topic: Option<String>,
    config: Option<String>,
    auto: bool,
    json: bool,
    offline: bool,
    help: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--profile" => args.profile = it.next(),
            "--topic" => args.topic = it.next(),
            "--config" => args.config = it.next(),
            "--auto" => args.auto = true,
            "--json" => args.json = true,
            "--offline" => args.offline = true,
            "--help" | "-h" => args.help = true,
            _ => {}
        }
    }
    args
}

fn usage() {
    println!("franchise-cockpit [--seed N] [--profile TEXT] [--topic TEXT] [--auto] [--json] [--offline] [--config FILE]");
    println!();
    println!("  --seed N        reproducible run");
    println!("  --profile TEXT  describe your business for tailored scenarios");
    println!("  --topic TEXT    skip topic selection");
    println!("  --auto          play automatically");
    println!("  --json          print the final session as JSON");
    println!("  --offline       never call the scenario generator");
    println!("  --config FILE   generator settings (YAML)");
}

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{label}> ");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|l| l.trim().to_string()))
}

#[derive(Serialize)]
struct RunReport<'a> {
    seed: u64,
    health: u8,
    status: BusinessStatus,
    analysis: Option<&'a ClosingAnalysis>,
    session: &'a SessionState,
}

enum Flow {
    Finished,
    Restart,
    Quit,
}

async fn finish(session: &Session<Generator>) -> ClosingAnalysis {
    render::summary(session.state());
    let analysis = session.closing_analysis().await;
    println!();
    println!("Analysis:");
    println!("{}", analysis.text);
    analysis
}

/// Ambitious branch unless it would drop cash below the floor.
fn auto_choice(metrics: &BusinessMetrics, best: &Consequences) -> BranchChoice {
    if metrics.cash_flow.saturating_add(best.cash_flow) >= AUTO_CASH_FLOOR {
        BranchChoice::BestCase
    } else {
        BranchChoice::WorstCase
    }
}

async fn run_auto(session: &mut Session<Generator>, topic: Option<&str>) -> Result<ClosingAnalysis> {
    let topic = match topic.and_then(normalize_topic) {
        Some(t) => t,
        None => session
            .suggest_topics(None)
            .await
            .topics
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no topics available"))?,
    };
    session.select_topic(&topic)?;
    while !session.state().is_completed() {
        let resolved = session
            .current_scenario()
            .await
            .context("no scenario to resolve")?;
        let best = resolved
            .record
            .best_case
            .consequences
            .scaled(session.state().multipliers());
        let choice = auto_choice(session.metrics(), &best);
        render::scenario(
            &resolved.record.name,
            session.state().step(),
            &resolved.record,
            resolved.source.is_fallback(),
        );
        session.choose_branch(choice).await?;
        if let Some(last) = session.state().history().last() {
            render::decision(last);
        }
    }
    Ok(finish(session).await)
}

#[derive(Debug, PartialEq)]
enum MenuAction {
    Refresh,
    Quit,
    Select(String),
    Custom(String),
    Unknown(usize),
}

/// Reads one line of the topic menu against the topics currently shown.
fn menu_action(topics: &[String], line: &str) -> Option<MenuAction> {
    let line = line.trim();
    match line {
        "" => return None,
        "r" => return Some(MenuAction::Refresh),
        "q" | "quit" => return Some(MenuAction::Quit),
        _ => {}
    }
    if let Ok(n) = line.parse::<usize>() {
        return Some(match topics.get(n.wrapping_sub(1)) {
            Some(t) => MenuAction::Select(t.clone()),
            None => MenuAction::Unknown(n),
        });
    }
    normalize_topic(line).map(MenuAction::Custom)
}

async fn choose_topic(session: &mut Session<Generator>, input: &mut Input) -> Result<Option<String>> {
    let mut topics = session.suggest_topics(None).await.topics;
    loop {
        println!();
        println!("Choose a topic by number, type your own to list it with related topics, or [r] for different topics:");
        for (i, t) in topics.iter().enumerate() {
            println!("  {}. {t}", i + 1);
        }
        let Some(line) = prompt(input, "topic").await? else {
            return Ok(None);
        };
        match menu_action(&topics, &line) {
            None => {}
            Some(MenuAction::Quit) => return Ok(None),
            Some(MenuAction::Select(t)) => return Ok(Some(t)),
            Some(MenuAction::Refresh) => topics = session.suggest_topics(None).await.topics,
            Some(MenuAction::Unknown(n)) => println!("No topic numbered {n}."),
            Some(MenuAction::Custom(t)) => {
                // Own topic goes first, followed by related suggestions.
                topics = session.suggest_topics(Some(t.as_str())).await.topics;
            }
        }
    }
}

async fn play_scenarios(session: &mut Session<Generator>, input: &mut Input) -> Result<Flow> {
    let mut rng = rand::thread_rng();
    let mut shown: Option<String> = None;
    while !session.state().is_completed() {
        let resolved = session
            .current_scenario()
            .await
            .context("no scenario to resolve")?;
        if shown.as_deref() != Some(resolved.record.name.as_str()) {
            render::dashboard(session.metrics());
            println!("Decisions left: {}", session.state().decisions_left());
            render::scenario(
                &decorate_title(&resolved.record.name, &mut rng),
                session.state().step(),
                &resolved.record,
                resolved.source.is_fallback(),
            );
            shown = Some(resolved.record.name.clone());
        }

        let Some(line) = prompt(input, "decision").await? else {
            return Ok(Flow::Quit);
        };
        let mut words = line.split_whitespace();
        match words.next().unwrap_or_default() {
            "q" | "quit" => return Ok(Flow::Quit),
            "reset" => {
                session.reset();
                return Ok(Flow::Restart);
            }
            "?" | "help" => render::help(),
            "multipliers" => render::multipliers(session.state()),
            "m" => {
                let metric = words.next().map(str::parse::<MetricKind>);
                let factor = words.next().map(str::parse::<f64>);
                match (metric, factor) {
                    (Some(Ok(metric)), Some(Ok(factor))) => {
                        match session.set_impact_multiplier(metric, factor) {
                            Ok(()) => render::multipliers(session.state()),
                            Err(e) => println!("{e}"),
                        }
                    }
                    _ => println!("Usage: m <cash|satisfaction|growth|risk> <factor>"),
                }
            }
            other => match other.parse::<BranchChoice>() {
                Ok(choice) => {
                    session.choose_branch(choice).await?;
                    if let Some(last) = session.state().history().last() {
                        render::decision(last);
                    }
                }
                Err(_) => render::help(),
            },
        }
    }
    Ok(Flow::Finished)
}

async fn run_interactive(
    session: &mut Session<Generator>,
    topic: Option<&str>,
) -> Result<Option<ClosingAnalysis>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut preset = topic.and_then(normalize_topic);
    loop {
        render::dashboard(session.metrics());
        let topic = match preset.take() {
            Some(t) => t,
            None => match choose_topic(session, &mut input).await? {
                Some(t) => t,
                None => return Ok(None),
            },
        };
        session.select_topic(&topic)?;
        render::help();

        match play_scenarios(session, &mut input).await? {
            Flow::Quit => return Ok(None),
            Flow::Restart => continue,
            Flow::Finished => {}
        }
        let analysis = finish(session).await;
        match prompt(&mut input, "play again? [y/n]").await?.as_deref() {
            Some("y") | Some("yes") => session.reset(),
            _ => return Ok(Some(analysis)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup; stdout belongs to the game.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if args.help {
        usage();
        return Ok(());
    }
    println!(
        "Franchise Cockpit {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA"),
        env!("BUILD_DATE")
    );

    let repo = Arc::new(ScenarioRepository::builtin()?);
    let generator = if args.offline {
        Generator::Offline(OfflineGenerator)
    } else {
        let config = match &args.config {
            Some(path) => GeneratorConfig::from_yaml_file(path),
            None => GeneratorConfig::from_env(),
        };
        Generator::from_config(config)
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, offline = generator.is_offline(), auto = args.auto, "starting session");

    let mut session = Session::new(repo, generator, seed);
    if let Some(profile) = &args.profile {
        session = session.with_profile(profile.as_str());
    }

    let analysis = if args.auto {
        Some(run_auto(&mut session, args.topic.as_deref()).await?)
    } else {
        run_interactive(&mut session, args.topic.as_deref()).await?
    };

    if args.json {
        let metrics = session.metrics();
        let report = RunReport {
            seed,
            health: metrics.health(),
            status: metrics.status(),
            analysis: analysis.as_ref(),
            session: session.state(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Vec<String> {
        vec!["Drive-Thru Pilot".to_string(), "Loyalty App".to_string()]
    }

    #[test]
    fn auto_choice_respects_cash_floor() {
        let mut best = Consequences {
            cash_flow: -80_000,
            ..Consequences::default()
        };
        assert_eq!(auto_choice(&BusinessMetrics::INITIAL, &best), BranchChoice::BestCase);
        best.cash_flow = -80_001;
        assert_eq!(auto_choice(&BusinessMetrics::INITIAL, &best), BranchChoice::WorstCase);
    }

    #[test]
    fn auto_choice_survives_extreme_deltas() {
        let best = Consequences {
            cash_flow: i64::MAX,
            ..Consequences::default()
        };
        assert_eq!(auto_choice(&BusinessMetrics::INITIAL, &best), BranchChoice::BestCase);
        let worst = Consequences {
            cash_flow: i64::MIN,
            ..Consequences::default()
        };
        assert_eq!(auto_choice(&BusinessMetrics::INITIAL, &worst), BranchChoice::WorstCase);
    }

    #[test]
    fn menu_numbers_index_shown_topics() {
        let shown = topics();
        assert_eq!(
            menu_action(&shown, "2"),
            Some(MenuAction::Select("Loyalty App".into()))
        );
        assert_eq!(menu_action(&shown, "0"), Some(MenuAction::Unknown(0)));
        assert_eq!(menu_action(&shown, "9"), Some(MenuAction::Unknown(9)));
    }

    #[test]
    fn menu_text_becomes_custom_topic() {
        let shown = topics();
        assert_eq!(
            menu_action(&shown, "  catering contract "),
            Some(MenuAction::Custom("Catering Contract".into()))
        );
        assert_eq!(menu_action(&shown, "r"), Some(MenuAction::Refresh));
        assert_eq!(menu_action(&shown, "quit"), Some(MenuAction::Quit));
        assert_eq!(menu_action(&shown, "   "), None);
    }
}

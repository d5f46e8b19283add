//! End-of-run narrative, impact phrasing and topic suggestions.

use crate::ScenarioGenerator;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_content::{normalize_topic, sample_topics, DEFAULT_TOPIC_SAMPLE};
use sim_core::{BranchChoice, BusinessMetrics, Consequences, DecisionRecord};
use tracing::{debug, warn};

pub const NO_DATA_NOTICE: &str = "No simulation data available for analysis.";

/// Whether text came from the generator or was computed locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Generated,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingAnalysis {
    pub text: String,
    pub source: Provenance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestions {
    pub topics: Vec<String>,
    pub source: Provenance,
}

/// `$95,000` / `-$5,000`.
pub fn format_cash(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Phrase for a signed delta given (large, medium) thresholds and seven
/// phrases: large+, medium+, small+, large-, medium-, small-, none.
fn bucket(delta: i64, large: i64, medium: i64, phrases: [&'static str; 7]) -> &'static str {
    match delta {
        d if d >= large => phrases[0],
        d if d >= medium => phrases[1],
        d if d > 0 => phrases[2],
        d if d <= -large => phrases[3],
        d if d <= -medium => phrases[4],
        d if d < 0 => phrases[5],
        _ => phrases[6],
    }
}

/// One-sentence plain-language account of a decision's effect.
pub fn describe_impact(c: &Consequences) -> String {
    let cash = bucket(
        c.cash_flow,
        30_000,
        10_000,
        [
            "significantly boosted your finances",
            "improved your cash position",
            "slightly increased available funds",
            "caused a major financial setback",
            "created a notable financial strain",
            "required a small financial investment",
            "had no financial impact",
        ],
    );
    let satisfaction = bucket(
        c.customer_satisfaction.into(),
        15,
        5,
        [
            "delighted your customers",
            "made customers noticeably happier",
            "slightly improved the customer experience",
            "seriously disappointed customers",
            "created some customer dissatisfaction",
            "slightly upset some customers",
            "kept customers at their current satisfaction level",
        ],
    );
    let growth = bucket(
        c.growth_potential.into(),
        15,
        5,
        [
            "created significant new growth opportunities",
            "opened up new growth avenues",
            "slightly improved future prospects",
            "severely limited growth opportunities",
            "constrained some growth options",
            "slightly narrowed future possibilities",
            "maintained current growth trajectory",
        ],
    );
    // Rising risk is bad news.
    let risk = bucket(
        c.risk_level.into(),
        15,
        5,
        [
            "substantially increased business vulnerability",
            "introduced new risk elements",
            "slightly raised exposure to risk",
            "dramatically improved business security",
            "improved business stability",
            "slightly reduced business vulnerability",
            "kept risk levels steady",
        ],
    );
    format!("This decision {cash}. It {satisfaction}, {growth}, and {risk}.")
}

/// Deterministic narrative used when the generator cannot produce one.
pub fn local_analysis(history: &[DecisionRecord], metrics: &BusinessMetrics) -> String {
    let total = history.len();
    let bold = history
        .iter()
        .filter(|d| d.choice == BranchChoice::BestCase)
        .count();
    let careful = total - bold;
    let cash = format_cash(metrics.cash_flow);
    let sat = metrics.customer_satisfaction;
    let growth = metrics.growth_potential;
    let risk = metrics.risk_level;

    let mut lines = Vec::with_capacity(6);
    lines.push(if bold > careful {
        format!("Your decision-making approach shows a preference for ambitious, growth-oriented strategies, choosing the best-case option in {bold} out of {total} scenarios.")
    } else if careful > bold {
        format!("Your decision-making approach shows a preference for conservative, risk-averse strategies, choosing the worst-case option in {careful} out of {total} scenarios.")
    } else {
        format!("Your decision-making approach shows a balanced strategy, choosing an equal mix of ambitious and conservative options across {total} scenarios.")
    });

    lines.push(if metrics.cash_flow < 50_000 {
        format!("Your current cash position of {cash} indicates financial strain. This may limit your ability to invest in growth opportunities.")
    } else if metrics.cash_flow < 100_000 {
        format!("Your current cash position of {cash} is moderate. While stable, you may want to build reserves for future opportunities.")
    } else {
        format!("Your strong cash position of {cash} provides a solid foundation for growth and investment opportunities.")
    });

    lines.push(if sat < 40 {
        format!("Customer satisfaction at {sat}% needs immediate attention. Focus on improving service quality and customer experience.")
    } else if sat < 60 {
        format!("Customer satisfaction at {sat}% has room for improvement. Consider enhancing customer service initiatives.")
    } else {
        format!("Strong customer satisfaction at {sat}% indicates effective customer service. Look for ways to maintain and build on this success.")
    });

    lines.push(if growth < 40 {
        format!("Growth potential at {growth}% suggests limited expansion opportunities. Focus on stabilizing current operations before pursuing growth.")
    } else if growth < 60 {
        format!("Growth potential at {growth}% shows moderate expansion possibilities. Look for strategic opportunities to accelerate growth.")
    } else {
        format!("High growth potential at {growth}% indicates strong expansion opportunities. Consider developing a detailed growth strategy.")
    });

    lines.push(if risk > 60 {
        format!("High risk level at {risk}% requires immediate attention. Focus on risk mitigation and stability measures.")
    } else if risk > 40 {
        format!("Moderate risk level at {risk}% suggests careful monitoring. Consider implementing additional risk management strategies.")
    } else {
        format!("Low risk level at {risk}% indicates stable operations. Look for opportunities to optimize while maintaining this stability.")
    });

    let recommendation = if metrics.cash_flow < 50_000 {
        "Recommendations: 1) Implement cost-cutting measures to improve cash flow. 2) Focus on high-margin products or services to boost profitability."
    } else if sat < 40 {
        "Recommendations: 1) Conduct customer surveys to identify specific pain points. 2) Invest in staff training to improve service quality."
    } else if growth < 40 {
        "Recommendations: 1) Review and optimize current operations. 2) Research new market opportunities aligned with your strengths."
    } else {
        "Recommendations: 1) Develop a detailed expansion strategy. 2) Consider investing in technology or staff to support growth."
    };
    lines.push(recommendation.to_string());

    lines.join("\n")
}

/// Generator narrative for a finished run, or the local one if generation
/// fails. An empty history never reaches the generator.
pub async fn closing_analysis<G: ScenarioGenerator>(
    generator: &G,
    history: &[DecisionRecord],
    metrics: &BusinessMetrics,
    profile: Option<&str>,
) -> ClosingAnalysis {
    if history.is_empty() {
        return ClosingAnalysis {
            text: NO_DATA_NOTICE.to_string(),
            source: Provenance::Local,
        };
    }
    match generator.generate_analysis(history, metrics, profile).await {
        Ok(text) if !text.trim().is_empty() => ClosingAnalysis {
            text: text.trim().to_string(),
            source: Provenance::Generated,
        },
        Ok(_) => {
            warn!("generator returned an empty analysis, using local analysis");
            ClosingAnalysis {
                text: local_analysis(history, metrics),
                source: Provenance::Local,
            }
        }
        Err(e) => {
            warn!(error = %e, "analysis generation failed, using local analysis");
            ClosingAnalysis {
                text: local_analysis(history, metrics),
                source: Provenance::Local,
            }
        }
    }
}

/// Topics for the selection screen. With a profile the generator is asked
/// for personalized topics; otherwise, or when that fails, built-in topics
/// are sampled. A custom topic is normalized and listed first.
pub async fn suggest_topics<G: ScenarioGenerator, R: Rng + ?Sized>(
    generator: &G,
    profile: Option<&str>,
    custom: Option<&str>,
    rng: &mut R,
) -> TopicSuggestions {
    let custom = custom.and_then(normalize_topic);
    let generated = match profile.map(str::trim).filter(|p| !p.is_empty()) {
        Some(profile) => match generator.generate_topics(profile, custom.as_deref()).await {
            Ok(topics) => Some(topics),
            Err(e) => {
                warn!(error = %e, "topic generation failed, using built-in topics");
                None
            }
        },
        None => None,
    };

    let (candidates, source) = match generated {
        Some(topics) if topics.iter().any(|t| !t.trim().is_empty()) => {
            (topics, Provenance::Generated)
        }
        _ => (
            sample_topics(rng, DEFAULT_TOPIC_SAMPLE),
            Provenance::Local,
        ),
    };

    let mut topics: Vec<String> = custom.into_iter().collect();
    for topic in candidates {
        let topic = topic.trim();
        if topics.len() >= DEFAULT_TOPIC_SAMPLE {
            break;
        }
        if !topic.is_empty() && !topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
            topics.push(topic.to_string());
        }
    }
    debug!(count = topics.len(), ?source, "topic suggestions ready");
    TopicSuggestions { topics, source }
}

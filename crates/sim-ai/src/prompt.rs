//! Prompt text and response parsing. No I/O here.

use serde::Deserialize;
use sim_content::FRANCHISE_TOPICS;
use sim_core::{Branch, BusinessMetrics, DecisionRecord, GenerationError, ScenarioRecord};
use std::fmt::Write as _;

pub fn scenario_prompt(topic: &str, profile: Option<&str>) -> String {
    let business = profile
        .map(|p| format!("\nThe player runs this business: {p}. Tailor the situation to it.\n"))
        .unwrap_or_default();
    format!(
        r#"You are a business scenario generator for a franchise management simulator. Create a concise scenario based on the topic: {topic}
{business}
The scenario should follow this exact JSON structure:
{{
    "description": "A brief description of the situation (1-2 sentences)",
    "best_case": {{
        "title": "A short title for the best case option (3-5 words)",
        "description": "Brief description of the best case approach (1-2 sentences)",
        "consequences": {{
            "cash_flow": <integer between -100000 and 50000>,
            "customer_satisfaction": <integer between -25 and 25>,
            "growth_potential": <integer between -25 and 25>,
            "risk_level": <integer between -25 and 25>
        }},
        "next_scenarios": ["<scenario1>", "<scenario2>"]
    }},
    "worst_case": {{ same shape as best_case, for the conservative option }}
}}

Guidelines:
1. Keep all descriptions extremely concise - no more than 1-2 sentences
2. Best case should be ambitious but achievable
3. Worst case should be conservative but not disastrous
4. Consequences should be balanced and make sense for the situation
5. Use only these scenario names for next_scenarios: {known}
6. Ensure all numeric values are integers

Respond with the JSON object only."#,
        known = FRANCHISE_TOPICS.join(", ")
    )
}

pub fn topics_prompt(profile: &str, custom_topic: Option<&str>) -> String {
    let mut prompt = format!(
        "You help franchise owners rehearse decisions. The owner describes their business as: {profile}\n\n\
         Suggest 6 short scenario topics (2-4 words each, Title Case) this owner is likely to face, \
         such as \"Location Selection\" or \"Supply Chain Disruption\".\n"
    );
    if let Some(custom) = custom_topic {
        let _ = writeln!(prompt, "They are already considering \"{custom}\"; do not repeat it.");
    }
    prompt.push_str("Respond with a JSON array of strings only.");
    prompt
}

pub fn analysis_prompt(
    history: &[DecisionRecord],
    metrics: &BusinessMetrics,
    profile: Option<&str>,
) -> String {
    let mut decisions = String::new();
    for (i, d) in history.iter().enumerate() {
        let c = &d.consequences;
        let _ = write!(
            decisions,
            "Decision {}: {}\nChoice: {} - {}\nImpact: cash_flow {:+}, customer_satisfaction {:+}, growth_potential {:+}, risk_level {:+}\n\n",
            i + 1,
            d.scenario,
            d.choice.label(),
            d.title,
            c.cash_flow,
            c.customer_satisfaction,
            c.growth_potential,
            c.risk_level,
        );
    }
    let business = profile
        .map(|p| format!("The business: {p}\n\n"))
        .unwrap_or_default();
    format!(
        "You are a franchise business analyst. Review the following decisions made by a franchise owner in a simulation and provide a detailed analysis.\n\n\
         {business}{decisions}\
         Final Business Metrics:\n\
         - Cash Flow: ${}\n\
         - Customer Satisfaction: {}%\n\
         - Growth Potential: {}%\n\
         - Risk Level: {}%\n\n\
         Please provide:\n\
         1. A detailed analysis (3-4 sentences) of the decision-making patterns and strategy, with specific examples from the choices\n\
         2. An assessment (3-4 sentences) of the business's health and likely future performance based on the metrics\n\
         3. Two specific recommendations for future decisions\n\n\
         Keep the response under 200 words, direct and insightful.",
        metrics.cash_flow,
        metrics.customer_satisfaction,
        metrics.growth_potential,
        metrics.risk_level,
    )
}

/// Model output for a scenario; the name comes from the requested topic.
#[derive(Deserialize)]
struct GeneratedScenario {
    description: String,
    best_case: Branch,
    worst_case: Branch,
}

/// The outermost `open`..`close` slice of `text`, tolerating prose or code
/// fences around it.
fn outer_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_scenario(text: &str, topic: &str) -> Result<ScenarioRecord, GenerationError> {
    let json = outer_slice(text, '{', '}')
        .ok_or_else(|| GenerationError::InvalidResponse("no JSON object in reply".into()))?;
    let g: GeneratedScenario = serde_json::from_str(json)
        .map_err(|e| GenerationError::InvalidResponse(format!("scenario JSON: {e}")))?;
    Ok(ScenarioRecord {
        name: topic.to_string(),
        description: g.description,
        best_case: g.best_case,
        worst_case: g.worst_case,
    })
}

pub fn parse_topics(text: &str) -> Result<Vec<String>, GenerationError> {
    let json = outer_slice(text, '[', ']')
        .ok_or_else(|| GenerationError::InvalidResponse("no JSON array in reply".into()))?;
    let topics: Vec<String> = serde_json::from_str(json)
        .map_err(|e| GenerationError::InvalidResponse(format!("topic list JSON: {e}")))?;
    Ok(topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

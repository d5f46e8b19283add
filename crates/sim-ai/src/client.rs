//! Messages API client for the hosted generator.

use crate::config::{ConfigurationError, GeneratorConfig};
use crate::prompt::{analysis_prompt, parse_scenario, parse_topics, scenario_prompt, topics_prompt};
use serde::{Deserialize, Serialize};
use sim_core::{BusinessMetrics, DecisionRecord, GenerationError, ScenarioRecord};
use sim_engine::ScenarioGenerator;
use tracing::{debug, warn};

const MESSAGES_PATH: &str = "/v1/messages";
pub const API_VERSION: &str = "2023-06-01";

/// Attempts for the closing analysis before giving up.
const ANALYSIS_ATTEMPTS: usize = 2;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    api_key: String,
    config: GeneratorConfig,
    endpoint: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigurationError> {
        let api_key = config.api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigurationError::Client(e.to_string()))?;
        let endpoint = format!("{}{MESSAGES_PATH}", config.base_url.trim_end_matches('/'));
        Ok(Self {
            api_key,
            config,
            endpoint,
            client,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.config.model
    }

    /// One user turn; returns the first text block of the reply.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            temperature: self.config.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        debug!(endpoint = %self.endpoint, model = %self.config.model, max_tokens, "messages request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;
        debug!(%status, bytes = text.len(), "messages response");

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GenerationError::Auth(format!("credentials rejected ({status})")));
        }
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::InvalidResponse(format!("messages body: {e}")))?;
        parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .ok_or_else(|| GenerationError::InvalidResponse("reply has no text block".into()))
    }
}

impl ScenarioGenerator for AnthropicClient {
    async fn generate_scenario(
        &self,
        topic: &str,
        profile: Option<&str>,
    ) -> Result<ScenarioRecord, GenerationError> {
        let text = self
            .complete(&scenario_prompt(topic, profile), self.config.scenario_max_tokens)
            .await?;
        parse_scenario(&text, topic)
    }

    async fn generate_topics(
        &self,
        profile: &str,
        custom_topic: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        let text = self
            .complete(&topics_prompt(profile, custom_topic), self.config.topics_max_tokens)
            .await?;
        parse_topics(&text)
    }

    async fn generate_analysis(
        &self,
        history: &[DecisionRecord],
        metrics: &BusinessMetrics,
        profile: Option<&str>,
    ) -> Result<String, GenerationError> {
        let prompt = analysis_prompt(history, metrics, profile);
        let mut last = GenerationError::Unavailable("no attempt made".into());
        for attempt in 1..=ANALYSIS_ATTEMPTS {
            match self.complete(&prompt, self.config.analysis_max_tokens).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => {
                    warn!(attempt, error = %e, "analysis request failed");
                    last = e;
                }
            }
        }
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;
    use sim_core::{BranchChoice, Consequences};

    fn client_for(server: &MockServer) -> AnthropicClient {
        let config = GeneratorConfig {
            api_key: Some("test-key".into()),
            base_url: server.base_url(),
            timeout_ms: 5_000,
            ..GeneratorConfig::default()
        };
        AnthropicClient::new(config).unwrap()
    }

    fn text_reply(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn"
        })
    }

    fn history() -> Vec<DecisionRecord> {
        vec![DecisionRecord {
            scenario: "Technology Upgrade".into(),
            choice: BranchChoice::BestCase,
            title: "Full POS Replacement".into(),
            consequences: Consequences::default(),
        }]
    }

    #[tokio::test]
    async fn scenario_request_shape_and_parse() {
        let server = MockServer::start();
        let scenario = json!({
            "description": "A delivery app offers an exclusive partnership.",
            "best_case": {
                "title": "Exclusive Partnership",
                "description": "Sign the exclusive deal with marketing support.",
                "consequences": {"cash_flow": -5000, "customer_satisfaction": 10, "growth_potential": 20, "risk_level": 5},
                "next_scenarios": ["Technology Upgrade"]
            },
            "worst_case": {
                "title": "Stay Independent",
                "description": "Keep handling delivery in-house.",
                "consequences": {"cash_flow": 0, "customer_satisfaction": -2, "growth_potential": -5, "risk_level": 0},
                "next_scenarios": ["Economic Downturn"]
            }
        });
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", API_VERSION)
                .body_contains("\"model\":\"claude-3-sonnet-20240229\"")
                .body_contains("\"max_tokens\":800")
                .body_contains("Delivery App Deal");
            then.status(200)
                .json_body(text_reply(&format!("```json\n{scenario}\n```")));
        });

        let record = client_for(&server)
            .generate_scenario("Delivery App Deal", None)
            .await
            .unwrap();
        mock.assert();
        assert_eq!(record.name, "Delivery App Deal");
        assert_eq!(record.best_case.consequences.growth_potential, 20);
    }

    #[tokio::test]
    async fn rejected_key_maps_to_auth() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(401)
                .json_body(json!({"type": "error", "error": {"type": "authentication_error"}}));
        });
        let err = client_for(&server)
            .generate_topics("bakery", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Auth(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(529).body("overloaded");
        });
        let err = client_for(&server)
            .generate_scenario("Anything", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Status { status: 529, ref body } if body == "overloaded"
        ));
    }

    #[tokio::test]
    async fn garbage_reply_is_invalid_response() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200).json_body(text_reply("Sorry, I can't produce JSON today."));
        });
        let err = client_for(&server)
            .generate_scenario("Anything", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn topics_parsed_from_array() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .body_contains("pet grooming");
            then.status(200)
                .json_body(text_reply("[\"Mobile Grooming Van\", \"Seasonal Staffing\"]"));
        });
        let topics = client_for(&server)
            .generate_topics("pet grooming salon", None)
            .await
            .unwrap();
        mock.assert();
        assert_eq!(topics, vec!["Mobile Grooming Van", "Seasonal Staffing"]);
    }

    #[tokio::test]
    async fn analysis_retried_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(500).body("boom");
        });
        let err = client_for(&server)
            .generate_analysis(&history(), &BusinessMetrics::INITIAL, None)
            .await
            .unwrap_err();
        mock.assert_hits(ANALYSIS_ATTEMPTS);
        assert!(matches!(err, GenerationError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn analysis_text_trimmed() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .body_contains("\"max_tokens\":400");
            then.status(200).json_body(text_reply("\n  Bold and well funded.  \n"));
        });
        let text = client_for(&server)
            .generate_analysis(&history(), &BusinessMetrics::INITIAL, Some("bakery"))
            .await
            .unwrap();
        assert_eq!(text, "Bold and well funded.");
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        assert!(matches!(
            AnthropicClient::new(GeneratorConfig::default()),
            Err(ConfigurationError::MissingApiKey)
        ));
    }
}

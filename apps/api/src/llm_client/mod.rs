/// LLM Client — the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the model provider directly.
/// All LLM interactions MUST go through this module, and candidate ordering
/// MUST go through `fallback::generate_with_fallback`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod fallback;
pub mod prompts;

const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;
/// Attempts against the SAME model on 429/5xx. Candidate fallback is layered on top.
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// First backoff delay; doubles on each further retry.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Every harm category the provider filters on. All are relaxed to `BLOCK_NONE`.
const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Finish reasons meaning the provider withheld the generated content.
const WITHHELD_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Content withheld by provider: {reason}")]
    Blocked { reason: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that can turn an instruction into raw model text.
///
/// `LlmClient` is the production implementation; tests substitute scripted fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts, if any text exists.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why the provider withheld content, if it did.
    pub fn withheld_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Some(format!("prompt blocked ({reason})"));
        }
        let finish = self.candidates.first()?.finish_reason.as_deref()?;
        if WITHHELD_FINISH_REASONS.contains(&finish) && self.text().is_none() {
            return Some(format!("finish reason {finish}"));
        }
        None
    }

    /// Extracts text or explains why there is none.
    pub fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.withheld_reason() {
            return Err(LlmError::Blocked { reason });
        }
        self.text().ok_or(LlmError::EmptyContent)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the `generateContent` API with same-model retry and a fixed,
/// maximally permissive safety configuration.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    backoff: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            backoff: INITIAL_BACKOFF,
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Makes a raw call for one model, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system }],
            },
            safety_settings: permissive_safety_settings(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let url = self.endpoint(model);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "LLM call to {} attempt {} failed, retrying after {}ms...",
                    model,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {} for {}: {}", status, model, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: GenerateContentResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call to {} succeeded: prompt_tokens={}, output_tokens={}",
                    model, usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.call(model, system, prompt).await?.into_text()
    }
}

fn permissive_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|&category| SafetySetting {
            category,
            threshold: "BLOCK_NONE",
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_joins_parts_of_first_candidate() {
        let response = parse(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}], "role": "model"},
                     "finishReason": "STOP"},
                    {"content": {"parts": [{"text": "ignored"}]}}
                ],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
            }"#,
        );
        assert_eq!(response.into_text().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_block_is_withheld() {
        let response = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        match response.into_text() {
            Err(LlmError::Blocked { reason }) => assert!(reason.contains("SAFETY")),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_safety_finish_without_text_is_withheld() {
        let response = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(response.into_text(), Err(LlmError::Blocked { .. })));
    }

    #[test]
    fn test_no_candidates_is_empty_content() {
        let response = parse(r#"{"candidates": []}"#);
        assert!(matches!(response.into_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_whitespace_only_text_is_empty_content() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "  \n"}]}, "finishReason": "STOP"}]}"#,
        );
        assert!(matches!(response.into_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_safety_settings_relax_every_category() {
        let settings = permissive_safety_settings();
        assert_eq!(settings.len(), HARM_CATEGORIES.len());
        assert!(settings.iter().all(|s| s.threshold == "BLOCK_NONE"));
    }

    #[test]
    fn test_request_body_uses_provider_casing() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: "sys" }],
            },
            safety_settings: permissive_safety_settings(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("safetySettings").is_some());
        assert!(value.get("systemInstruction").unwrap().get("role").is_none());
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    const OK_BODY: &str = r#"{"candidates": [{"content": {"parts": [{"text": "{}"}]}, "finishReason": "STOP"}]}"#;

    async fn stub_client(replies: Vec<(u16, &str)>) -> (StubProvider, LlmClient) {
        let (stub, base_url) = StubProvider::start(replies).await;
        let client = LlmClient::new("test-key".to_string(), base_url)
            .unwrap()
            .with_backoff(Duration::from_millis(10));
        (stub, client)
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_on_the_same_model() {
        let (stub, client) =
            stub_client(vec![(500, "overloaded"), (503, "unavailable"), (200, OK_BODY)]).await;

        let text = client.generate("model-x", "sys", "prompt").await.unwrap();

        assert_eq!(text, "{}");
        let requests = stub.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.path == "/models/model-x:generateContent"));
        assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_retries() {
        let (stub, client) =
            stub_client(vec![(429, "slow down"), (429, "slow down"), (429, "slow down"), (200, OK_BODY)])
                .await;

        let err = client.generate("model-x", "sys", "prompt").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 429, .. }));
        assert_eq!(stub.requests().len(), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_client_error_fails_immediately_with_provider_message() {
        let (stub, client) = stub_client(vec![
            (400, r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#),
            (200, OK_BODY),
        ])
        .await;

        let err = client.generate("model-x", "sys", "prompt").await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_error_body_is_kept_verbatim() {
        let (_stub, client) = stub_client(vec![(404, "no such model")]).await;
        let err = client.generate("model-x", "sys", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 404, message } if message == "no such model"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = LlmClient::new("k".to_string(), "https://example.test/v1beta/".to_string())
            .unwrap();
        assert_eq!(
            client.endpoint("gemini-pro"),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
    }
}

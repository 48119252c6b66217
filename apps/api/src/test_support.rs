//! Scripted stand-ins for the outbound providers, shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};

use crate::config::Config;
use crate::enrichment::hashtags::HashtagSource;
use crate::enrichment::reference::ReferenceSource;
use crate::llm_client::{LlmError, TextGenerator};

/// What a scripted model returns when called.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Text(&'static str),
    Fail(&'static str),
    Blocked,
    /// Hangs for an hour, then fails.
    Stall,
}

/// Returns a fixed outcome per model id and records every call in order.
/// Models without a script fail with a 404.
pub struct ScriptedGenerator {
    script: Vec<(&'static str, Outcome)>,
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<(&'static str, Outcome)>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, _system: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.prompts.lock().unwrap().push(prompt.to_string());

        let outcome = self
            .script
            .iter()
            .find(|(m, _)| *m == model)
            .map(|(_, o)| *o);

        match outcome {
            Some(Outcome::Text(text)) => Ok(text.to_string()),
            Some(Outcome::Fail(message)) => Err(LlmError::Api {
                status: 500,
                message: message.to_string(),
            }),
            Some(Outcome::Blocked) => Err(LlmError::Blocked {
                reason: "prompt blocked (SAFETY)".to_string(),
            }),
            Some(Outcome::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Api {
                    status: 504,
                    message: "deadline exceeded".to_string(),
                })
            }
            None => Err(LlmError::Api {
                status: 404,
                message: format!("model {model} not found"),
            }),
        }
    }
}

/// Hashtag source returning a fixed answer.
pub struct FixedHashtags(pub Option<Vec<String>>);

#[async_trait]
impl HashtagSource for FixedHashtags {
    async fn lookup(&self, _keyword: &str) -> Option<Vec<String>> {
        self.0.clone()
    }
}

/// Reference source returning a fixed answer and recording requested URLs.
pub struct FixedReference {
    text: Option<String>,
    requested: Mutex<Vec<String>>,
}

impl FixedReference {
    pub fn new(text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_string),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceSource for FixedReference {
    async fn fetch_text(&self, source_url: &str) -> Option<String> {
        self.requested.lock().unwrap().push(source_url.to_string());
        self.text.clone()
    }
}

/// One request as seen by `StubProvider`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    /// `x-api-key` or `x-goog-api-key`, whichever was sent.
    pub api_key: Option<String>,
}

/// Local HTTP server answering every request with the next scripted
/// `(status, body)`. Runs out → 404.
#[derive(Clone, Default)]
pub struct StubProvider {
    replies: Arc<Mutex<VecDeque<(u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubProvider {
    /// Binds `127.0.0.1:0` and returns the stub with its base URL.
    pub async fn start(replies: Vec<(u16, &str)>) -> (Self, String) {
        let stub = StubProvider {
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(|(s, b)| (s, b.to_string())).collect(),
            )),
            requests: Arc::default(),
        };
        let app = Router::new().fallback(stub_reply).with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (stub, format!("http://{addr}"))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_reply(
    State(stub): State<StubProvider>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let api_key = headers
        .get("x-api-key")
        .or_else(|| headers.get("x-goog-api-key"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        api_key,
    });

    let (status, body) = stub
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((404, String::new()));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}

/// Configuration with two candidates and every enrichment disabled.
pub fn test_config() -> Config {
    Config {
        gemini_api_key: "test-key".to_string(),
        gemini_api_base: "http://127.0.0.1:9".to_string(),
        model_candidates: vec!["model-a".to_string(), "model-b".to_string()],
        fallback_pause: Duration::ZERO,
        default_language: "English".to_string(),
        hashtags: None,
        references: None,
        enrichment_timeout: Duration::from_secs(3),
        style_timeout: Duration::from_secs(20),
        port: 8080,
        rust_log: "info".to_string(),
    }
}

use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL_CANDIDATES: &str = "gemini-1.5-flash,gemini-1.5-pro,gemini-pro";

/// Application configuration loaded from environment variables.
/// Read once at startup; cloned into `AppState` and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    /// Ordered model identifiers, tried strictly in this order.
    pub model_candidates: Vec<String>,
    pub fallback_pause: Duration,
    pub default_language: String,
    pub hashtags: Option<EndpointConfig>,
    pub references: Option<EndpointConfig>,
    pub enrichment_timeout: Duration,
    /// Ceiling on the whole reference-style model call.
    pub style_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

/// URL + credential pair for an optional enrichment provider.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let model_candidates = parse_candidates(
            &std::env::var("MODEL_CANDIDATES")
                .unwrap_or_else(|_| DEFAULT_MODEL_CANDIDATES.to_string()),
        );
        if model_candidates.is_empty() {
            anyhow::bail!("MODEL_CANDIDATES must name at least one model");
        }

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string()),
            model_candidates,
            fallback_pause: Duration::from_millis(
                std::env::var("FALLBACK_PAUSE_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse::<u64>()
                    .context("FALLBACK_PAUSE_MS must be a number of milliseconds")?,
            ),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "English".to_string()),
            hashtags: optional_endpoint(
                "ENABLE_HASHTAG_LOOKUP",
                "HASHTAG_API_URL",
                "HASHTAG_API_KEY",
            ),
            references: optional_endpoint(
                "ENABLE_REFERENCE_CLONING",
                "SCRAPER_API_URL",
                "SCRAPER_API_KEY",
            ),
            enrichment_timeout: Duration::from_secs(
                std::env::var("ENRICHMENT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse::<u64>()
                    .context("ENRICHMENT_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            style_timeout: Duration::from_secs(
                std::env::var("STYLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse::<u64>()
                    .context("STYLE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// An enrichment provider is configured only when its flag is on and both
/// URL and credential are present. Anything less disables it.
fn optional_endpoint(flag: &str, url_key: &str, key_key: &str) -> Option<EndpointConfig> {
    if !parse_flag(std::env::var(flag).ok().as_deref()) {
        return None;
    }
    let url = std::env::var(url_key).ok().filter(|v| !v.trim().is_empty())?;
    let api_key = std::env::var(key_key).ok().filter(|v| !v.trim().is_empty())?;
    Some(EndpointConfig { url, api_key })
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_candidates(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

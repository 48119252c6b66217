//! Reference-video text scraping. Best-effort; feeds the style-cloning pass.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{build_client, fetch_json, first_string, items};
use crate::config::EndpointConfig;

/// Longest reference text kept from a scrape.
pub const MAX_REFERENCE_CHARS: usize = 4000;

const WRAPPER_KEYS: &[&str] = &["data", "items", "results"];
const CAPTION_KEYS: &[&str] = &["text", "caption", "desc", "description", "title"];
const TRANSCRIPT_KEYS: &[&str] = &["transcript", "subtitles"];

#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Caption/transcript text for the video at `source_url`, or `None`.
    async fn fetch_text(&self, source_url: &str) -> Option<String>;
}

/// HTTP-backed scraper. Disabled (always `None`) when no endpoint is configured.
pub struct HttpReferenceScraper {
    client: Client,
    endpoint: Option<EndpointConfig>,
}

impl HttpReferenceScraper {
    pub fn new(endpoint: Option<EndpointConfig>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl ReferenceSource for HttpReferenceScraper {
    async fn fetch_text(&self, source_url: &str) -> Option<String> {
        let Some(endpoint) = &self.endpoint else {
            debug!("Reference cloning disabled; ignoring {source_url}");
            return None;
        };

        match fetch_json(&self.client, endpoint, &[("url", source_url)]).await {
            Ok(body) => {
                let text = extract_reference_text(&body);
                if text.is_none() {
                    warn!("Scraper returned no usable text for {source_url}");
                }
                text
            }
            Err(e) => {
                warn!("Reference scrape failed, continuing without it: {e}");
                None
            }
        }
    }
}

/// Caption plus transcript of the first scraped item, capped at `MAX_REFERENCE_CHARS`.
pub fn extract_reference_text(body: &Value) -> Option<String> {
    let first = items(body, WRAPPER_KEYS).into_iter().next()?;
    if let Some(text) = first.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return Some(text.chars().take(MAX_REFERENCE_CHARS).collect());
    }

    let caption = first_string(first, CAPTION_KEYS);
    let transcript = first_string(first, TRANSCRIPT_KEYS);
    let joined = match (caption, transcript) {
        (Some(c), Some(t)) if c != t => format!("{c}\n{t}"),
        (Some(c), _) => c.to_string(),
        (None, Some(t)) => t.to_string(),
        (None, None) => return None,
    };
    Some(joined.chars().take(MAX_REFERENCE_CHARS).collect())
}

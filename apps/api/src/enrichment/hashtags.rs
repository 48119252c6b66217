//! External hashtag lookup. Best-effort; its result replaces model tags when non-empty.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{build_client, fetch_json, first_string, items};
use crate::config::EndpointConfig;

/// Most tags kept from one lookup.
pub const MAX_EXTERNAL_TAGS: usize = 15;

const WRAPPER_KEYS: &[&str] = &["data", "hashtags", "results", "items"];
const TAG_KEYS: &[&str] = &["hashtag", "name", "tag", "title"];

#[async_trait]
pub trait HashtagSource: Send + Sync {
    /// Tags for `keyword`, or `None` when nothing usable came back.
    async fn lookup(&self, keyword: &str) -> Option<Vec<String>>;
}

/// HTTP-backed lookup. Disabled (always `None`) when no endpoint is configured.
pub struct HttpHashtagLookup {
    client: Client,
    endpoint: Option<EndpointConfig>,
}

impl HttpHashtagLookup {
    pub fn new(endpoint: Option<EndpointConfig>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl HashtagSource for HttpHashtagLookup {
    async fn lookup(&self, keyword: &str) -> Option<Vec<String>> {
        let Some(endpoint) = &self.endpoint else {
            debug!("Hashtag lookup disabled; using model hashtags");
            return None;
        };

        match fetch_json(&self.client, endpoint, &[("keyword", keyword)]).await {
            Ok(body) => {
                let tags = extract_hashtags(&body);
                debug!("Hashtag lookup for {:?} returned {} tag(s)", keyword, tags.len());
                Some(tags).filter(|t| !t.is_empty())
            }
            Err(e) => {
                warn!("Hashtag lookup failed, continuing without it: {e}");
                None
            }
        }
    }
}

/// Pulls tags out of a provider body: strings or objects carrying a tag name,
/// optionally wrapped. `#`-prefixed, deduplicated, capped at `MAX_EXTERNAL_TAGS`.
pub fn extract_hashtags(body: &Value) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for item in items(body, WRAPPER_KEYS) {
        let raw = match item {
            Value::String(s) => Some(s.trim()),
            other => first_string(other, TAG_KEYS),
        };
        let Some(name) = raw.map(|s| s.trim_start_matches('#')).filter(|s| !s.is_empty()) else {
            continue;
        };
        if name.contains(char::is_whitespace) {
            continue;
        }
        let tag = format!("#{name}");
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        if tags.len() == MAX_EXTERNAL_TAGS {
            break;
        }
    }
    tags
}

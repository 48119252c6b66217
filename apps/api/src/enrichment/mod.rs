//! Optional enrichment sources.
//!
//! Every public lookup returns `Option`: `None` means "no enrichment", whatever
//! the cause (disabled, missing credential, timeout, bad status, odd body).
//! Errors stay inside this module and are only logged.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::EndpointConfig;

pub mod hashtags;
pub mod reference;

#[derive(Debug, Error)]
enum EnrichmentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// GET `endpoint.url` with `query`, credential in `x-api-key`, body as JSON.
async fn fetch_json(
    client: &Client,
    endpoint: &EndpointConfig,
    query: &[(&str, &str)],
) -> Result<Value, EnrichmentError> {
    let response = client
        .get(&endpoint.url)
        .header("x-api-key", &endpoint.api_key)
        .query(query)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(EnrichmentError::Status(status.as_u16()));
    }

    Ok(response.json::<Value>().await?)
}

/// Items of a provider body: a bare array, or an array nested under one of `wrappers`.
fn items<'a>(body: &'a Value, wrappers: &[&str]) -> Vec<&'a Value> {
    if let Some(array) = body.as_array() {
        return array.iter().collect();
    }
    for key in wrappers {
        match body.get(*key) {
            Some(Value::Array(array)) => return array.iter().collect(),
            Some(nested @ Value::Object(_)) => return items(nested, wrappers),
            _ => {}
        }
    }
    if body.is_object() {
        vec![body]
    } else {
        Vec::new()
    }
}

/// First non-blank string among `keys` on an object.
fn first_string<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

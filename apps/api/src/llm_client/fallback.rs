//! Sequential model fallback.
//!
//! Candidates are tried strictly in priority order, one at a time. A candidate
//! fails when the provider call errors, the provider withholds content, or the
//! acceptor rejects the returned text. The first accepted result wins.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use super::TextGenerator;

/// One failed candidate and the reason it was abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("no candidate models are configured")]
    NoCandidates,

    #[error("all {} candidate model(s) failed; last error from {}: {}", .failures.len(), last_model(.failures), last_reason(.failures))]
    Exhausted { failures: Vec<CandidateFailure> },
}

impl FallbackError {
    /// The last observed underlying cause, if any candidate was attempted.
    pub fn last_failure(&self) -> Option<&CandidateFailure> {
        match self {
            FallbackError::NoCandidates => None,
            FallbackError::Exhausted { failures } => failures.last(),
        }
    }
}

fn last_model(failures: &[CandidateFailure]) -> &str {
    failures.last().map(|f| f.model.as_str()).unwrap_or("-")
}

fn last_reason(failures: &[CandidateFailure]) -> &str {
    failures.last().map(|f| f.reason.as_str()).unwrap_or("-")
}

/// The accepted value plus which candidate produced it.
#[derive(Debug)]
pub struct FallbackSuccess<T> {
    pub model: String,
    pub value: T,
}

/// Runs `prompt` against each candidate in order until `accept` takes a result.
///
/// `pause` is slept between attempts (never before the first one).
pub async fn generate_with_fallback<T, E, F>(
    generator: &dyn TextGenerator,
    candidates: &[String],
    system: &str,
    prompt: &str,
    pause: Duration,
    mut accept: F,
) -> Result<FallbackSuccess<T>, FallbackError>
where
    E: Display,
    F: FnMut(&str) -> Result<T, E>,
{
    if candidates.is_empty() {
        return Err(FallbackError::NoCandidates);
    }

    let mut failures: Vec<CandidateFailure> = Vec::new();

    for (index, model) in candidates.iter().enumerate() {
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let reason = match generator.generate(model, system, prompt).await {
            Ok(raw) => match accept(&raw) {
                Ok(value) => {
                    info!(
                        "Candidate {} accepted after {} failed attempt(s)",
                        model,
                        failures.len()
                    );
                    return Ok(FallbackSuccess {
                        model: model.clone(),
                        value,
                    });
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        warn!(
            "Candidate {}/{} ({}) failed: {}",
            index + 1,
            candidates.len(),
            model,
            reason
        );
        failures.push(CandidateFailure {
            model: model.clone(),
            reason,
        });
    }

    Err(FallbackError::Exhausted { failures })
}

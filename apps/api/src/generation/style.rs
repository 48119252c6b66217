//! Reference-style analysis: condenses scraped reference text into a short
//! structural description for the generation prompt.

use std::time::Duration;

use tracing::{debug, warn};

use crate::generation::normalizer::strip_code_fences;
use crate::generation::prompts::{build_style_analysis_prompt, STYLE_ANALYSIS_SYSTEM};
use crate::llm_client::fallback::generate_with_fallback;
use crate::llm_client::TextGenerator;

/// Longest style description forwarded into the generation prompt.
pub const MAX_STYLE_CHARS: usize = 1200;

/// Runs the secondary model call. `None` when every candidate failed.
pub async fn analyze_reference_style(
    generator: &dyn TextGenerator,
    candidates: &[String],
    pause: Duration,
    reference_text: &str,
) -> Option<String> {
    let prompt = build_style_analysis_prompt(reference_text);

    match generate_with_fallback(
        generator,
        candidates,
        STYLE_ANALYSIS_SYSTEM,
        &prompt,
        pause,
        accept_style,
    )
    .await
    {
        Ok(success) => {
            debug!(
                "Reference style extracted by {} ({} chars)",
                success.model,
                success.value.len()
            );
            Some(success.value)
        }
        Err(e) => {
            warn!("Style analysis failed, generating without reference: {e}");
            None
        }
    }
}

fn accept_style(raw: &str) -> Result<String, &'static str> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err("empty style description");
    }
    Ok(cleaned.chars().take(MAX_STYLE_CHARS).collect())
}

//! Content-pack generation — orchestrates the full pipeline for one request.
//!
//! Flow: reference scrape → style analysis → hashtag lookup → prompt →
//!       candidate fallback (each answer normalized) → pack.
//!
//! Enrichment steps never fail the request. Only candidate exhaustion does.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::enrichment::hashtags::HashtagSource;
use crate::enrichment::reference::ReferenceSource;
use crate::errors::AppError;
use crate::generation::normalizer::normalize;
use crate::generation::prompts::{build_generation_prompt, generation_system};
use crate::generation::style::analyze_reference_style;
use crate::llm_client::fallback::generate_with_fallback;
use crate::llm_client::TextGenerator;
use crate::models::pack::ContentPack;
use crate::models::request::GenerateRequest;

/// Default ceiling on the reference-style call across all candidates.
pub const DEFAULT_STYLE_TIMEOUT: Duration = Duration::from_secs(20);

/// Everything one generation needs. Cheap to clone; shared read-only across requests.
#[derive(Clone)]
pub struct ContentEngine {
    generator: Arc<dyn TextGenerator>,
    hashtags: Arc<dyn HashtagSource>,
    references: Arc<dyn ReferenceSource>,
    candidates: Vec<String>,
    fallback_pause: Duration,
    style_timeout: Duration,
}

impl ContentEngine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        hashtags: Arc<dyn HashtagSource>,
        references: Arc<dyn ReferenceSource>,
        candidates: Vec<String>,
        fallback_pause: Duration,
    ) -> Self {
        Self {
            generator,
            hashtags,
            references,
            candidates,
            fallback_pause,
            style_timeout: DEFAULT_STYLE_TIMEOUT,
        }
    }

    pub fn with_style_timeout(mut self, style_timeout: Duration) -> Self {
        self.style_timeout = style_timeout;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Runs the pipeline and returns a fully-populated pack, or the
    /// aggregated failure when every candidate model failed.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ContentPack, AppError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate",
            %request_id,
            tone = request.tone.as_str(),
            platform = request.platform.as_str()
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &GenerateRequest) -> Result<ContentPack, AppError> {
        // Step 1: Reference style (optional)
        let reference_style = match &request.reference_url {
            Some(url) => self.reference_style(url).await,
            None => None,
        };

        // Step 2: External hashtags (optional)
        let external_hashtags = self.hashtags.lookup(&request.topic).await;

        // Step 3: Prompt
        let prompt = build_generation_prompt(request, reference_style.as_deref());
        let title = format!("AI Protocol: {}", request.topic);

        // Step 4: Candidate fallback; a malformed answer counts as a failed candidate
        info!(
            "Generating pack for {:?} across {} candidate(s)",
            request.topic,
            self.candidates.len()
        );
        let success = generate_with_fallback(
            self.generator.as_ref(),
            &self.candidates,
            &generation_system(),
            &prompt,
            self.fallback_pause,
            |raw: &str| normalize(raw, &title, external_hashtags.as_deref()),
        )
        .await?;

        let pack = success.value;
        info!(
            "Pack generated by {}: score={}, hooks={}, sections={}, hashtags={}",
            success.model,
            pack.dominance_score.score,
            pack.hooks.len(),
            pack.script_timeline.len(),
            pack.hashtags.len()
        );

        Ok(pack)
    }

    /// Bounded by `style_timeout` so a slow provider cannot hold up the main call.
    async fn reference_style(&self, url: &str) -> Option<String> {
        let text = self.references.fetch_text(url).await?;
        let analysis = analyze_reference_style(
            self.generator.as_ref(),
            &self.candidates,
            self.fallback_pause,
            &text,
        );
        match tokio::time::timeout(self.style_timeout, analysis).await {
            Ok(style) => style,
            Err(_) => {
                warn!(
                    "Style analysis exceeded {}s, generating without reference",
                    self.style_timeout.as_secs()
                );
                None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::normalizer::{DEFAULT_CAPTION, DEFAULT_HASHTAG};
    use crate::models::request::{Platform, Tone};
    use crate::test_support::{FixedHashtags, FixedReference, Outcome, ScriptedGenerator};

    const PACK_JSON: &str = r##"```json
{
  "Dominance_Score": {"Score": 91, "Why": ["Strong negativity bias"], "Fix": "Cut the first second"},
  "Hooks": [{"Type": "Bold Claim", "Text": "Your agency is already obsolete.", "Visual_Cue": "Slow push-in"}],
  "Script_Timeline": [{"Time_Start": "00:00", "Type": "Hook", "Script": "Your agency is already obsolete."}],
  "Hashtags": ["#agency", "#ai"]
}
```"##;

    fn request(reference_url: Option<&str>) -> GenerateRequest {
        GenerateRequest {
            topic: "AI Automation for Agencies".to_string(),
            niche: "Digital Marketing".to_string(),
            target_audience: "Agency Owners".to_string(),
            tone: Tone::Controversial,
            platform: Platform::Tiktok,
            language: "English".to_string(),
            key_strengths: vec![],
            reference_url: reference_url.map(str::to_string),
        }
    }

    fn engine(
        generator: Arc<ScriptedGenerator>,
        hashtags: Option<Vec<String>>,
        reference: Arc<FixedReference>,
        candidates: &[&str],
    ) -> ContentEngine {
        ContentEngine::new(
            generator,
            Arc::new(FixedHashtags(hashtags)),
            reference,
            candidates.iter().map(|c| c.to_string()).collect(),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_generates_full_pack_from_fenced_mixed_case_json() {
        let generator = Arc::new(ScriptedGenerator::new(vec![("a", Outcome::Text(PACK_JSON))]));
        let engine = engine(generator.clone(), None, Arc::new(FixedReference::new(None)), &["a"]);

        let pack = engine.generate(&request(None)).await.unwrap();

        assert_eq!(pack.title, "AI Protocol: AI Automation for Agencies");
        assert_eq!(pack.dominance_score.score, 91);
        assert_eq!(pack.dominance_score.minimum_fix, "Cut the first second");
        assert_eq!(pack.hooks[0].hook_type, "Bold Claim");
        assert_eq!(pack.script_timeline[0].section_type, "Hook");
        assert_eq!(pack.hashtags, vec!["#agency".to_string(), "#ai".to_string()]);
        assert_eq!(pack.caption, DEFAULT_CAPTION);
        assert!(generator.prompts()[0].contains("Topic: AI Automation for Agencies"));
    }

    #[tokio::test]
    async fn test_prose_answer_falls_back_to_next_candidate() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            ("a", Outcome::Text("I'm sorry, I can't produce that.")),
            ("b", Outcome::Text(r#"{"dominance_score": {"score": 64}}"#)),
        ]));
        let engine = engine(
            generator.clone(),
            None,
            Arc::new(FixedReference::new(None)),
            &["a", "b"],
        );

        let pack = engine.generate(&request(None)).await.unwrap();

        assert_eq!(pack.dominance_score.score, 64);
        assert_eq!(pack.hashtags, vec![DEFAULT_HASHTAG.to_string()]);
        assert_eq!(generator.calls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_cause() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            ("a", Outcome::Blocked),
            ("b", Outcome::Text("not json at all")),
        ]));
        let engine = engine(generator, None, Arc::new(FixedReference::new(None)), &["a", "b"]);

        let err = engine.generate(&request(None)).await.unwrap_err();

        match err {
            AppError::Upstream(e) => {
                let last = e.last_failure().unwrap();
                assert_eq!(last.model, "b");
                assert!(last.reason.contains("malformed upstream payload"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_external_hashtags_replace_model_tags() {
        let generator = Arc::new(ScriptedGenerator::new(vec![("a", Outcome::Text(PACK_JSON))]));
        let external = vec!["#fromsearch".to_string(), "#agencygrowth".to_string()];
        let engine = engine(
            generator,
            Some(external.clone()),
            Arc::new(FixedReference::new(None)),
            &["a"],
        );

        let pack = engine.generate(&request(None)).await.unwrap();
        assert_eq!(pack.hashtags, external);
    }

    #[tokio::test]
    async fn test_reference_style_is_fed_into_prompt() {
        let generator = Arc::new(ScriptedGenerator::new(vec![("a", Outcome::Text(PACK_JSON))]));
        let reference = Arc::new(FixedReference::new(Some("POV: you fired your agency")));
        let engine = engine(generator.clone(), None, reference.clone(), &["a"]);
        let url = "https://www.tiktok.com/@user/video/1";

        engine.generate(&request(Some(url))).await.unwrap();

        assert_eq!(reference.requested(), vec![url.to_string()]);
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("POV: you fired your agency"));
        assert!(prompts[1].contains("REFERENCE STYLE TO CLONE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_style_analysis_is_abandoned() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            ("a", Outcome::Stall),
            ("b", Outcome::Text(PACK_JSON)),
        ]));
        let reference = Arc::new(FixedReference::new(Some("POV: you fired your agency")));
        let engine = engine(generator.clone(), None, reference, &["a", "b"])
            .with_style_timeout(Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        let pack = engine
            .generate(&request(Some("https://www.tiktok.com/@user/video/3")))
            .await
            .unwrap();

        assert_eq!(pack.dominance_score.score, 91);
        // style call on "a" only, then the main call falls through "a" to "b"
        assert_eq!(
            generator.calls(),
            vec!["a".to_string(), "a".to_string(), "b".to_string()]
        );
        assert!(!generator.prompts()[2].contains("REFERENCE STYLE TO CLONE"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(3600 + 60));
    }

    #[tokio::test]
    async fn test_missing_reference_text_skips_style_call() {
        let generator = Arc::new(ScriptedGenerator::new(vec![("a", Outcome::Text(PACK_JSON))]));
        let reference = Arc::new(FixedReference::new(None));
        let engine = engine(generator.clone(), None, reference.clone(), &["a"]);

        engine
            .generate(&request(Some("https://www.tiktok.com/@user/video/2")))
            .await
            .unwrap();

        assert_eq!(reference.requested().len(), 1);
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("REFERENCE STYLE TO CLONE"));
    }
}

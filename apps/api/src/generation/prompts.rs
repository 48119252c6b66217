// All LLM prompt constants and builders for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::generation::tone::{platform_profile, tone_profile};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, LANGUAGE_INSTRUCTION};
use crate::models::request::GenerateRequest;

/// System prompt for content-pack generation.
pub const GENERATION_SYSTEM_PREAMBLE: &str = "You are a supreme short-form content strategist \
    optimized for virality. Engineer content that triggers high retention, engagement and authority. \
    NO FLUFF: every word must earn its place. PSYCHOLOGY FIRST: use curiosity gaps, negativity bias \
    or strong assertions. Adapt strictly to the requested tone.";

/// Content-pack prompt template.
/// Placeholders: {platform}, {topic}, {niche}, {audience}, {strengths}, {tone_label},
/// {tone_strategy}, {hook_styles}, {avoid}, {target_seconds}, {pacing},
/// {language_instruction}, {reference_block}
pub const GENERATION_PROMPT_TEMPLATE: &str = r##"TASK: Generate a viral {platform} content pack.

CONTEXT:
- Topic: {topic}
- Niche: {niche}
- Target Audience: {audience}
- Creator Strengths: {strengths}

TONE: {tone_label}
{tone_strategy}
Hook styles to use: {hook_styles}
Avoid: {avoid}

PLATFORM PACING: about {target_seconds} seconds. {pacing}
{reference_block}
REQUIREMENTS:
1. Predict a dominance score (0-100) for the topic's viral potential, with short reasons and the ONE fix that would raise it most.
2. Create 3 hook variants, one per hook style above, each with a visual cue.
3. Write a full script timeline from 00:00 to the end, with spoken script, on-screen text and visual direction for every section.
4. Provide 5-10 hashtags, a caption, and a "viral flex" line the creator can share (e.g. "I just hacked the algorithm...").

{language_instruction}

Return a JSON object with EXACTLY these keys, in this order:
{
  "dominance_score": {"score": 0, "why": ["reason"], "minimum_fix": "one fix"},
  "hooks": [{"type": "hook style", "text": "hook line", "visual_cue": "what the viewer sees"}],
  "script_timeline": [{"time_start": "00:00", "time_end": "00:03", "type": "Hook", "script": "spoken words", "screen_text": "overlay text", "visual_direction": "shot description"}],
  "hashtags": ["#tag"],
  "caption": "post caption",
  "viral_flex_text": "shareable flex line"
}

RETURN JSON ONLY."##;

/// Appended when a reference video was analysed. Placeholder: {reference_style}
pub const REFERENCE_BLOCK_TEMPLATE: &str = r#"
REFERENCE STYLE TO CLONE:
{reference_style}
Imitate the structure, pacing and emotional pattern of this reference, but apply it to the NEW topic above. Do NOT copy its words or its subject.
"#;

/// System prompt for reference-style analysis. Plain text output, not JSON.
pub const STYLE_ANALYSIS_SYSTEM: &str = "You are an expert short-form video analyst. \
    You describe HOW a video works, never WHAT it is about. \
    Answer in plain text, no markdown, no preamble.";

/// Style analysis prompt template. Placeholder: {reference_text}
pub const STYLE_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyse the caption/transcript of a viral video below and describe its reusable structure in exactly four short lines:
HOOK TYPE: ...
PACING: ...
EMOTIONAL ARC: ...
CTA PATTERN: ...

VIDEO TEXT:
{reference_text}"#;

/// Full system prompt for content-pack generation.
pub fn generation_system() -> String {
    format!("{GENERATION_SYSTEM_PREAMBLE} {JSON_ONLY_SYSTEM}")
}

/// Builds the content-pack instruction. Pure: same inputs, same string.
pub fn build_generation_prompt(request: &GenerateRequest, reference_style: Option<&str>) -> String {
    let tone = tone_profile(request.tone);
    let platform = platform_profile(request.platform);

    let strengths = if request.key_strengths.is_empty() {
        "not specified".to_string()
    } else {
        request.key_strengths.join(", ")
    };
    let language_instruction =
        fill_template(LANGUAGE_INSTRUCTION, &[("language", request.language.as_str())]);
    let reference_block = match reference_style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => fill_template(REFERENCE_BLOCK_TEMPLATE, &[("reference_style", style)]),
        None => String::new(),
    };
    let target_seconds = platform.target_seconds.to_string();
    let hook_styles = tone.hook_styles.join(", ");
    let avoid = tone.avoid.join(", ");

    fill_template(
        GENERATION_PROMPT_TEMPLATE,
        &[
            ("platform", request.platform.display_name()),
            ("topic", request.topic.as_str()),
            ("niche", request.niche.as_str()),
            ("audience", request.target_audience.as_str()),
            ("strengths", strengths.as_str()),
            ("tone_label", tone.label),
            ("tone_strategy", tone.strategy),
            ("hook_styles", hook_styles.as_str()),
            ("avoid", avoid.as_str()),
            ("target_seconds", target_seconds.as_str()),
            ("pacing", platform.pacing),
            ("language_instruction", language_instruction.as_str()),
            ("reference_block", reference_block.as_str()),
        ],
    )
}

/// Builds the style-analysis instruction from scraped reference text.
pub fn build_style_analysis_prompt(reference_text: &str) -> String {
    fill_template(STYLE_ANALYSIS_PROMPT_TEMPLATE, &[("reference_text", reference_text.trim())])
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so user text containing `{topic}` stays literal. Unknown `{...}` is kept.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = vars.iter().find(|(name, _)| {
            after.starts_with(name) && after[name.len()..].starts_with('}')
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

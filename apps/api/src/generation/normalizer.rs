//! Response normalizer — turns loosely-structured model text into a `ContentPack`.
//!
//! Steps: strip fences → parse → lower-case keys → resolve aliases →
//! coerce with per-field defaults → apply external hashtags.
//!
//! Only the parse step can fail. Everything after it always yields a fully
//! populated pack; a bad or missing field costs that field, never the pack.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::generation::aliases::{first_match, Field};
use crate::models::pack::{ContentPack, ContentSection, DominanceScore, HookVariant};

pub const DEFAULT_SCORE: u8 = 85;
pub const DEFAULT_WHY: &str = "High viral potential detected.";
pub const DEFAULT_FIX: &str = "Enhance audio quality.";
pub const DEFAULT_HOOK_TYPE: &str = "Generic";
pub const DEFAULT_HOOK_TEXT: &str = "...";
pub const DEFAULT_VISUAL_CUE: &str = "Close-up, direct eye contact with the camera.";
pub const DEFAULT_TIME_START: &str = "00:00";
pub const DEFAULT_SECTION_TYPE: &str = "Intro";
pub const DEFAULT_SCRIPT: &str = "...";
pub const DEFAULT_HASHTAG: &str = "#Viral";
pub const DEFAULT_CAPTION: &str = "Check this out.";
pub const DEFAULT_FLEX_TEXT: &str = "I just engineered viral content.";

const SNIPPET_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed upstream payload ({source}); starts with {snippet:?}")]
    MalformedPayload {
        source: serde_json::Error,
        snippet: String,
    },
}

/// Normalizes raw model output into the canonical pack.
///
/// `external_hashtags`, when non-empty, replaces whatever tags the model produced.
pub fn normalize(
    raw: &str,
    title: &str,
    external_hashtags: Option<&[String]>,
) -> Result<ContentPack, NormalizeError> {
    let root = parse_payload(raw)?;

    let hashtags = match external_hashtags {
        Some(tags) if !tags.is_empty() => tags.to_vec(),
        _ => model_hashtags(&root),
    };

    Ok(ContentPack {
        title: title.to_string(),
        dominance_score: DominanceScore {
            score: first_match(&root, Field::Score)
                .and_then(coerce_score)
                .unwrap_or(DEFAULT_SCORE),
            why: first_match(&root, Field::Rationale)
                .and_then(coerce_text_list)
                .unwrap_or_else(|| vec![DEFAULT_WHY.to_string()]),
            minimum_fix: text_or(&root, Field::Fix, DEFAULT_FIX),
        },
        hooks: records(first_match(&root, Field::Hooks))
            .into_iter()
            .filter_map(hook_from)
            .collect(),
        script_timeline: records(first_match(&root, Field::Timeline))
            .into_iter()
            .filter_map(section_from)
            .collect(),
        hashtags,
        caption: text_or(&root, Field::Caption, DEFAULT_CAPTION),
        viral_flex_text: text_or(&root, Field::ShareText, DEFAULT_FLEX_TEXT),
    })
}

/// Strips fences, parses, and lower-cases every key.
pub fn parse_payload(raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<Value>(&cleaned)
        .map(lowercase_keys)
        .map_err(|source| NormalizeError::MalformedPayload {
            source,
            snippet: cleaned.chars().take(SNIPPET_CHARS).collect(),
        })
}

/// Removes every ``` marker and a leading `json` language tag, then trims.
pub fn strip_code_fences(text: &str) -> String {
    let without_fences = text.replace("```", "");
    let trimmed = without_fences.trim();
    let untagged = match trimmed.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &trimmed[4..],
        _ => trimmed,
    };
    untagged.trim().to_string()
}

/// Recursively lower-cases object keys at every depth.
/// Keys that collide after lower-casing keep a non-null value over a null one.
pub fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut lowered = Map::with_capacity(map.len());
            for (key, value) in map {
                let key = key.to_lowercase();
                let value = lowercase_keys(value);
                if value.is_null() && lowered.get(&key).is_some_and(|v: &Value| !v.is_null()) {
                    continue;
                }
                lowered.insert(key, value);
            }
            Value::Object(lowered)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        scalar => scalar,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coercion
// ────────────────────────────────────────────────────────────────────────────

/// Number, numeric string ("92", "92%", "92/100"), or an object wrapping one.
fn coerce_score(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let head = s.split('/').next().unwrap_or_default();
            head.trim().trim_end_matches('%').trim().parse::<f64>().ok()?
        }
        Value::Object(map) => {
            return map
                .get("score")
                .or_else(|| map.get("value"))
                .and_then(coerce_score)
        }
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(coerce_text)
                .collect::<Vec<_>>()
                .join(" ");
            Some(joined).filter(|s| !s.is_empty())
        }
        Value::Object(_) | Value::Null => None,
    }
}

/// A list of strings, or a single string lifted into one. Empty → `None`.
fn coerce_text_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        other => coerce_text(other).into_iter().collect(),
    };
    Some(items).filter(|i| !i.is_empty())
}

fn text_or(root: &Value, field: Field, default: &str) -> String {
    first_match(root, field)
        .and_then(coerce_text)
        .unwrap_or_else(|| default.to_string())
}

/// Elements of a record list. A lone object or string counts as a one-element list.
fn records(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ (Value::Object(_) | Value::String(_))) => vec![v],
        _ => Vec::new(),
    }
}

fn hook_from(value: &Value) -> Option<HookVariant> {
    match value {
        Value::Object(_) => Some(HookVariant {
            hook_type: text_or(value, Field::HookType, DEFAULT_HOOK_TYPE),
            text: text_or(value, Field::HookText, DEFAULT_HOOK_TEXT),
            visual_cue: text_or(value, Field::HookVisual, DEFAULT_VISUAL_CUE),
        }),
        other => coerce_text(other).map(|text| HookVariant {
            hook_type: DEFAULT_HOOK_TYPE.to_string(),
            text,
            visual_cue: DEFAULT_VISUAL_CUE.to_string(),
        }),
    }
}

fn section_from(value: &Value) -> Option<ContentSection> {
    match value {
        Value::Object(_) => Some(ContentSection {
            time_start: text_or(value, Field::SectionStart, DEFAULT_TIME_START),
            time_end: text_or(value, Field::SectionEnd, ""),
            section_type: text_or(value, Field::SectionType, DEFAULT_SECTION_TYPE),
            script: text_or(value, Field::SectionScript, DEFAULT_SCRIPT),
            screen_text: text_or(value, Field::SectionScreenText, ""),
            visual_direction: text_or(value, Field::SectionVisual, ""),
        }),
        other => coerce_text(other).map(|script| ContentSection {
            time_start: DEFAULT_TIME_START.to_string(),
            time_end: String::new(),
            section_type: DEFAULT_SECTION_TYPE.to_string(),
            script,
            screen_text: String::new(),
            visual_direction: String::new(),
        }),
    }
}

/// Model-produced tags: `#`-prefixed, split on whitespace/commas, deduplicated.
/// Absent → the default tag; present but empty → empty.
fn model_hashtags(root: &Value) -> Vec<String> {
    let Some(value) = first_match(root, Field::Hashtags) else {
        return vec![DEFAULT_HASHTAG.to_string()];
    };
    let raw: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        other => coerce_text(other).into_iter().collect(),
    };

    let mut tags: Vec<String> = Vec::new();
    for token in raw
        .iter()
        .flat_map(|s| s.split(|c: char| c.is_whitespace() || c == ','))
        .map(|t| t.trim_start_matches('#'))
        .filter(|t| !t.is_empty())
    {
        let tag = format!("#{token}");
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

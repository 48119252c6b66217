//! The canonical content pack returned to callers.
//!
//! Every field is always populated. The normalizer is the only producer.

use serde::{Deserialize, Serialize};

/// Predicted strength of the content, 0–100, with reasons and the one fix
/// that would improve it most.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominanceScore {
    pub score: u8,
    pub why: Vec<String>,
    pub minimum_fix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookVariant {
    /// Category label, e.g. "Pattern Interrupt".
    #[serde(rename = "type")]
    pub hook_type: String,
    pub text: String,
    pub visual_cue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub time_start: String,
    /// May be empty when the model gave no end mark.
    pub time_end: String,
    /// Hook, Value, CTA...
    #[serde(rename = "type")]
    pub section_type: String,
    pub script: String,
    pub screen_text: String,
    pub visual_direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPack {
    pub title: String,
    pub dominance_score: DominanceScore,
    pub hooks: Vec<HookVariant>,
    pub script_timeline: Vec<ContentSection>,
    pub hashtags: Vec<String>,
    pub caption: String,
    /// Text shown on the share card.
    pub viral_flex_text: String,
}

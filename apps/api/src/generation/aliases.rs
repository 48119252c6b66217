//! Alias table: every key path the normalizer accepts for each canonical field.
//!
//! Paths are lower-case (keys are lower-cased before lookup) and tried in the
//! order listed. Record-level fields are resolved relative to the record.
//! This table is the only place field naming drift is handled.

use serde_json::Value;

/// A key path from some root object, e.g. `&["dominance_score", "why"]`.
pub type AliasPath = &'static [&'static str];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    // pack level
    Score,
    Rationale,
    Fix,
    Hooks,
    Timeline,
    Hashtags,
    Caption,
    ShareText,
    // hook record
    HookType,
    HookText,
    HookVisual,
    // timeline record
    SectionStart,
    SectionEnd,
    SectionType,
    SectionScript,
    SectionScreenText,
    SectionVisual,
}

impl Field {
    pub fn aliases(self) -> &'static [AliasPath] {
        match self {
            Field::Score => &[
                &["dominance_score"],
                &["score_data"],
                &["dominancescore"],
                &["score"],
                &["viral_score"],
            ],
            Field::Rationale => &[
                &["dominance_score", "why"],
                &["dominance_score", "reasons"],
                &["dominance_score", "rationale"],
                &["score_data", "why"],
                &["score_data", "reasons"],
                &["score_data", "rationale"],
                &["dominancescore", "why"],
                &["why"],
                &["reasons"],
                &["rationale"],
            ],
            Field::Fix => &[
                &["dominance_score", "minimum_fix"],
                &["dominance_score", "fix"],
                &["dominance_score", "minimumfix"],
                &["score_data", "minimum_fix"],
                &["score_data", "fix"],
                &["dominancescore", "minimumfix"],
                &["minimum_fix"],
                &["fix"],
                &["improvement"],
            ],
            Field::Hooks => &[&["hooks"], &["hook_variants"], &["viral_hooks"]],
            Field::Timeline => &[
                &["script_timeline"],
                &["scripttimeline"],
                &["timeline"],
                &["script"],
                &["sections"],
            ],
            Field::Hashtags => &[&["hashtags"], &["hash_tags"], &["tags"]],
            Field::Caption => &[&["caption"], &["description"]],
            Field::ShareText => &[
                &["viral_flex_text"],
                &["viralflextext"],
                &["flex_text"],
                &["viral_flex"],
                &["share_text"],
            ],
            Field::HookType => &[&["type"], &["hook_type"], &["category"], &["style"]],
            Field::HookText => &[&["text"], &["hook"], &["content"], &["line"]],
            Field::HookVisual => &[
                &["visual_cue"],
                &["visualcue"],
                &["visual"],
                &["visual_direction"],
            ],
            Field::SectionStart => &[
                &["time_start"],
                &["timestart"],
                &["start_time"],
                &["start"],
                &["time"],
            ],
            Field::SectionEnd => &[&["time_end"], &["timeend"], &["end_time"], &["end"]],
            Field::SectionType => &[
                &["type"],
                &["section_type"],
                &["section"],
                &["label"],
            ],
            Field::SectionScript => &[
                &["script"],
                &["spoken_text"],
                &["voiceover"],
                &["text"],
                &["content"],
            ],
            Field::SectionScreenText => &[
                &["screen_text"],
                &["screentext"],
                &["on_screen_text"],
                &["text_overlay"],
                &["overlay"],
            ],
            Field::SectionVisual => &[
                &["visual_direction"],
                &["visualdirection"],
                &["visual"],
                &["visual_cue"],
            ],
        }
    }
}

/// Follows one key path from `root`. Non-object intermediate values end the walk.
fn walk<'a>(root: &'a Value, path: AliasPath) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.as_object()?.get(*key))
}

/// The value of the first alias path present with a non-null value.
pub fn first_match<'a>(root: &'a Value, field: Field) -> Option<&'a Value> {
    field
        .aliases()
        .iter()
        .filter_map(|path| walk(root, *path))
        .find(|v| !v.is_null())
}

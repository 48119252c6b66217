use serde::Serialize;

/// A suggested content language and how a dashboard should lay it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    pub name: &'static str,
    /// "ltr" or "rtl".
    pub direction: &'static str,
}

/// Languages offered by the dashboard. Requests may still name any language.
pub const LANGUAGES: &[LanguageOption] = &[
    LanguageOption { name: "English", direction: "ltr" },
    LanguageOption { name: "Arabic", direction: "rtl" },
    LanguageOption { name: "Spanish", direction: "ltr" },
    LanguageOption { name: "French", direction: "ltr" },
    LanguageOption { name: "German", direction: "ltr" },
    LanguageOption { name: "Chinese", direction: "ltr" },
];

/// Text direction for a language name; unknown languages are left-to-right.
pub fn text_direction(language: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(language.trim()))
        .map(|l| l.direction)
        .unwrap_or("ltr")
}

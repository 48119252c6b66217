//! Inbound request shape and its boundary validation.
//!
//! The body is deserialized loosely (`GenerateRequestBody`, plain strings) and
//! then validated into `GenerateRequest`, so bad enum values become our own
//! `Validation` error instead of an extractor rejection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Fast growth.
    #[default]
    Controversial,
    /// Authority.
    Educational,
    /// Emotional connection.
    Storytelling,
    /// Conversion.
    DirectSales,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Tone::Controversial,
        Tone::Educational,
        Tone::Storytelling,
        Tone::DirectSales,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Controversial => "controversial",
            Tone::Educational => "educational",
            Tone::Storytelling => "storytelling",
            Tone::DirectSales => "direct_sales",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Tiktok,
    InstagramReels,
    YoutubeShorts,
}

impl Platform {
    pub const ALL: [Platform; 3] = [
        Platform::Tiktok,
        Platform::InstagramReels,
        Platform::YoutubeShorts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::InstagramReels => "instagram_reels",
            Platform::YoutubeShorts => "youtube_shorts",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::InstagramReels => "Instagram Reels",
            Platform::YoutubeShorts => "YouTube Shorts",
        }
    }
}

/// Error for a value outside an enumerated set.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub allowed: Vec<&'static str>,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}' (expected one of: {})",
            self.field,
            self.value,
            self.allowed.join(", ")
        )
    }
}

fn parse_variant<T: Copy>(
    field: &'static str,
    raw: &str,
    all: &[T],
    name: fn(T) -> &'static str,
) -> Result<T, UnknownVariant> {
    let wanted = raw.trim().to_ascii_lowercase();
    all.iter()
        .copied()
        .find(|v| name(*v) == wanted)
        .ok_or_else(|| UnknownVariant {
            field,
            value: raw.to_string(),
            allowed: all.iter().map(|v| name(*v)).collect(),
        })
}

impl FromStr for Tone {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("tone", s, &Tone::ALL, Tone::as_str)
    }
}

impl FromStr for Platform {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("platform", s, &Platform::ALL, Platform::as_str)
    }
}

/// Request body as received. Enum-valued fields stay strings until validated.
///
/// Creator fields may arrive flat or nested under `dna`; nested values win.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequestBody {
    #[serde(alias = "topic_or_keyword")]
    pub topic: String,
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default, alias = "audience")]
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub key_strengths: Vec<String>,
    pub reference_url: Option<String>,
    #[serde(default)]
    pub dna: Option<CreatorDna>,
}

/// The creator profile block (`dna`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorDna {
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default, alias = "audience")]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub key_strengths: Vec<String>,
}

/// A validated "generate content pack" request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub topic: String,
    pub niche: String,
    pub target_audience: String,
    pub tone: Tone,
    pub platform: Platform,
    pub language: String,
    pub key_strengths: Vec<String>,
    pub reference_url: Option<String>,
}

impl GenerateRequest {
    /// Validates a raw body. Runs before any network call.
    pub fn from_body(body: GenerateRequestBody, default_language: &str) -> Result<Self, AppError> {
        let dna = body.dna.unwrap_or_default();
        let topic = required("topic", Some(body.topic))?;
        let niche = required("niche", dna.niche.or(body.niche))?;
        let target_audience =
            required("target_audience", dna.target_audience.or(body.target_audience))?;
        let key_strengths = if dna.key_strengths.is_empty() {
            body.key_strengths
        } else {
            dna.key_strengths
        };

        let tone = match body.tone.as_deref() {
            Some(raw) => raw
                .parse::<Tone>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => Tone::default(),
        };
        let platform = match body.platform.as_deref() {
            Some(raw) => raw
                .parse::<Platform>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => Platform::default(),
        };

        let language = body
            .language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_language.to_string());

        let key_strengths = key_strengths
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let reference_url = body
            .reference_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(GenerateRequest {
            topic,
            niche,
            target_audience,
            tone,
            platform,
            language,
            key_strengths,
            reference_url,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} cannot be empty")))
}

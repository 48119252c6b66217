//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::generation::tone::platform_profile;
use crate::models::language::{text_direction, LanguageOption, LANGUAGES};
use crate::models::pack::ContentPack;
use crate::models::request::{GenerateRequest, GenerateRequestBody, Platform, Tone};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlatformOption {
    pub id: Platform,
    pub name: &'static str,
    pub target_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub tones: Vec<Tone>,
    pub platforms: Vec<PlatformOption>,
    pub languages: Vec<LanguageOption>,
    pub default_language: String,
    /// "ltr" or "rtl" for `default_language`.
    pub default_direction: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// Validates the request, runs the generation pipeline, returns the content pack.
/// Malformed bodies and bad tone/platform values are rejected here, before any
/// network call.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequestBody>, JsonRejection>,
) -> Result<Json<ContentPack>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let request = GenerateRequest::from_body(body, &state.config.default_language)?;
    let pack = state.engine.generate(&request).await?;
    Ok(Json(pack))
}

/// GET /api/v1/options
///
/// Everything a dashboard needs to build its request form.
pub async fn handle_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let default_language = state.config.default_language.clone();
    let default_direction = text_direction(&default_language);

    Json(OptionsResponse {
        tones: Tone::ALL.to_vec(),
        platforms: Platform::ALL
            .iter()
            .map(|&p| PlatformOption {
                id: p,
                name: p.display_name(),
                target_seconds: platform_profile(p).target_seconds,
            })
            .collect(),
        languages: LANGUAGES.to_vec(),
        default_language,
        default_direction,
    })
}

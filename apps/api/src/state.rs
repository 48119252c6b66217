use crate::config::Config;
use crate::generation::generator::ContentEngine;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; nothing here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Generation pipeline with its provider, enrichment sources and candidate list.
    pub engine: ContentEngine,
}

mod config;
mod enrichment;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::enrichment::hashtags::HttpHashtagLookup;
use crate::enrichment::reference::HttpReferenceScraper;
use crate::generation::generator::ContentEngine;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dominator API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_api_base.clone())?;

    // Initialize enrichment sources (disabled ones always answer "nothing")
    let hashtags = HttpHashtagLookup::new(config.hashtags.clone(), config.enrichment_timeout)?;
    let references =
        HttpReferenceScraper::new(config.references.clone(), config.enrichment_timeout)?;
    info!(
        "Enrichment: hashtag lookup {}, reference cloning {}",
        if config.hashtags.is_some() { "on" } else { "off" },
        if config.references.is_some() { "on" } else { "off" }
    );

    let engine = ContentEngine::new(
        Arc::new(llm),
        Arc::new(hashtags),
        Arc::new(references),
        config.model_candidates.clone(),
        config.fallback_pause,
    )
    .with_style_timeout(config.style_timeout);
    info!("Model candidates (in order): {}", engine.candidates().join(", "));

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod candidates;
mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::runtime;
use crate::interview::session::SessionEngine;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize the Gemini client. A missing key is allowed: generation and
    // scoring degrade to their fallback content.
    let llm = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set; model calls will resolve to fallback content");
    } else {
        info!("LLM client initialized (model: {})", config.gemini_model);
    }

    // The session engine starts idle, waiting for a resume upload.
    let engine = Arc::new(RwLock::new(SessionEngine::new(config.default_role.clone())));

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        engine,
    };

    // Drive the question countdown once per second.
    runtime::spawn_tick_loop(state.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

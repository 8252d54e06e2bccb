use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::interview::session::SessionEngine;
use crate::llm_client::GeminiClient;

/// The single live interview session, shared between the HTTP handlers and
/// the background tick loop.
pub type SharedEngine = Arc<RwLock<SessionEngine>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: GeminiClient,
    pub config: Config,
    pub engine: SharedEngine,
}

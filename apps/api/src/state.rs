use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The LLM Gateway. A trait object so tests can swap in a canned client.
    pub llm: Arc<dyn LlmGateway>,
    #[allow(dead_code)]
    pub config: Config,
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        // Analysis API
        .route("/api/v1/analyses", get(handlers::handle_list_analyses))
        .route("/api/v1/analyses/stats", get(handlers::handle_analysis_stats))
        .route("/api/v1/analyses/analyze", post(handlers::handle_analyze))
        .route("/api/v1/analyses/reanalyze", post(handlers::handle_reanalyze))
        .route("/api/v1/analyses/dream-job", post(handlers::handle_dream_job))
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        .with_state(state)
}

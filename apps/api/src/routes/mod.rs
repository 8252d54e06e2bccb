pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::candidates::handlers as admin;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate-facing interview flow
        .route(
            "/api/v1/interview/resume",
            post(interview::handle_upload_resume),
        )
        .route(
            "/api/v1/interview/session",
            get(interview::handle_get_session),
        )
        .route(
            "/api/v1/interview/message",
            post(interview::handle_post_message),
        )
        .route(
            "/api/v1/interview/reset",
            post(interview::handle_reset_session),
        )
        // Interviewer controls (admin-gated)
        .route("/api/v1/interview/role", put(interview::handle_set_role))
        .route(
            "/api/v1/interviews",
            get(admin::handle_list_interviews).delete(admin::handle_purge_interviews),
        )
        .with_state(state)
}

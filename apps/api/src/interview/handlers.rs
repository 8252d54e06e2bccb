use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::candidates::handlers::require_admin;
use crate::errors::AppError;
use crate::interview::runtime;
use crate::interview::session::SessionView;
use crate::resume;
use crate::state::AppState;

/// POST /api/v1/interview/resume
///
/// Accepts a multipart upload (`file` field), extracts contact fields from
/// the resume, and starts a fresh session bound to a new candidate.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
            file = Some((content_type, data.to_vec()));
        }
    }

    let (mime, data) =
        file.ok_or_else(|| AppError::Validation("Multipart field 'file' is required".to_string()))?;

    let details = resume::extract_candidate_fields(&data, &mime)?;
    info!(
        "resume processed: name={:?}, email={:?}, phone={:?}",
        details.name, details.email, details.phone
    );

    let commands = state.engine.write().await.start_session(details);
    runtime::execute(&state, commands);

    Ok(Json(state.engine.read().await.view()))
}

/// GET /api/v1/interview/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.engine.read().await.view())
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// POST /api/v1/interview/message
///
/// Routes one candidate chat message through the state machine: a contact
/// field during collection, an answer during the interview.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<SessionView>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "Message text must not be empty".to_string(),
        ));
    }

    let commands = state.engine.write().await.handle_user_message(text);
    runtime::execute(&state, commands);

    Ok(Json(state.engine.read().await.view()))
}

/// POST /api/v1/interview/reset — explicit discard of the live session.
pub async fn handle_reset_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut engine = state.engine.write().await;
    engine.reset();
    Json(engine.view())
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// PUT /api/v1/interview/role — interviewer-set role for question generation.
pub async fn handle_set_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RoleRequest>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;

    let role = req.role.trim();
    if role.is_empty() {
        return Err(AppError::Validation("Role must not be empty".to_string()));
    }

    state.engine.write().await.set_role(role.to_string());
    Ok(StatusCode::NO_CONTENT)
}

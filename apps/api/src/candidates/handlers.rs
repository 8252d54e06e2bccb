use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::info;

use crate::candidates::models::InterviewRow;
use crate::candidates::repo;
use crate::errors::AppError;
use crate::state::AppState;

const ADMIN_HEADER: &str = "x-admin-secret";

/// Shared-secret gate for the interviewer dashboard and destructive
/// operations. A thin comparison against the configured value.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided != state.config.admin_secret {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// GET /api/v1/interviews — interviewer view of all past candidates.
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    require_admin(&state, &headers)?;
    let rows = repo::list_interviews(&state.db).await?;
    Ok(Json(rows))
}

/// DELETE /api/v1/interviews — bulk purge of all candidate records.
pub async fn handle_purge_interviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let removed = repo::purge_all(&state.db).await?;
    info!("purged {removed} interview records");
    Ok(StatusCode::NO_CONTENT)
}

//! Durable interview records.
//!
//! Ids are derived from the candidate name plus the creation timestamp —
//! readable and traceable rather than random.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::candidates::models::InterviewRow;
use crate::errors::AppError;
use crate::interview::session::CandidateSnapshot;

/// `<name-slug>__<yyyymmddHHMMSS>`; "unknown" when no name was collected.
pub fn make_interview_id(name: Option<&str>, created_at: DateTime<Utc>) -> String {
    let base = slugify(name.unwrap_or("unknown"));
    format!("{base}__{}", created_at.format("%Y%m%d%H%M%S"))
}

fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Persists a completed interview snapshot and returns its id.
pub async fn save_interview(pool: &PgPool, snapshot: &CandidateSnapshot) -> Result<String, AppError> {
    let created_at = Utc::now();
    let id = make_interview_id(snapshot.candidate.name.as_deref(), created_at);

    let questions = serde_json::to_value(&snapshot.questions)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize questions: {e}")))?;
    let answers = serde_json::to_value(&snapshot.answers)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize answers: {e}")))?;
    let chat_history = serde_json::to_value(&snapshot.candidate.chat_history).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to serialize chat history: {e}"))
    })?;

    sqlx::query(
        r#"
        INSERT INTO interviews
            (id, candidate_name, email, phone, score, summary, status,
             questions, answers, chat_history, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&id)
    .bind(&snapshot.candidate.name)
    .bind(&snapshot.candidate.email)
    .bind(&snapshot.candidate.phone)
    .bind(snapshot.candidate.score.map(i32::from))
    .bind(&snapshot.candidate.summary)
    .bind(snapshot.candidate.status.as_str())
    .bind(&questions)
    .bind(&answers)
    .bind(&chat_history)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(id)
}

/// All interview records, newest first.
pub async fn list_interviews(pool: &PgPool) -> Result<Vec<InterviewRow>, AppError> {
    let rows: Vec<InterviewRow> =
        sqlx::query_as("SELECT * FROM interviews ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

/// Removes every record. A single statement, so the caller never observes a
/// partial deletion.
pub async fn purge_all(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM interviews").execute(pool).await?;
    Ok(result.rows_affected())
}

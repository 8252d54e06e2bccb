use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// One completed interview, as stored. Questions, answers, and the chat log
/// are kept as JSON so the interviewer view can replay the session verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    /// Deterministic `<name-slug>__<yyyymmddHHMMSS>` id.
    pub id: String,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub score: Option<i32>,
    pub summary: Option<String>,
    pub status: String,
    pub questions: Value,
    pub answers: Value,
    pub chat_history: Value,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub created_at: DateTime<Utc>,
}

/// One turn of the transcript as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptMessage {
    pub text: String,
    pub is_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<TranscriptMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

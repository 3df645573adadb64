use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::services::burnout::RiskLevel;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Set exactly once, when the background reframe generation completes.
    pub reframe: Option<String>,
    /// Burnout risk snapshot taken at the moment the entry was written.
    pub burnout_level: Option<RiskLevel>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalRequest {
    #[validate(length(min = 1, max = 20000, message = "Entry must be 1-20000 characters"))]
    pub content: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AudioBoost {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub duration_secs: i32,
    pub is_premium: bool,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub allowed: bool,
    pub audio_url: String,
    /// None for paid tiers (unlimited plays).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_plays_today: Option<i32>,
}

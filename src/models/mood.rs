use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertMoodRequest {
    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 100, message = "Mood value must be 0-100"))]
    pub value: i32,
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    /// How many days back to return. Default: 30.
    pub days: Option<i64>,
}

impl MoodQuery {
    pub fn days_back(&self) -> i64 {
        self.days.unwrap_or(30).clamp(1, 365)
    }
}

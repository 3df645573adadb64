use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood::{MoodEntry, MoodQuery, UpsertMoodRequest};
use crate::services::burnout::{self, RiskLevel};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub risk: RiskLevel,
    pub sample_count: usize,
    pub tip: &'static str,
}

/// One mood sample per calendar day; a second save for the same day
/// overwrites the previous value.
pub async fn upsert_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertMoodRequest>,
) -> AppResult<Json<MoodEntry>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry_date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    if entry_date > Utc::now().date_naive() {
        return Err(AppError::Validation("Cannot log mood for a future day".into()));
    }

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (id, user_id, entry_date, value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, entry_date) DO UPDATE SET
            value = $4,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(entry_date)
    .bind(body.value)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let start = Utc::now().date_naive() - chrono::Duration::days(query.days_back());

    let entries = sqlx::query_as::<_, MoodEntry>(
        r#"
        SELECT * FROM mood_entries
        WHERE user_id = $1 AND entry_date >= $2
        ORDER BY entry_date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn burnout_risk(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<RiskResponse>> {
    let values = recent_mood_values(&state.db, auth_user.id).await?;
    let risk = burnout::evaluate(&values);

    Ok(Json(RiskResponse {
        risk,
        sample_count: values.len(),
        tip: risk.tip(),
    }))
}

/// Most recent mood values for a user, oldest first, capped at the
/// scoring window. Shared with the journal handler for its snapshot.
pub async fn recent_mood_values(db: &sqlx::PgPool, user_id: Uuid) -> AppResult<Vec<i32>> {
    let mut values = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT value FROM mood_entries
        WHERE user_id = $1
        ORDER BY entry_date DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(burnout::WINDOW_SIZE as i64)
    .fetch_all(db)
    .await?;

    values.reverse();
    Ok(values)
}

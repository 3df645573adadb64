use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::audio::{AudioBoost, PlayResponse};
use crate::models::user::User;
use crate::services::gate;
use crate::AppState;

pub async fn list_boosts(State(state): State<AppState>) -> AppResult<Json<Vec<AudioBoost>>> {
    let boosts = sqlx::query_as::<_, AudioBoost>(
        "SELECT * FROM audio_boosts ORDER BY is_premium ASC, title ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(boosts))
}

/// Admission check for a play. Free-tier users get a small daily quota
/// and no premium clips; the counter resets lazily on the first play of
/// a new day.
pub async fn play_boost(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(boost_id): Path<Uuid>,
) -> AppResult<Json<PlayResponse>> {
    let boost = sqlx::query_as::<_, AudioBoost>("SELECT * FROM audio_boosts WHERE id = $1")
        .bind(boost_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Audio boost not found".into()))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let today = Utc::now().date_naive();
    let plays_today = if user.audio_plays_date == Some(today) {
        user.audio_plays_today
    } else {
        0
    };

    let quota = state.config.free_audio_plays_per_day;
    if let Err(denial) = gate::check_audio_play(user.tier, plays_today, boost.is_premium, quota) {
        tracing::debug!(user_id = %user.id, boost_id = %boost.id, reason = ?denial, "Audio play denied");
        return Err(AppError::Validation(denial.message().into()));
    }

    let new_count = plays_today + 1;
    sqlx::query(
        r#"
        UPDATE users
        SET audio_plays_today = $2, audio_plays_date = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(new_count)
    .bind(today)
    .execute(&state.db)
    .await?;

    let remaining = if user.tier.is_paid() {
        None
    } else {
        Some((quota - new_count).max(0))
    };

    Ok(Json(PlayResponse {
        allowed: true,
        audio_url: boost.audio_url,
        remaining_plays_today: remaining,
    }))
}

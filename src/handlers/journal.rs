use axum::{extract::State, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::chat::TranscriptMessage;
use crate::models::journal::{CreateJournalRequest, JournalEntry};
use crate::services::burnout;
use crate::AppState;

const REFRAME_PROMPT: &str = "You are a supportive workplace-wellbeing coach. The user \
will share a journal entry about their workday. Respond with a single short paragraph \
(2-3 sentences) that reframes the entry in a constructive, validating way. Acknowledge \
the difficulty, then highlight a strength or a concrete next step. Do not give medical \
advice.";

/// Canned reframes used when the completion API is unavailable, so an
/// entry is always eventually reframed.
const FALLBACK_REFRAMES: &[&str] = &[
    "While today presented challenges, I notice you practiced resilience by persisting \
     through difficult tasks. Consider how this strengthens your professional \
     capabilities over time.",
    "I see that you're experiencing frustration, which shows you care deeply about \
     your work. This passion, when channeled constructively, can drive meaningful \
     improvements.",
    "The obstacles you faced today are temporary learning opportunities. Each \
     challenge is developing problem-solving skills that will serve you throughout \
     your career.",
    "You've identified specific workplace tensions, which demonstrates your emotional \
     intelligence. This awareness can be leveraged to improve team dynamics and \
     communication.",
    "Your reflection shows conscientiousness about your performance. Remember that \
     growth isn't linear; today's struggles are building tomorrow's strengths.",
];

/// Create a journal entry. The burnout snapshot is computed from the
/// user's recent moods at write time; reframe generation runs in the
/// background and mutates the entry exactly once when it completes.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mood_values = super::mood::recent_mood_values(&state.db, auth_user.id).await?;
    let burnout_level = burnout::evaluate(&mood_values);

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (id, user_id, content, burnout_level)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.content)
    .bind(burnout_level)
    .fetch_one(&state.db)
    .await?;

    spawn_reframe_task(state.clone(), entry.id, body.content);

    Ok(Json(entry))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = sqlx::query_as::<_, JournalEntry>(
        r#"
        SELECT * FROM journal_entries
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

fn spawn_reframe_task(state: AppState, entry_id: Uuid, content: String) {
    tokio::spawn(async move {
        let transcript = vec![TranscriptMessage {
            text: content,
            is_user: true,
        }];

        let reframe = match super::chat::complete(&state, REFRAME_PROMPT, &transcript).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(entry_id = %entry_id, error = %e, "Reframe generation failed, using fallback");
                pick_fallback_reframe().to_string()
            }
        };

        // Guarded on `reframe IS NULL` so the entry is only mutated once.
        let result = sqlx::query(
            r#"
            UPDATE journal_entries
            SET reframe = $2
            WHERE id = $1 AND reframe IS NULL
            "#,
        )
        .bind(entry_id)
        .bind(&reframe)
        .execute(&state.db)
        .await;

        if let Err(e) = result {
            tracing::error!(entry_id = %entry_id, error = %e, "Failed to store reframe");
        }
    });
}

fn pick_fallback_reframe() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..FALLBACK_REFRAMES.len());
    FALLBACK_REFRAMES[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_reframe_comes_from_the_catalog() {
        for _ in 0..20 {
            let picked = pick_fallback_reframe();
            assert!(FALLBACK_REFRAMES.contains(&picked));
        }
    }
}

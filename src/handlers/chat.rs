use axum::{extract::State, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::chat::{ChatMessage, ChatRequest, ChatResponse, TranscriptMessage};
use crate::models::user::User;
use crate::services::gate;
use crate::AppState;

/// Fixed system prompt for the vent companion. The model is a listener,
/// not a clinician.
const SYSTEM_PROMPT: &str = "You are an empathetic AI companion focused on workplace \
wellbeing. Your goal is to:\n\
- Listen actively and validate feelings\n\
- Help identify workplace stressors\n\
- Suggest practical coping strategies\n\
- Maintain a professional, supportive tone\n\
- Focus on work-related challenges\n\
- Never give medical advice\n\
- Encourage professional help when needed\n\n\
If someone expresses serious mental health concerns, always recommend speaking \
with a qualified mental health professional.";

/// Relay one chat turn: gate on subscription/trial state, forward the
/// transcript to the completion API, persist both sides of the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !gate::can_access_chat(user.tier, user.trial_ends_at, Utc::now()) {
        return Err(AppError::Forbidden);
    }

    let last_user_text = closing_user_text(&body.messages)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Transcript must end with a user message".into()))?;

    let reply = complete(&state, SYSTEM_PROMPT, &body.messages).await?;

    // Append-only transcript: user turn first, then the reply.
    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, user_id, text, is_user)
        VALUES ($1, $2, $3, true), ($4, $2, $5, false)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&last_user_text)
    .bind(Uuid::new_v4())
    .bind(&reply)
    .execute(&state.db)
    .await?;

    Ok(Json(ChatResponse { response: reply }))
}

/// The turn to persist is the transcript's final message, and it must be
/// from the user. A transcript closing with an assistant turn would
/// re-persist a user message that was already stored on a prior call.
fn closing_user_text(messages: &[TranscriptMessage]) -> Option<&str> {
    messages
        .last()
        .filter(|m| m.is_user)
        .map(|m| m.text.as_str())
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    let messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT * FROM chat_messages
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(messages))
}

/// Forward a transcript to the completion API. Any upstream problem
/// collapses into a single generic error; callers decide whether to
/// propagate or fall back.
pub async fn complete(
    state: &AppState,
    system_prompt: &str,
    transcript: &[TranscriptMessage],
) -> AppResult<String> {
    let messages: Vec<serde_json::Value> = transcript
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": if m.is_user { "user" } else { "assistant" },
                "content": m.text,
            })
        })
        .collect();

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client: {}", e)))?;

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &state.config.claude_api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": state.config.claude_model,
            "max_tokens": 300,
            "system": system_prompt,
            "messages": messages,
        }))
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Completion request failed");
            AppError::Upstream
        })?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::warn!(status = %status, "Completion API returned an error");
        return Err(AppError::Upstream);
    }

    let payload: serde_json::Value = response.json().await.map_err(|e| {
        tracing::warn!(error = %e, "Completion response was not valid JSON");
        AppError::Upstream
    })?;

    payload["content"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or(AppError::Upstream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(text: &str, is_user: bool) -> TranscriptMessage {
        TranscriptMessage {
            text: text.into(),
            is_user,
        }
    }

    #[test]
    fn accepts_a_transcript_ending_with_a_user_turn() {
        let messages = vec![
            turn("hi", true),
            turn("hello, how are you feeling?", false),
            turn("overwhelmed by deadlines", true),
        ];
        assert_eq!(
            closing_user_text(&messages),
            Some("overwhelmed by deadlines")
        );
    }

    #[test]
    fn rejects_a_transcript_ending_with_an_assistant_turn() {
        // An earlier user turn is not enough; the closing message decides.
        let messages = vec![turn("hi", true), turn("hello", false)];
        assert_eq!(closing_user_text(&messages), None);
    }

    #[test]
    fn rejects_an_empty_transcript() {
        assert_eq!(closing_user_text(&[]), None);
    }
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::lesson::{self, LessonWithStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CompleteLessonRequest {
    pub selected_option: i32,
}

#[derive(Debug, Serialize)]
pub struct CompleteLessonResponse {
    pub correct: bool,
    pub explanation: &'static str,
    pub completed: bool,
}

pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<LessonWithStatus>>> {
    let completed_ids = sqlx::query_scalar::<_, String>(
        "SELECT lesson_id FROM lesson_completions WHERE user_id = $1",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let lessons = lesson::catalog()
        .iter()
        .map(|l| LessonWithStatus {
            lesson: l.clone(),
            completed: completed_ids.iter().any(|id| id == l.id),
        })
        .collect();

    Ok(Json(lessons))
}

/// Submit a quiz answer. Any answer completes the lesson; correctness is
/// reported back along with the explanation.
pub async fn complete_lesson(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
    Json(body): Json<CompleteLessonRequest>,
) -> AppResult<Json<CompleteLessonResponse>> {
    let lesson =
        lesson::find(&lesson_id).ok_or(AppError::NotFound("Lesson not found".into()))?;

    if !(0..lesson.quiz.options.len() as i32).contains(&body.selected_option) {
        return Err(AppError::Validation("Selected option is out of range".into()));
    }

    let correct = body.selected_option == lesson.quiz.correct_index;

    // Re-submissions keep the first recorded answer.
    sqlx::query(
        r#"
        INSERT INTO lesson_completions (user_id, lesson_id, selected_option, correct)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, lesson_id) DO NOTHING
        "#,
    )
    .bind(auth_user.id)
    .bind(lesson.id)
    .bind(body.selected_option)
    .bind(correct)
    .execute(&state.db)
    .await?;

    Ok(Json(CompleteLessonResponse {
        correct,
        explanation: lesson.quiz.explanation,
        completed: true,
    }))
}

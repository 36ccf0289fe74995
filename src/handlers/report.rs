// src/handlers/report.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    report::{ReportError, ScoreRecord, build_report},
    utils::jwt::Claims,
};

/// Builds the current user's performance report.
///
/// The report is recomputed from score rows on every request; nothing is
/// cached or persisted. An empty history is a valid empty-state response,
/// not an error.
pub async fn student_report(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id;

    let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    // LEFT JOINs so a deleted curriculum node surfaces as NULL names rather
    // than silently dropping the row; the aggregator's policy decides.
    let records = sqlx::query_as::<_, ScoreRecord>(
        r#"
        SELECT s.quiz_id,
               m.title AS material_title,
               q.level,
               subj.name AS subject_name,
               ch.name AS chapter_name,
               sub.name AS subchapter_name,
               s.score,
               s.completed_at
        FROM quiz_scores s
        JOIN quizzes q ON s.quiz_id = q.id
        JOIN study_materials m ON q.material_id = m.id
        LEFT JOIN subchapters sub ON m.subchapter_id = sub.id
        LEFT JOIN chapters ch ON sub.chapter_id = ch.id
        LEFT JOIN subjects subj ON ch.subject_id = subj.id
        WHERE s.user_id = $1
        ORDER BY s.id
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let outcome = build_report(&username, &records, config.dangling_policy, Utc::now())
        .map_err(|e| match e {
            ReportError::DanglingReference { quiz_id } => AppError::DanglingReference(format!(
                "quiz {} references a deleted curriculum node",
                quiz_id
            )),
        })?;

    Ok(Json(outcome))
}

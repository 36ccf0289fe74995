// src/handlers/score.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::score::{CreateScoreRequest, LeaderboardEntry, QuizScore, rank_leaderboard},
    utils::jwt::Claims,
};

/// Records a completed quiz attempt for the current user.
pub async fn submit_score(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1")
        .bind(payload.quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let score = sqlx::query_as::<_, QuizScore>(
        r#"
        INSERT INTO quiz_scores (user_id, quiz_id, score, time_taken, answers)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, quiz_id, score, time_taken, answers, completed_at
        "#,
    )
    .bind(claims.user_id)
    .bind(payload.quiz_id)
    .bind(payload.score)
    .bind(&payload.time_taken)
    .bind(SqlJson(&payload.answers))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record score: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(score)))
}

#[derive(Debug, Deserialize)]
pub struct ScoreListParams {
    pub quiz_id: Option<i64>,
}

/// Lists quiz scores. Students see their own; teachers see everyone's.
pub async fn list_scores(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ScoreListParams>,
) -> Result<impl IntoResponse, AppError> {
    let scope_user = if claims.role.is_teacher() {
        None
    } else {
        Some(claims.user_id)
    };

    let scores = sqlx::query_as::<_, QuizScore>(
        r#"
        SELECT id, user_id, quiz_id, score, time_taken, answers, completed_at
        FROM quiz_scores
        WHERE ($1::BIGINT IS NULL OR user_id = $1)
          AND ($2::BIGINT IS NULL OR quiz_id = $2)
        ORDER BY completed_at DESC
        "#,
    )
    .bind(scope_user)
    .bind(params.quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(scores))
}

/// Top 10 scores across a material's quizzes.
///
/// Ordered by score descending; equal scores are broken by completion time
/// ascending, parsed from the "M:SS" form rather than compared as strings.
pub async fn material_leaderboard(
    State(pool): State<PgPool>,
    Path(material_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM study_materials WHERE id = $1")
        .bind(material_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Study material not found".to_string()))?;

    let quiz_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM quizzes WHERE material_id = $1",
    )
    .bind(material_id)
    .fetch_one(&pool)
    .await?;

    if quiz_count == 0 {
        return Err(AppError::NotFound(
            "No quizzes found for this material".to_string(),
        ));
    }

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT u.username, s.quiz_id, q.level, s.score, s.time_taken, s.completed_at
        FROM quiz_scores s
        JOIN quizzes q ON s.quiz_id = q.id
        JOIN users u ON s.user_id = u.id
        WHERE q.material_id = $1
        ORDER BY s.id
        "#,
    )
    .bind(material_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rank_leaderboard(entries)))
}

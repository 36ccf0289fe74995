// src/handlers/quiz.rs

use std::path::PathBuf;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    config::Config,
    error::AppError,
    handlers::material::fetch_material,
    models::quiz::{GenerateQuizRequest, LEVELS, Quiz, QuizDetail},
    openai::{DEFAULT_QUESTION_COUNT, LlmClient},
    utils::extract::extract_text,
};

/// Generates a quiz from a study material at the requested difficulty.
///
/// Idempotent per (material, level): when a quiz already exists it is
/// returned as-is and generation is skipped. Otherwise the document text is
/// extracted, handed to the LLM collaborator, and the resulting questions
/// are persisted.
pub async fn generate_quiz(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(llm): State<LlmClient>,
    Path(material_id): Path<i64>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !LEVELS.contains(&payload.level.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid level '{}'; expected one of {:?}",
            payload.level, LEVELS
        )));
    }

    let material = fetch_material(&pool, material_id).await?;

    // Existence check is the idempotence policy; generation itself is not
    // aware of it.
    if let Some(quiz) = find_quiz(&pool, material_id, &payload.level).await? {
        tracing::info!(quiz_id = quiz.id, "quiz already exists, skipping generation");
        return Ok((StatusCode::OK, Json(QuizDetail::new(quiz, material))));
    }

    let full_path = PathBuf::from(&config.media_root).join(&material.document_path);
    let file_type = material.file_type.clone();
    let text = tokio::task::spawn_blocking(move || extract_text(&full_path, &file_type))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .map_err(|e| AppError::ExtractionFailure(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(AppError::ExtractionFailure(format!(
            "document for material {} contained no extractable text",
            material_id
        )));
    }

    let questions = llm
        .generate_quiz(&text, &payload.level, DEFAULT_QUESTION_COUNT)
        .await;

    if questions.is_empty() {
        return Err(AppError::GenerationFailure(format!(
            "collaborator returned no usable questions for material {}",
            material_id
        )));
    }

    let inserted = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes (material_id, level, questions)
        VALUES ($1, $2, $3)
        RETURNING id, material_id, level, questions, created_at
        "#,
    )
    .bind(material_id)
    .bind(&payload.level)
    .bind(SqlJson(&questions))
    .fetch_one(&pool)
    .await;

    let quiz = match inserted {
        Ok(quiz) => quiz,
        Err(e) => {
            // A concurrent generate for the same (material, level) can slip
            // past the existence check; the UNIQUE index decides the race
            // and the loser returns the winner's quiz.
            let unique_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == "23505");
            if !unique_violation {
                return Err(e.into());
            }

            let quiz = find_quiz(&pool, material_id, &payload.level)
                .await?
                .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
            tracing::info!(
                quiz_id = quiz.id,
                "lost generation race, returning existing quiz"
            );
            return Ok((StatusCode::OK, Json(QuizDetail::new(quiz, material))));
        }
    };

    tracing::info!(
        quiz_id = quiz.id,
        level = %quiz.level,
        question_count = questions.len(),
        "quiz generated"
    );

    Ok((StatusCode::CREATED, Json(QuizDetail::new(quiz, material))))
}

async fn find_quiz(pool: &PgPool, material_id: i64, level: &str) -> Result<Option<Quiz>, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, material_id, level, questions, created_at
        FROM quizzes
        WHERE material_id = $1 AND level = $2
        "#,
    )
    .bind(material_id)
    .bind(level)
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}

#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub material_id: Option<i64>,
    pub level: Option<String>,
}

/// Lists quizzes, optionally filtered by material and level.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, material_id, level, questions, created_at
        FROM quizzes
        WHERE ($1::BIGINT IS NULL OR material_id = $1)
          AND ($2::TEXT IS NULL OR level = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(params.material_id)
    .bind(&params.level)
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

/// Retrieves a single quiz with its source material expanded.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, material_id, level, questions, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let material = fetch_material(&pool, quiz.material_id).await?;

    Ok(Json(QuizDetail::new(quiz, material)))
}

// src/handlers/curriculum.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::curriculum::{
        Chapter, ChapterRequest, Subchapter, SubchapterRequest, Subject, SubjectRequest, ViewKind,
        chapter_view, subchapter_view,
    },
};

// --- Subjects ---

/// Lists all subjects, ordered by name.
pub async fn list_subjects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        "SELECT id, name, description, created_at FROM subjects ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(subjects))
}

/// Retrieves a single subject by ID.
pub async fn get_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = sqlx::query_as::<_, Subject>(
        "SELECT id, name, description, created_at FROM subjects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Creates a new subject. Teacher only.
pub async fn create_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        INSERT INTO subjects (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create subject: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Updates a subject. Teacher only.
pub async fn update_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        UPDATE subjects SET name = $1, description = $2
        WHERE id = $3
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Deletes a subject and, by cascade, everything beneath it. Teacher only.
pub async fn delete_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Chapters ---

#[derive(Debug, Deserialize)]
pub struct ChapterListParams {
    pub subject_id: Option<i64>,
}

/// Lists chapters, optionally filtered by subject.
pub async fn list_chapters(
    State(pool): State<PgPool>,
    Query(params): Query<ChapterListParams>,
) -> Result<impl IntoResponse, AppError> {
    let chapters = sqlx::query_as::<_, Chapter>(
        r#"
        SELECT id, subject_id, name, description, position, created_at
        FROM chapters
        WHERE ($1::BIGINT IS NULL OR subject_id = $1)
        ORDER BY position, name
        "#,
    )
    .bind(params.subject_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(chapters))
}

/// Retrieves a single chapter with its parent subject expanded.
pub async fn get_chapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let chapter = fetch_chapter(&pool, id).await?;

    let subject = sqlx::query_as::<_, Subject>(
        "SELECT id, name, description, created_at FROM subjects WHERE id = $1",
    )
    .bind(chapter.subject_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(chapter_view(ViewKind::Detail, chapter, subject)))
}

/// Creates a new chapter. Teacher only.
pub async fn create_chapter(
    State(pool): State<PgPool>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_subject_exists(&pool, payload.subject_id).await?;

    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
        INSERT INTO chapters (subject_id, name, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, subject_id, name, description, position, created_at
        "#,
    )
    .bind(payload.subject_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.position)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Updates a chapter. Teacher only.
pub async fn update_chapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_subject_exists(&pool, payload.subject_id).await?;

    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
        UPDATE chapters SET subject_id = $1, name = $2, description = $3, position = $4
        WHERE id = $5
        RETURNING id, subject_id, name, description, position, created_at
        "#,
    )
    .bind(payload.subject_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.position)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    Ok(Json(chapter))
}

/// Deletes a chapter. Teacher only.
pub async fn delete_chapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM chapters WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Subchapters ---

#[derive(Debug, Deserialize)]
pub struct SubchapterListParams {
    pub chapter_id: Option<i64>,
}

/// Lists subchapters, optionally filtered by chapter.
pub async fn list_subchapters(
    State(pool): State<PgPool>,
    Query(params): Query<SubchapterListParams>,
) -> Result<impl IntoResponse, AppError> {
    let subchapters = sqlx::query_as::<_, Subchapter>(
        r#"
        SELECT id, chapter_id, name, description, position, created_at
        FROM subchapters
        WHERE ($1::BIGINT IS NULL OR chapter_id = $1)
        ORDER BY position, name
        "#,
    )
    .bind(params.chapter_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(subchapters))
}

/// Retrieves a single subchapter with its parent chapter expanded.
pub async fn get_subchapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subchapter = fetch_subchapter(&pool, id).await?;

    let chapter = sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description, position, created_at FROM chapters WHERE id = $1",
    )
    .bind(subchapter.chapter_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(subchapter_view(ViewKind::Detail, subchapter, chapter)))
}

/// Creates a new subchapter. Teacher only.
pub async fn create_subchapter(
    State(pool): State<PgPool>,
    Json(payload): Json<SubchapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    fetch_chapter(&pool, payload.chapter_id).await?;

    let subchapter = sqlx::query_as::<_, Subchapter>(
        r#"
        INSERT INTO subchapters (chapter_id, name, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, chapter_id, name, description, position, created_at
        "#,
    )
    .bind(payload.chapter_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.position)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(subchapter)))
}

/// Updates a subchapter. Teacher only.
pub async fn update_subchapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubchapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    fetch_chapter(&pool, payload.chapter_id).await?;

    let subchapter = sqlx::query_as::<_, Subchapter>(
        r#"
        UPDATE subchapters SET chapter_id = $1, name = $2, description = $3, position = $4
        WHERE id = $5
        RETURNING id, chapter_id, name, description, position, created_at
        "#,
    )
    .bind(payload.chapter_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.position)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Subchapter not found".to_string()))?;

    Ok(Json(subchapter))
}

/// Deletes a subchapter. Teacher only.
pub async fn delete_subchapter(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subchapters WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subchapter not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Shared lookups ---

async fn ensure_subject_exists(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;
    Ok(())
}

pub(crate) async fn fetch_chapter(pool: &PgPool, id: i64) -> Result<Chapter, AppError> {
    sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description, position, created_at FROM chapters WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Chapter not found".to_string()))
}

pub(crate) async fn fetch_subchapter(pool: &PgPool, id: i64) -> Result<Subchapter, AppError> {
    sqlx::query_as::<_, Subchapter>(
        "SELECT id, chapter_id, name, description, position, created_at FROM subchapters WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Subchapter not found".to_string()))
}

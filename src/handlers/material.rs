// src/handlers/material.rs

use std::path::{Path as FsPath, PathBuf};

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    handlers::curriculum::{fetch_chapter, fetch_subchapter},
    models::{
        curriculum::SubchapterDetail,
        material::{StudyMaterial, StudyMaterialDetail, human_file_size},
        user::UserSummary,
    },
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct MaterialListParams {
    pub subchapter_id: Option<i64>,
}

/// Lists study materials, newest first, optionally filtered by subchapter.
pub async fn list_materials(
    State(pool): State<PgPool>,
    Query(params): Query<MaterialListParams>,
) -> Result<impl IntoResponse, AppError> {
    let materials = sqlx::query_as::<_, StudyMaterial>(
        r#"
        SELECT id, subchapter_id, title, description, document_path,
               file_type, file_size, uploaded_by, created_at
        FROM study_materials
        WHERE ($1::BIGINT IS NULL OR subchapter_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(params.subchapter_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(materials))
}

/// Retrieves a single material with subchapter chain and uploader expanded.
pub async fn get_material(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let material = fetch_material(&pool, id).await?;
    let subchapter = subchapter_detail(&pool, material.subchapter_id).await?;

    let uploaded_by = match material.uploaded_by {
        Some(user_id) => {
            sqlx::query_as::<_, UserSummary>("SELECT id, username FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&pool)
                .await?
        }
        None => None,
    };

    Ok(Json(StudyMaterialDetail::new(material, subchapter, uploaded_by)))
}

/// Uploads a study material document (PDF/DOCX). Teacher only.
///
/// Multipart fields: `subchapter_id`, `title`, optional `description`, and
/// the `document` file. File type is derived from the original file name,
/// size is recorded in human-readable form, and the file is stored under
/// the media root with a unique prefix.
pub async fn upload_material(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut subchapter_id: Option<i64> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("subchapter_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                subchapter_id = Some(
                    raw.parse()
                        .map_err(|_| AppError::BadRequest("Invalid subchapter_id".to_string()))?,
                );
            }
            Some("title") => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("description") => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            Some("document") => {
                file_name = field.file_name().map(|n| n.to_string());
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let subchapter_id =
        subchapter_id.ok_or(AppError::BadRequest("subchapter_id is required".to_string()))?;
    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::BadRequest("title is required".to_string()))?;
    let file_name = file_name.ok_or(AppError::BadRequest("document is required".to_string()))?;
    let file_bytes = file_bytes.ok_or(AppError::BadRequest("document is required".to_string()))?;

    fetch_subchapter(&pool, subchapter_id).await?;

    let file_type = FsPath::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .ok_or(AppError::BadRequest("File has no extension".to_string()))?;

    if !matches!(file_type.as_str(), "pdf" | "doc" | "docx") {
        return Err(AppError::BadRequest(format!(
            "Unsupported file type '{}'; expected pdf, doc or docx",
            file_type
        )));
    }

    let file_size = human_file_size(file_bytes.len() as u64);

    // Unique prefix keeps re-uploads of the same file name from colliding.
    let safe_name: String = file_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let relative_path = format!("study_materials/{}_{}", Uuid::new_v4(), safe_name);

    let full_path = PathBuf::from(&config.media_root).join(&relative_path);
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }
    tokio::fs::write(&full_path, &file_bytes)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let material = sqlx::query_as::<_, StudyMaterial>(
        r#"
        INSERT INTO study_materials
            (subchapter_id, title, description, document_path, file_type, file_size, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, subchapter_id, title, description, document_path,
                  file_type, file_size, uploaded_by, created_at
        "#,
    )
    .bind(subchapter_id)
    .bind(&title)
    .bind(&description)
    .bind(&relative_path)
    .bind(&file_type)
    .bind(&file_size)
    .bind(claims.user_id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(material_id = material.id, file_type = %material.file_type, "material uploaded");

    Ok((StatusCode::CREATED, Json(material)))
}

/// Streams the stored document back as an attachment.
pub async fn download_material(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let material = fetch_material(&pool, id).await?;

    let full_path = PathBuf::from(&config.media_root).join(&material.document_path);
    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|_| AppError::NotFound("Stored file is missing".to_string()))?;

    let download_name = FsPath::new(&material.document_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        ),
    ];

    Ok((headers, bytes))
}

/// Deletes a material record and best-effort removes its file. Teacher only.
pub async fn delete_material(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let material = fetch_material(&pool, id).await?;

    sqlx::query("DELETE FROM study_materials WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    let full_path = PathBuf::from(&config.media_root).join(&material.document_path);
    if let Err(e) = tokio::fs::remove_file(&full_path).await {
        tracing::warn!(material_id = id, error = %e, "could not remove stored file");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_material(pool: &PgPool, id: i64) -> Result<StudyMaterial, AppError> {
    sqlx::query_as::<_, StudyMaterial>(
        r#"
        SELECT id, subchapter_id, title, description, document_path,
               file_type, file_size, uploaded_by, created_at
        FROM study_materials
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Study material not found".to_string()))
}

/// Builds the expanded subchapter projection used by detail views.
pub(crate) async fn subchapter_detail(
    pool: &PgPool,
    id: i64,
) -> Result<SubchapterDetail, AppError> {
    let subchapter = fetch_subchapter(pool, id).await?;
    let chapter = fetch_chapter(pool, subchapter.chapter_id).await?;

    Ok(SubchapterDetail {
        id: subchapter.id,
        chapter,
        name: subchapter.name,
        description: subchapter.description,
        position: subchapter.position,
        created_at: subchapter.created_at,
    })
}

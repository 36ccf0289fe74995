// src/models/material.rs

use serde::Serialize;
use sqlx::prelude::FromRow;

use crate::models::curriculum::SubchapterDetail;
use crate::models::user::UserSummary;

/// Represents the 'study_materials' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyMaterial {
    pub id: i64,
    pub subchapter_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Path of the stored file, relative to the media root.
    #[serde(rename = "document")]
    pub document_path: String,

    /// Declared type recorded at upload time ('pdf', 'docx', ...).
    pub file_type: String,

    /// Human-readable size ("12.40 KB", "1.20 MB").
    pub file_size: String,

    pub uploaded_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Retrieve variant: subchapter chain and uploader expanded.
#[derive(Debug, Serialize)]
pub struct StudyMaterialDetail {
    pub id: i64,
    pub subchapter: SubchapterDetail,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "document")]
    pub document_path: String,
    pub file_type: String,
    pub file_size: String,
    pub uploaded_by: Option<UserSummary>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl StudyMaterialDetail {
    pub fn new(
        material: StudyMaterial,
        subchapter: SubchapterDetail,
        uploaded_by: Option<UserSummary>,
    ) -> Self {
        Self {
            id: material.id,
            subchapter,
            title: material.title,
            description: material.description,
            document_path: material.document_path,
            file_type: material.file_type,
            file_size: material.file_size,
            uploaded_by,
            created_at: material.created_at,
        }
    }
}

/// Formats a byte count the way the upload listing shows it.
pub fn human_file_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        format!("{:.2} KB", kb)
    } else {
        format!("{:.2} MB", kb / 1024.0)
    }
}

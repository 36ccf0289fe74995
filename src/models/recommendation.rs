// src/models/recommendation.rs

use serde::Serialize;
use sqlx::prelude::FromRow;

/// Represents the 'study_recommendations' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyRecommendation {
    pub id: i64,
    pub user_id: i64,

    /// The weakness subchapter this advice targets.
    pub subchapter_id: i64,

    pub recommendation: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

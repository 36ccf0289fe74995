// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::material::StudyMaterial;

pub const LEVELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// One generated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,

    /// Exactly four options; enforced when parsing the collaborator output.
    pub options: Vec<String>,

    /// Must equal one of `options`.
    pub correct_answer: String,

    #[serde(default)]
    pub explanation: String,
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub material_id: i64,

    /// Difficulty tier: 'Beginner', 'Intermediate' or 'Advanced'.
    pub level: String,

    /// Generated questions, stored as a JSON array in the database.
    pub questions: Json<Vec<QuizQuestion>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Retrieve variant: source material expanded.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: i64,
    pub material: StudyMaterial,
    pub level: String,
    pub questions: Json<Vec<QuizQuestion>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl QuizDetail {
    pub fn new(quiz: Quiz, material: StudyMaterial) -> Self {
        Self {
            id: quiz.id,
            material,
            level: quiz.level,
            questions: quiz.questions,
            created_at: quiz.created_at,
        }
    }
}

/// DTO for the generate endpoint body.
#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "Beginner".to_string()
}

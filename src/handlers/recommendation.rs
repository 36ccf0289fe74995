// src/handlers/recommendation.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    config::Config,
    error::AppError,
    models::{quiz::QuizQuestion, recommendation::StudyRecommendation},
    openai::{AnswerReview, LlmClient, PerformanceProfile, QuizHistoryEntry},
    utils::jwt::Claims,
};

/// How many weakness subchapters receive advice, and how many strings each.
const WEAKNESS_TARGETS: usize = 2;
const RECOMMENDATIONS_PER_WEAKNESS: usize = 2;
const RECENT_MATERIALS: usize = 5;
const LABEL_LIMIT: usize = 3;

/// Score history row joined with quiz content and curriculum labels.
#[derive(Debug, sqlx::FromRow)]
struct ScoredAttempt {
    material_id: i64,
    material_title: String,
    level: String,
    score: f64,
    completed_at: chrono::DateTime<chrono::Utc>,
    questions: SqlJson<Vec<QuizQuestion>>,
    answers: Option<SqlJson<Vec<String>>>,
    subject_name: Option<String>,
    chapter_name: Option<String>,
    subchapter_name: Option<String>,
    subchapter_id: Option<i64>,
}

/// A recently attempted material with the user's best score on it.
#[derive(Debug)]
pub struct MaterialOutcome {
    pub label: String,
    pub subchapter_id: i64,
    pub best_score: f64,
}

/// Splits recent materials into strengths and weaknesses against the
/// configured threshold. At most three labels each.
pub fn classify_outcomes(
    recent: &[MaterialOutcome],
    threshold: f64,
) -> (Vec<String>, Vec<(String, i64)>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for outcome in recent {
        if outcome.best_score >= threshold {
            if strengths.len() < LABEL_LIMIT {
                strengths.push(outcome.label.clone());
            }
        } else if weaknesses.len() < LABEL_LIMIT {
            weaknesses.push((outcome.label.clone(), outcome.subchapter_id));
        }
    }
    (strengths, weaknesses)
}

/// Returns the user's study recommendations, generating them on first call.
///
/// Existing rows are returned untouched. Otherwise the user's score history
/// is folded into a performance profile, handed to the LLM collaborator,
/// and the resulting strings are persisted round-robin: two per identified
/// weakness subchapter, top two weaknesses.
pub async fn study_recommendations(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(llm): State<LlmClient>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id;

    let existing = sqlx::query_as::<_, StudyRecommendation>(
        r#"
        SELECT id, user_id, subchapter_id, recommendation, created_at
        FROM study_recommendations
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    if !existing.is_empty() {
        return Ok(Json(existing).into_response());
    }

    let attempts = sqlx::query_as::<_, ScoredAttempt>(
        r#"
        SELECT m.id AS material_id,
               m.title AS material_title,
               q.level,
               s.score,
               s.completed_at,
               q.questions,
               s.answers,
               subj.name AS subject_name,
               ch.name AS chapter_name,
               sub.name AS subchapter_name,
               sub.id AS subchapter_id
        FROM quiz_scores s
        JOIN quizzes q ON s.quiz_id = q.id
        JOIN study_materials m ON q.material_id = m.id
        LEFT JOIN subchapters sub ON m.subchapter_id = sub.id
        LEFT JOIN chapters ch ON sub.chapter_id = ch.id
        LEFT JOIN subjects subj ON ch.subject_id = subj.id
        WHERE s.user_id = $1
        ORDER BY s.completed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    if attempts.is_empty() {
        return Ok(Json(json!({
            "message": "Complete some quizzes to get recommendations"
        }))
        .into_response());
    }

    let avg_score =
        attempts.iter().map(|a| a.score).sum::<f64>() / attempts.len() as f64;

    // Per-question correctness for the prompt.
    let history: Vec<QuizHistoryEntry> = attempts
        .iter()
        .map(|attempt| {
            let answers = attempt.answers.as_ref().map(|a| a.0.as_slice()).unwrap_or(&[]);
            let questions = attempt
                .questions
                .0
                .iter()
                .zip(answers.iter())
                .map(|(question, user_answer)| AnswerReview {
                    question: question.question.clone(),
                    user_answer: user_answer.clone(),
                    correct_answer: question.correct_answer.clone(),
                    is_correct: user_answer == &question.correct_answer,
                })
                .collect();
            QuizHistoryEntry {
                material: attempt.material_title.clone(),
                level: attempt.level.clone(),
                score: attempt.score,
                questions,
            }
        })
        .collect();

    // The 5 most recently attempted materials, best score each, with a
    // resolvable curriculum path.
    let mut recent: Vec<MaterialOutcome> = Vec::new();
    for attempt in &attempts {
        if recent.len() >= RECENT_MATERIALS {
            break;
        }
        let (Some(subject), Some(chapter), Some(subchapter), Some(subchapter_id)) = (
            &attempt.subject_name,
            &attempt.chapter_name,
            &attempt.subchapter_name,
            attempt.subchapter_id,
        ) else {
            continue;
        };
        let label = format!("{} - {} - {}", subject, chapter, subchapter);
        if recent.iter().any(|o| o.label == label) {
            continue;
        }
        let best_score = attempts
            .iter()
            .filter(|a| a.material_id == attempt.material_id)
            .map(|a| a.score)
            .fold(f64::MIN, f64::max);
        recent.push(MaterialOutcome {
            label,
            subchapter_id,
            best_score,
        });
    }

    let (strengths, weaknesses) = classify_outcomes(&recent, config.strength_threshold);

    let profile = PerformanceProfile {
        avg_score,
        strengths,
        weaknesses: weaknesses.iter().map(|(label, _)| label.clone()).collect(),
    };

    let mut recommendations = llm.generate_recommendations(&profile, &history).await;

    if recommendations.is_empty() {
        return Err(AppError::GenerationFailure(
            "collaborator returned no recommendations".to_string(),
        ));
    }

    // Round-robin persistence: two strings per weakness subchapter.
    let mut saved = Vec::new();
    for (_, subchapter_id) in weaknesses.iter().take(WEAKNESS_TARGETS) {
        for recommendation in recommendations
            .drain(..RECOMMENDATIONS_PER_WEAKNESS.min(recommendations.len()))
        {
            let row = sqlx::query_as::<_, StudyRecommendation>(
                r#"
                INSERT INTO study_recommendations (user_id, subchapter_id, recommendation)
                VALUES ($1, $2, $3)
                RETURNING id, user_id, subchapter_id, recommendation, created_at
                "#,
            )
            .bind(user_id)
            .bind(subchapter_id)
            .bind(&recommendation)
            .fetch_one(&pool)
            .await?;
            saved.push(row);
        }
        if recommendations.is_empty() {
            break;
        }
    }

    Ok(Json(saved).into_response())
}

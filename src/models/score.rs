// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quiz_scores' table in the database.
/// One completed quiz attempt; immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizScore {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,

    /// Percentage in [0, 100].
    pub score: f64,

    /// Formatted completion time, e.g. "5:30".
    pub time_taken: String,

    /// The student's raw answers, one per question.
    pub answers: Option<Json<Vec<String>>>,

    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScoreRequest {
    pub quiz_id: i64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
    #[validate(length(min = 1, max = 20))]
    pub time_taken: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Leaderboard row joined from scores, quizzes and users.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub quiz_id: i64,
    pub level: String,
    pub score: f64,
    pub time_taken: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

pub const LEADERBOARD_LIMIT: usize = 10;

/// Parses a "M:SS" (or "H:MM:SS") completion time into seconds.
/// Returns None for anything that does not look like a clock time.
pub fn parse_time_taken(raw: &str) -> Option<u32> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut seconds: u32 = 0;
    for part in &parts {
        let value: u32 = part.parse().ok()?;
        seconds = seconds.checked_mul(60)?.checked_add(value)?;
    }
    Some(seconds)
}

/// Ranks leaderboard entries: score descending, ties broken by completion
/// time ascending (faster ranks higher). "10:00" must not beat "4:00" by
/// string order, so times are compared as parsed seconds; unparseable times
/// rank last among equal scores. Stable, truncated to the top 10.
pub fn rank_leaderboard(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let ta = parse_time_taken(&a.time_taken).unwrap_or(u32::MAX);
                let tb = parse_time_taken(&b.time_taken).unwrap_or(u32::MAX);
                ta.cmp(&tb)
            })
    });
    entries.truncate(LEADERBOARD_LIMIT);
    entries
}

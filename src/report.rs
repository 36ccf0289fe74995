// src/report.rs
//
// Student performance report aggregation. Pure: no queries, no clock, no
// shared state. The handler fetches the score rows and supplies the
// generation timestamp; running this twice on the same input produces
// identical output.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed quiz attempt, joined with its curriculum path.
/// The name fields are `None` when the referenced node has been deleted
/// out from under a historical score.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreRecord {
    pub quiz_id: i64,
    pub material_title: String,
    pub level: String,
    pub subject_name: Option<String>,
    pub chapter_name: Option<String>,
    pub subchapter_name: Option<String>,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

/// What to do with a score whose curriculum path no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Drop the record from the whole report (summary, tree and recent
    /// activity), keeping counts and sums consistent with each other.
    Skip,
    /// Abort the report.
    Fail,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReportError {
    DanglingReference { quiz_id: i64 },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::DanglingReference { quiz_id } => {
                write!(f, "quiz {} references a deleted curriculum node", quiz_id)
            }
        }
    }
}

impl std::error::Error for ReportError {}

/// Either a full report or the empty-state sentinel. An empty score history
/// is a valid terminal state, not an error; the UI shows an empty page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportOutcome {
    NoData { message: String },
    Ready(Report),
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub username: String,
    pub summary: Summary,
    pub subject_performance: BTreeMap<String, SubjectPerformance>,
    pub recent_activity: Vec<ActivityEntry>,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_quizzes: usize,
    pub avg_score: f64,
    pub highest_score: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct SubjectPerformance {
    pub total_quizzes: u32,
    pub total_score: f64,
    pub avg_score: f64,
    pub chapters: BTreeMap<String, ChapterPerformance>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChapterPerformance {
    pub total_quizzes: u32,
    pub total_score: f64,
    pub avg_score: f64,
    pub subchapters: BTreeMap<String, SubchapterPerformance>,
}

#[derive(Debug, Default, Serialize)]
pub struct SubchapterPerformance {
    pub total_quizzes: u32,
    pub total_score: f64,
    pub avg_score: f64,
    pub quizzes: Vec<QuizResult>,
}

/// Leaf entry under a subchapter node.
#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub title: String,
    pub level: String,
    pub score: f64,
    pub date: String,
}

/// Recent-activity feed entry.
#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub quiz_id: i64,
    pub title: String,
    pub level: String,
    pub score: f64,
    pub date: String,
}

const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Folds a user's full score history into the three-level performance tree
/// plus summary statistics and the recent-activity feed.
pub fn build_report(
    username: &str,
    records: &[ScoreRecord],
    policy: DanglingPolicy,
    generated_at: DateTime<Utc>,
) -> Result<ReportOutcome, ReportError> {
    let mut usable: Vec<&ScoreRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.subject_name.is_none()
            || record.chapter_name.is_none()
            || record.subchapter_name.is_none()
        {
            match policy {
                DanglingPolicy::Fail => {
                    return Err(ReportError::DanglingReference {
                        quiz_id: record.quiz_id,
                    });
                }
                DanglingPolicy::Skip => {
                    tracing::warn!(
                        quiz_id = record.quiz_id,
                        "skipping score with deleted curriculum node"
                    );
                    continue;
                }
            }
        }
        usable.push(record);
    }

    if usable.is_empty() {
        return Ok(ReportOutcome::NoData {
            message: "No quiz data available yet".to_string(),
        });
    }

    // Summary statistics. Repeated attempts on the same material each count;
    // the average is the unweighted mean over attempts.
    let total_quizzes = usable.len();
    let score_sum: f64 = usable.iter().map(|r| r.score).sum();
    let avg_score = score_sum / total_quizzes as f64;
    let highest_score = usable.iter().map(|r| r.score).fold(f64::MIN, f64::max);

    // Single pass: create the node path if absent, accumulate count and sum
    // at all three levels, append the leaf quiz entry.
    let mut subjects: BTreeMap<String, SubjectPerformance> = BTreeMap::new();
    for record in &usable {
        let subject_name = record.subject_name.as_deref().unwrap_or_default();
        let chapter_name = record.chapter_name.as_deref().unwrap_or_default();
        let subchapter_name = record.subchapter_name.as_deref().unwrap_or_default();

        let subject = subjects.entry(subject_name.to_string()).or_default();
        subject.total_quizzes += 1;
        subject.total_score += record.score;

        let chapter = subject.chapters.entry(chapter_name.to_string()).or_default();
        chapter.total_quizzes += 1;
        chapter.total_score += record.score;

        let subchapter = chapter
            .subchapters
            .entry(subchapter_name.to_string())
            .or_default();
        subchapter.total_quizzes += 1;
        subchapter.total_score += record.score;
        subchapter.quizzes.push(QuizResult {
            id: record.quiz_id,
            title: record.material_title.clone(),
            level: record.level.clone(),
            score: record.score,
            date: format_date(record.completed_at),
        });
    }

    // Every node reached here holds at least one quiz, so the division is safe.
    for subject in subjects.values_mut() {
        subject.avg_score = subject.total_score / subject.total_quizzes as f64;
        for chapter in subject.chapters.values_mut() {
            chapter.avg_score = chapter.total_score / chapter.total_quizzes as f64;
            for subchapter in chapter.subchapters.values_mut() {
                subchapter.avg_score = subchapter.total_score / subchapter.total_quizzes as f64;
            }
        }
    }

    // Stable sort keeps the original relative order of equal timestamps.
    let mut by_recency: Vec<&&ScoreRecord> = usable.iter().collect();
    by_recency.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    let recent_activity = by_recency
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|r| ActivityEntry {
            quiz_id: r.quiz_id,
            title: r.material_title.clone(),
            level: r.level.clone(),
            score: r.score,
            date: format_date(r.completed_at),
        })
        .collect();

    Ok(ReportOutcome::Ready(Report {
        username: username.to_string(),
        summary: Summary {
            total_quizzes,
            avg_score,
            highest_score,
        },
        subject_performance: subjects,
        recent_activity,
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

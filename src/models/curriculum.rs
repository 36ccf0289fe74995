// src/models/curriculum.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Which projection of an entity a request wants. List responses stay flat;
/// retrieve responses expand the parent chain. Selection is an explicit
/// function per entity rather than serializer-class dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    List,
    Detail,
}

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'chapters' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Manual ordering within the subject.
    #[serde(rename = "order")]
    pub position: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'subchapters' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subchapter {
    pub id: i64,
    pub chapter_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub position: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Retrieve variant of a chapter: the parent subject is expanded.
#[derive(Debug, Serialize)]
pub struct ChapterDetail {
    pub id: i64,
    pub subject: Subject,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub position: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Retrieve variant of a subchapter: the parent chapter is expanded.
#[derive(Debug, Serialize)]
pub struct SubchapterDetail {
    pub id: i64,
    pub chapter: Chapter,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub position: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChapterView {
    List(Chapter),
    Detail(ChapterDetail),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubchapterView {
    List(Subchapter),
    Detail(SubchapterDetail),
}

/// Selects the chapter projection for a request kind. Falls back to the flat
/// form when the parent row was not fetched.
pub fn chapter_view(kind: ViewKind, chapter: Chapter, subject: Option<Subject>) -> ChapterView {
    match (kind, subject) {
        (ViewKind::Detail, Some(subject)) => ChapterView::Detail(ChapterDetail {
            id: chapter.id,
            subject,
            name: chapter.name,
            description: chapter.description,
            position: chapter.position,
            created_at: chapter.created_at,
        }),
        _ => ChapterView::List(chapter),
    }
}

/// Selects the subchapter projection for a request kind.
pub fn subchapter_view(
    kind: ViewKind,
    subchapter: Subchapter,
    chapter: Option<Chapter>,
) -> SubchapterView {
    match (kind, chapter) {
        (ViewKind::Detail, Some(chapter)) => SubchapterView::Detail(SubchapterDetail {
            id: subchapter.id,
            chapter,
            name: subchapter.name,
            description: subchapter.description,
            position: subchapter.position,
            created_at: subchapter.created_at,
        }),
        _ => SubchapterView::List(subchapter),
    }
}

/// DTO for creating or replacing a subject.
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// DTO for creating or replacing a chapter.
#[derive(Debug, Deserialize, Validate)]
pub struct ChapterRequest {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(rename = "order", default)]
    pub position: i32,
}

/// DTO for creating or replacing a subchapter.
#[derive(Debug, Deserialize, Validate)]
pub struct SubchapterRequest {
    pub chapter_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(rename = "order", default)]
    pub position: i32,
}

// Database model structs

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SubjectModel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChapterModel {
    pub id: i64,
    pub title: String,
    pub chapter_number: i64,
    pub subject_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExamModel {
    pub id: i64,
    pub title: String,
    pub user_id: i64,
}

/// Completion record of one chapter inside one exam.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExamChapterModel {
    pub id: i64,
    pub exam_id: i64,
    pub chapter_id: i64,
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A junction row joined with its chapter and subject, as read back for projections.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExamChapterRow {
    pub chapter_id: i64,
    pub title: String,
    pub chapter_number: i64,
    pub is_completed: bool,
    pub subject_id: i64,
    pub subject_name: String,
}

/// Everything needed to render an exam or its statistics.
#[derive(Debug, Clone)]
pub struct ExamSnapshot {
    pub exam: ExamModel,
    pub subjects: Vec<SubjectModel>,
    pub chapters: Vec<ExamChapterRow>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExamSummaryModel {
    pub id: i64,
    pub title: String,
    pub subjects_count: i64,
    pub total_chapters: i64,
    pub completed_chapters: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HomeworkModel {
    pub id: i64,
    pub title: String,
    pub subject: Option<String>,
    pub is_completed: bool,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimetableModel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeriodRow {
    pub day_id: i64,
    pub day_name: String,
    pub order: i64,
    pub subject: String,
}

/// Issued access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

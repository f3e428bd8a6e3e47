use chrono::NaiveDate;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Exams
// ---------------------------------------------------------------------------

/// Chapter entry of a nested exam payload. Entries lacking `title` or
/// `chapter_number` are skipped during ingestion rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapter_number: Option<i64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chapters: Vec<ChapterInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateExamInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subjects: Vec<SubjectInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExamInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subjects: Option<Vec<SubjectInput>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChapterStatusInput {
    pub chapter_id: i64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkChapterStatusInput {
    pub chapters: Vec<ChapterStatusInput>,
}

/// A subject entry that survived ingestion, ready to be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub chapters: Vec<NewChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapter {
    pub title: String,
    pub chapter_number: i64,
    /// `None` when the payload did not mention completion at all.
    pub is_completed: Option<bool>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdateInput {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Homeworks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHomeworkInput {
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeworkQuery {
    pub due_date: Option<NaiveDate>,
    /// `true`/`false` in any case; other values leave the filter off.
    pub is_completed: Option<String>,
}

impl HomeworkQuery {
    pub fn completion(&self) -> Option<bool> {
        match self.is_completed.as_deref().map(str::to_lowercase).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeworkIdInput {
    #[serde(default)]
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Timetable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodInput {
    pub order: i64,
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayInput {
    pub id: i64,
    #[serde(default)]
    pub periods: Vec<PeriodInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimetableInput {
    pub name: String,
    pub days: Vec<DayInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTimetableInput {
    pub name: Option<String>,
    pub days: Option<Vec<DayInput>>,
}

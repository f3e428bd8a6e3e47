//! Exam payload handling: lenient ingestion of nested subject/chapter
//! structures, PATCH body classification and the bulk status policy.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::db::models::ExamChapterModel;
use crate::models::{
    BulkChapterStatusInput, ChapterStatusInput, NewChapter, NewSubject, SubjectInput,
    UpdateExamInput,
};
use crate::names;
use crate::rejections::{AppError, FieldErrors};

fn push(errors: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    errors.entry(field.into()).or_default().push(message.into());
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Check an exam title. `None` is only acceptable when `required` is false.
pub fn validate_title(
    title: Option<&str>,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    match title.map(str::trim) {
        None if required => {
            push(errors, "title", "This field is required.");
            None
        }
        None => None,
        Some("") => {
            push(errors, "title", "This field may not be blank.");
            None
        }
        Some(title) if title.chars().count() > names::MAX_EXAM_TITLE_LEN => {
            push(errors, "title", too_long(names::MAX_EXAM_TITLE_LEN));
            None
        }
        Some(title) => Some(title.to_string()),
    }
}

/// Turn the raw nested payload into entries ready for reconciliation.
///
/// Subjects without a name and chapters without a title or number are
/// dropped silently. Values that are present but malformed are reported.
pub fn ingest_subjects(subjects: &[SubjectInput], errors: &mut FieldErrors) -> Vec<NewSubject> {
    let mut accepted = Vec::new();

    for (i, subject) in subjects.iter().enumerate() {
        let Some(name) = subject.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        if name.chars().count() > names::MAX_SUBJECT_NAME_LEN {
            push(errors, format!("subjects[{i}].name"), too_long(names::MAX_SUBJECT_NAME_LEN));
            continue;
        }

        let mut chapters = Vec::new();
        for (j, chapter) in subject.chapters.iter().enumerate() {
            let title = chapter.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
            let (Some(title), Some(chapter_number)) = (title, chapter.chapter_number) else {
                continue;
            };
            let field = format!("subjects[{i}].chapters[{j}]");
            if chapter_number < 0 {
                push(
                    errors,
                    format!("{field}.chapter_number"),
                    "Ensure this value is greater than or equal to 0.",
                );
                continue;
            }
            if title.chars().count() > names::MAX_CHAPTER_TITLE_LEN {
                push(errors, format!("{field}.title"), too_long(names::MAX_CHAPTER_TITLE_LEN));
                continue;
            }
            chapters.push(NewChapter {
                title: title.to_string(),
                chapter_number,
                is_completed: chapter.is_completed,
            });
        }

        accepted.push(NewSubject {
            name: name.to_string(),
            chapters,
        });
    }

    accepted
}

/// The operation a `PATCH /exams/manage/<id>/` body asks for, decided by
/// which fields it carries.
#[derive(Debug, Clone)]
pub enum ExamPatch {
    /// `{"action": "stats"}`
    Stats,
    /// `{"chapters": [{chapter_id, is_completed}, ...]}`
    BulkStatus(Vec<ChapterStatusInput>),
    /// `{"chapter_id": .., "is_completed": ..}`
    SingleStatus(ChapterStatusInput),
    /// Anything else: merge of title and/or subjects.
    Structure(UpdateExamInput),
}

impl ExamPatch {
    pub fn classify(body: Value) -> Result<Self, AppError> {
        let Value::Object(fields) = &body else {
            return Err(AppError::field(
                "non_field_errors",
                "Invalid data. Expected a dictionary.",
            ));
        };

        if fields.get("action").and_then(Value::as_str) == Some("stats") {
            return Ok(ExamPatch::Stats);
        }
        if fields.contains_key("chapters") {
            let input: BulkChapterStatusInput = parse(body, "chapters")?;
            return Ok(ExamPatch::BulkStatus(input.chapters));
        }
        if fields.contains_key("chapter_id") {
            return Ok(ExamPatch::SingleStatus(parse(body, "chapter_id")?));
        }
        Ok(ExamPatch::Structure(parse(body, "subjects")?))
    }
}

fn parse<T: DeserializeOwned>(body: Value, field: &str) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::field(field, e.to_string()))
}

/// Result of a bulk status update that had at least one success.
#[derive(Debug)]
pub struct BulkOutcome {
    pub updated: Vec<ExamChapterModel>,
    pub errors: Vec<String>,
}

pub fn missing_chapter_message(chapter_id: i64) -> String {
    format!("Chapter {chapter_id} not found in this exam")
}

/// Partial success is still success; only a batch in which every entry
/// failed becomes a validation error carrying all messages.
pub fn bulk_outcome(
    updated: Vec<ExamChapterModel>,
    missing: &[i64],
) -> Result<BulkOutcome, AppError> {
    let errors: Vec<String> = missing.iter().copied().map(missing_chapter_message).collect();

    if updated.is_empty() && !errors.is_empty() {
        return Err(AppError::Validation {
            message: "Validation error.".to_string(),
            errors: json!(errors),
        });
    }

    Ok(BulkOutcome { updated, errors })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::ChapterInput;

    fn chapter(title: Option<&str>, number: Option<i64>, done: Option<bool>) -> ChapterInput {
        ChapterInput {
            title: title.map(str::to_string),
            chapter_number: number,
            is_completed: done,
        }
    }

    fn record(chapter_id: i64) -> ExamChapterModel {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        ExamChapterModel {
            id: chapter_id,
            exam_id: 1,
            chapter_id,
            is_completed: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn title_is_required_on_create_only() {
        let mut errors = FieldErrors::new();
        assert_eq!(validate_title(None, true, &mut errors), None);
        assert!(errors.contains_key("title"));

        let mut errors = FieldErrors::new();
        assert_eq!(validate_title(None, false, &mut errors), None);
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        assert_eq!(validate_title(Some("  "), false, &mut errors), None);
        assert_eq!(errors["title"], ["This field may not be blank."]);
    }

    #[test]
    fn ingestion_skips_incomplete_entries() {
        let subjects = vec![
            SubjectInput {
                name: None,
                chapters: vec![chapter(Some("Lost"), Some(1), None)],
            },
            SubjectInput {
                name: Some(" Math ".to_string()),
                chapters: vec![
                    chapter(Some("Algebra"), Some(1), Some(true)),
                    chapter(None, Some(2), None),
                    chapter(Some("Geometry"), None, None),
                    chapter(Some(""), Some(3), None),
                    chapter(Some("Calculus"), Some(0), None),
                ],
            },
        ];

        let mut errors = FieldErrors::new();
        let accepted = ingest_subjects(&subjects, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            accepted,
            vec![NewSubject {
                name: "Math".to_string(),
                chapters: vec![
                    NewChapter {
                        title: "Algebra".to_string(),
                        chapter_number: 1,
                        is_completed: Some(true),
                    },
                    NewChapter {
                        title: "Calculus".to_string(),
                        chapter_number: 0,
                        is_completed: None,
                    },
                ],
            }]
        );
    }

    #[test]
    fn negative_chapter_number_is_reported() {
        let subjects = vec![SubjectInput {
            name: Some("Physics".to_string()),
            chapters: vec![chapter(Some("Optics"), Some(-1), None)],
        }];

        let mut errors = FieldErrors::new();
        ingest_subjects(&subjects, &mut errors);

        assert!(errors.contains_key("subjects[0].chapters[0].chapter_number"));
    }

    #[test]
    fn patch_body_shape_selects_operation() {
        assert!(matches!(
            ExamPatch::classify(json!({"action": "stats", "chapters": []})).unwrap(),
            ExamPatch::Stats
        ));
        assert!(matches!(
            ExamPatch::classify(json!({"chapters": [{"chapter_id": 1, "is_completed": true}]}))
                .unwrap(),
            ExamPatch::BulkStatus(ref entries) if entries.len() == 1
        ));
        assert!(matches!(
            ExamPatch::classify(json!({"chapter_id": 4, "is_completed": false})).unwrap(),
            ExamPatch::SingleStatus(ChapterStatusInput { chapter_id: 4, is_completed: false })
        ));
        assert!(matches!(
            ExamPatch::classify(json!({"title": "Renamed"})).unwrap(),
            ExamPatch::Structure(ref input) if input.title.as_deref() == Some("Renamed")
        ));
        assert!(matches!(
            ExamPatch::classify(json!({"action": "other"})).unwrap(),
            ExamPatch::Structure(_)
        ));
    }

    #[test]
    fn malformed_status_bodies_are_validation_errors() {
        assert!(matches!(
            ExamPatch::classify(json!({"chapter_id": 4})),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            ExamPatch::classify(json!({"chapters": "all"})),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            ExamPatch::classify(json!([1, 2])),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn bulk_partial_success_keeps_errors() {
        let outcome = bulk_outcome(vec![record(1)], &[999]).unwrap();

        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.errors, ["Chapter 999 not found in this exam"]);
    }

    #[test]
    fn bulk_all_failed_is_validation_error() {
        let err = bulk_outcome(Vec::new(), &[5, 6]).unwrap_err();

        match err {
            AppError::Validation { errors, .. } => assert_eq!(
                errors,
                json!([
                    "Chapter 5 not found in this exam",
                    "Chapter 6 not found in this exam"
                ])
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_bulk_is_not_an_error() {
        let outcome = bulk_outcome(Vec::new(), &[]).unwrap();
        assert!(outcome.updated.is_empty());
        assert!(outcome.errors.is_empty());
    }
}

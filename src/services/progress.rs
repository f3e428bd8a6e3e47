//! Read-side projections of an exam: detail view, list summary and stats.
//!
//! Progress is never stored. It is always recomputed from the completion
//! records with [`percent`], at exam level and per subject alike.

use serde::Serialize;

use crate::db::models::{ExamChapterRow, ExamSnapshot, ExamSummaryModel, SubjectModel};

/// `round(100 * completed / total)` with halves rounded up, `0` when `total == 0`.
pub fn percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (200 * completed + total) / (2 * total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterDetail {
    pub id: i64,
    pub title: String,
    pub chapter_number: i64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectDetail {
    pub id: i64,
    pub name: String,
    pub progress: i64,
    pub chapters: Vec<ChapterDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamDetail {
    pub id: i64,
    pub title: String,
    pub progress: i64,
    pub subjects: Vec<SubjectDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamListItem {
    pub id: i64,
    pub title: String,
    pub progress: i64,
    pub subjects_count: i64,
    pub total_chapters: i64,
    pub completed_chapters: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectStats {
    pub id: i64,
    pub subject_name: String,
    pub total_chapters: i64,
    pub completed_chapters: i64,
    pub progress: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamStats {
    pub exam_id: i64,
    pub exam_title: String,
    pub overall_progress: i64,
    pub total_chapters: i64,
    pub completed_chapters: i64,
    pub pending_chapters: i64,
    pub subjects_count: i64,
    pub subjects_stats: Vec<SubjectStats>,
}

fn completed(chapters: &[&ExamChapterRow]) -> i64 {
    chapters.iter().filter(|c| c.is_completed).count() as i64
}

fn chapters_of<'a>(snapshot: &'a ExamSnapshot, subject: &SubjectModel) -> Vec<&'a ExamChapterRow> {
    let mut chapters: Vec<&ExamChapterRow> = snapshot
        .chapters
        .iter()
        .filter(|c| c.subject_id == subject.id)
        .collect();
    chapters.sort_by_key(|c| (c.chapter_number, c.chapter_id));
    chapters
}

/// Subjects of the exam sorted by name, including those without chapters.
fn sorted_subjects(snapshot: &ExamSnapshot) -> Vec<&SubjectModel> {
    let mut subjects: Vec<&SubjectModel> = snapshot.subjects.iter().collect();
    subjects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    subjects
}

pub fn exam_progress(snapshot: &ExamSnapshot) -> i64 {
    let all: Vec<&ExamChapterRow> = snapshot.chapters.iter().collect();
    percent(completed(&all), all.len() as i64)
}

pub fn detail(snapshot: &ExamSnapshot) -> ExamDetail {
    let subjects = sorted_subjects(snapshot)
        .into_iter()
        .map(|subject| {
            let chapters = chapters_of(snapshot, subject);
            SubjectDetail {
                id: subject.id,
                name: subject.name.clone(),
                progress: percent(completed(&chapters), chapters.len() as i64),
                chapters: chapters
                    .into_iter()
                    .map(|c| ChapterDetail {
                        id: c.chapter_id,
                        title: c.title.clone(),
                        chapter_number: c.chapter_number,
                        is_completed: c.is_completed,
                    })
                    .collect(),
            }
        })
        .collect();

    ExamDetail {
        id: snapshot.exam.id,
        title: snapshot.exam.title.clone(),
        progress: exam_progress(snapshot),
        subjects,
    }
}

pub fn list_item(summary: &ExamSummaryModel) -> ExamListItem {
    ExamListItem {
        id: summary.id,
        title: summary.title.clone(),
        progress: percent(summary.completed_chapters, summary.total_chapters),
        subjects_count: summary.subjects_count,
        total_chapters: summary.total_chapters,
        completed_chapters: summary.completed_chapters,
    }
}

pub fn stats(snapshot: &ExamSnapshot) -> ExamStats {
    let all: Vec<&ExamChapterRow> = snapshot.chapters.iter().collect();
    let total_chapters = all.len() as i64;
    let completed_chapters = completed(&all);

    let subjects_stats = sorted_subjects(snapshot)
        .into_iter()
        .map(|subject| {
            let chapters = chapters_of(snapshot, subject);
            let total = chapters.len() as i64;
            let done = completed(&chapters);
            SubjectStats {
                id: subject.id,
                subject_name: subject.name.clone(),
                total_chapters: total,
                completed_chapters: done,
                progress: percent(done, total),
            }
        })
        .collect();

    ExamStats {
        exam_id: snapshot.exam.id,
        exam_title: snapshot.exam.title.clone(),
        overall_progress: percent(completed_chapters, total_chapters),
        total_chapters,
        completed_chapters,
        pending_chapters: total_chapters - completed_chapters,
        subjects_count: snapshot.subjects.len() as i64,
        subjects_stats,
    }
}

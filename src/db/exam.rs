use color_eyre::{eyre::OptionExt, Result};
use sqlx::SqliteConnection;

use super::catalog::{get_or_create_chapter, get_or_create_subject};
use super::models::{
    ExamChapterModel, ExamChapterRow, ExamModel, ExamSnapshot, ExamSummaryModel, SubjectModel,
};
use super::Db;
use crate::models::{ChapterStatusInput, NewSubject};

impl Db {
    /// Create an exam with its nested subjects and chapters in one transaction.
    /// Returns the id of the new exam.
    pub async fn create_exam(
        &self,
        user_id: i64,
        title: &str,
        subjects: &[NewSubject],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let exam_id: i64 =
            sqlx::query_scalar("INSERT INTO exams (title, user_id) VALUES (?, ?) RETURNING id")
                .bind(title)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        reconcile_subjects(&mut *tx, exam_id, subjects).await?;

        tx.commit().await?;

        tracing::info!("new exam created with id: {exam_id} for user_id: {user_id}");
        Ok(exam_id)
    }

    /// Merge a title change and additional structure into an existing exam.
    /// Existing subject associations and completion records are never removed.
    pub async fn update_exam(
        &self,
        exam: &ExamModel,
        title: Option<&str>,
        subjects: &[NewSubject],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Takes the write lock before any catalog reads happen.
        let updated =
            sqlx::query("UPDATE exams SET title = COALESCE(?, title) WHERE id = ? AND user_id = ?")
                .bind(title)
                .bind(exam.id)
                .bind(exam.user_id)
                .execute(&mut *tx)
                .await?;

        if updated.rows_affected() == 0 {
            color_eyre::eyre::bail!("exam {} disappeared during update", exam.id);
        }

        reconcile_subjects(&mut *tx, exam.id, subjects).await?;

        tx.commit().await?;

        tracing::info!("exam updated with id: {} by user_id: {}", exam.id, exam.user_id);
        Ok(())
    }

    pub async fn exams(&self, user_id: i64) -> Result<Vec<ExamSummaryModel>> {
        let exams = sqlx::query_as::<_, ExamSummaryModel>(
            r#"
            SELECT
              e.id AS id,
              e.title AS title,
              (SELECT COUNT(*) FROM exam_subjects es WHERE es.exam_id = e.id) AS subjects_count,
              (SELECT COUNT(*) FROM exam_chapters ec WHERE ec.exam_id = e.id) AS total_chapters,
              (SELECT COUNT(*) FROM exam_chapters ec
                 WHERE ec.exam_id = e.id AND ec.is_completed = 1) AS completed_chapters
            FROM exams e
            WHERE e.user_id = ?
            ORDER BY e.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(exams)
    }

    /// Fetch an exam only if it belongs to `user_id`.
    pub async fn exam_for_user(&self, exam_id: i64, user_id: i64) -> Result<Option<ExamModel>> {
        let exam = sqlx::query_as::<_, ExamModel>(
            "SELECT id, title, user_id FROM exams WHERE id = ? AND user_id = ?",
        )
        .bind(exam_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    pub async fn exam_snapshot(&self, exam_id: i64) -> Result<ExamSnapshot> {
        let exam =
            sqlx::query_as::<_, ExamModel>("SELECT id, title, user_id FROM exams WHERE id = ?")
                .bind(exam_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_eyre("exam not found")?;

        let subjects = sqlx::query_as::<_, SubjectModel>(
            r#"
            SELECT s.id AS id, s.name AS name
            FROM exam_subjects es
            JOIN subjects s ON s.id = es.subject_id
            WHERE es.exam_id = ?
            ORDER BY s.name, s.id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        let chapters = sqlx::query_as::<_, ExamChapterRow>(
            r#"
            SELECT
              c.id AS chapter_id,
              c.title AS title,
              c.chapter_number AS chapter_number,
              ec.is_completed AS is_completed,
              s.id AS subject_id,
              s.name AS subject_name
            FROM exam_chapters ec
            JOIN chapters c ON c.id = ec.chapter_id
            JOIN subjects s ON s.id = c.subject_id
            WHERE ec.exam_id = ?
            ORDER BY s.name, c.chapter_number, c.id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ExamSnapshot {
            exam,
            subjects,
            chapters,
        })
    }

    /// Set completion of a chapter that is already part of the exam.
    /// Returns `None` when the exam has no record for `chapter_id`.
    pub async fn set_chapter_status(
        &self,
        exam: &ExamModel,
        chapter_id: i64,
        is_completed: bool,
    ) -> Result<Option<ExamChapterModel>> {
        let mut conn = self.pool.acquire().await?;
        let record = update_completion(&mut *conn, exam.id, chapter_id, is_completed).await?;

        if record.is_some() {
            tracing::info!(
                "chapter {chapter_id} of exam {} set to completed={is_completed}",
                exam.id
            );
        }
        Ok(record)
    }

    /// Apply every entry independently. Returns the updated records and the
    /// chapter ids that have no record in this exam.
    pub async fn set_chapter_statuses(
        &self,
        exam: &ExamModel,
        entries: &[ChapterStatusInput],
    ) -> Result<(Vec<ExamChapterModel>, Vec<i64>)> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::new();
        let mut missing = Vec::new();

        for entry in entries {
            match update_completion(&mut *tx, exam.id, entry.chapter_id, entry.is_completed).await? {
                Some(record) => updated.push(record),
                None => missing.push(entry.chapter_id),
            }
        }

        tx.commit().await?;

        tracing::info!(
            "bulk status update on exam {}: {} updated, {} missing",
            exam.id,
            updated.len(),
            missing.len()
        );
        Ok((updated, missing))
    }

    /// Delete an owned exam. Its associations and completion records go with
    /// it; catalog subjects and chapters stay.
    pub async fn delete_exam(&self, exam_id: i64, user_id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM exams WHERE id = ? AND user_id = ?")
            .bind(exam_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = deleted.rows_affected() > 0;
        if deleted {
            tracing::info!("exam deleted with id: {exam_id} by user_id: {user_id}");
        }
        Ok(deleted)
    }
}

/// Resolve every subject and chapter against the catalog and attach them to
/// the exam. Known (exam, chapter) pairs are not duplicated; their completion
/// changes only when the entry states it explicitly.
async fn reconcile_subjects(
    conn: &mut SqliteConnection,
    exam_id: i64,
    subjects: &[NewSubject],
) -> Result<()> {
    for entry in subjects {
        let subject = get_or_create_subject(conn, &entry.name).await?;

        sqlx::query(
            "INSERT INTO exam_subjects (exam_id, subject_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(exam_id)
        .bind(subject.id)
        .execute(&mut *conn)
        .await?;

        for chapter in &entry.chapters {
            let model =
                get_or_create_chapter(conn, subject.id, &chapter.title, chapter.chapter_number)
                    .await?;

            sqlx::query(
                r#"
                INSERT INTO exam_chapters (exam_id, chapter_id, is_completed)
                VALUES (?1, ?2, COALESCE(?3, 0))
                ON CONFLICT(exam_id, chapter_id) DO UPDATE
                SET is_completed = ?3, updated_at = CURRENT_TIMESTAMP
                WHERE ?3 IS NOT NULL
                "#,
            )
            .bind(exam_id)
            .bind(model.id)
            .bind(chapter.is_completed)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

async fn update_completion(
    conn: &mut SqliteConnection,
    exam_id: i64,
    chapter_id: i64,
    is_completed: bool,
) -> Result<Option<ExamChapterModel>> {
    let record = sqlx::query_as::<_, ExamChapterModel>(
        r#"
        UPDATE exam_chapters
        SET is_completed = ?, updated_at = CURRENT_TIMESTAMP
        WHERE exam_id = ? AND chapter_id = ?
        RETURNING id, exam_id, chapter_id, is_completed, created_at, updated_at
        "#,
    )
    .bind(is_completed)
    .bind(exam_id)
    .bind(chapter_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

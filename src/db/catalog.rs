//! Shared subject/chapter catalog.
//!
//! Both lookups are insert-or-fetch against a `UNIQUE` constraint, so two
//! requests racing to introduce the same name end up sharing one row.

use color_eyre::{eyre::OptionExt, Result};
use sqlx::SqliteConnection;

use super::models::{ChapterModel, SubjectModel};
use super::Db;

/// Resolve a subject by name (case-insensitive), creating it with `name` as
/// spelled here when it does not exist yet.
pub async fn get_or_create_subject(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<SubjectModel> {
    let inserted =
        sqlx::query("INSERT INTO subjects (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await?;

    if inserted.rows_affected() > 0 {
        tracing::info!("new subject created: {name}");
    }

    let subject = sqlx::query_as::<_, SubjectModel>("SELECT id, name FROM subjects WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_eyre("subject vanished after insert-or-fetch")?;

    Ok(subject)
}

/// Resolve a chapter by its natural key `(title, chapter_number, subject)`.
pub async fn get_or_create_chapter(
    conn: &mut SqliteConnection,
    subject_id: i64,
    title: &str,
    chapter_number: i64,
) -> Result<ChapterModel> {
    sqlx::query(
        r#"
        INSERT INTO chapters (title, chapter_number, subject_id) VALUES (?, ?, ?)
        ON CONFLICT(title, chapter_number, subject_id) DO NOTHING
        "#,
    )
    .bind(title)
    .bind(chapter_number)
    .bind(subject_id)
    .execute(&mut *conn)
    .await?;

    let chapter = sqlx::query_as::<_, ChapterModel>(
        r#"
        SELECT id, title, chapter_number, subject_id
        FROM chapters
        WHERE title = ? AND chapter_number = ? AND subject_id = ?
        "#,
    )
    .bind(title)
    .bind(chapter_number)
    .bind(subject_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_eyre("chapter vanished after insert-or-fetch")?;

    Ok(chapter)
}

impl Db {
    pub async fn subjects(&self) -> Result<Vec<SubjectModel>> {
        let subjects =
            sqlx::query_as::<_, SubjectModel>("SELECT id, name FROM subjects ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(subjects)
    }

    pub async fn chapters(&self, subject_id: i64) -> Result<Vec<ChapterModel>> {
        let chapters = sqlx::query_as::<_, ChapterModel>(
            r#"
            SELECT id, title, chapter_number, subject_id
            FROM chapters
            WHERE subject_id = ?
            ORDER BY chapter_number, id
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chapters)
    }
}

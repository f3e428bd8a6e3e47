use color_eyre::{eyre::OptionExt, Result};

use super::catalog::get_or_create_subject;
use super::models::HomeworkModel;
use super::Db;
use crate::models::{CreateHomeworkInput, HomeworkQuery};

const HOMEWORK_COLUMNS: &str = r#"
    h.id AS id,
    h.title AS title,
    s.name AS subject,
    h.is_completed AS is_completed,
    h.is_deleted AS is_deleted,
    h.created_at AS created_at,
    h.due_date AS due_date
"#;

impl Db {
    /// `subject_name` must already be normalised; it is resolved through the
    /// shared catalog.
    pub async fn create_homework(
        &self,
        user_id: i64,
        input: &CreateHomeworkInput,
        subject_name: Option<&str>,
    ) -> Result<HomeworkModel> {
        let mut tx = self.pool.begin().await?;

        let homework_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO homeworks (title, is_completed, due_date, user_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(input.is_completed)
        .bind(input.due_date)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(name) = subject_name {
            let subject = get_or_create_subject(&mut *tx, name).await?;
            sqlx::query("UPDATE homeworks SET subject_id = ? WHERE id = ?")
                .bind(subject.id)
                .bind(homework_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("new homework created with id: {homework_id} for user_id: {user_id}");
        self.homework(homework_id, user_id)
            .await?
            .ok_or_eyre("homework vanished after insert")
    }

    /// Live (not soft-deleted) homework owned by `user_id`.
    pub async fn homework(&self, homework_id: i64, user_id: i64) -> Result<Option<HomeworkModel>> {
        let homework = sqlx::query_as::<_, HomeworkModel>(&format!(
            r#"
            SELECT {HOMEWORK_COLUMNS}
            FROM homeworks h
            LEFT JOIN subjects s ON s.id = h.subject_id
            WHERE h.id = ? AND h.user_id = ? AND h.is_deleted = 0
            "#
        ))
        .bind(homework_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(homework)
    }

    pub async fn homeworks(&self, user_id: i64, query: &HomeworkQuery) -> Result<Vec<HomeworkModel>> {
        let homeworks = sqlx::query_as::<_, HomeworkModel>(&format!(
            r#"
            SELECT {HOMEWORK_COLUMNS}
            FROM homeworks h
            LEFT JOIN subjects s ON s.id = h.subject_id
            WHERE h.user_id = ? AND h.is_deleted = 0
              AND (? IS NULL OR h.due_date = ?)
              AND (? IS NULL OR h.is_completed = ?)
            ORDER BY h.created_at, h.id
            "#
        ))
        .bind(user_id)
        .bind(query.due_date)
        .bind(query.due_date)
        .bind(query.completion())
        .bind(query.completion())
        .fetch_all(&self.pool)
        .await?;

        Ok(homeworks)
    }

    pub async fn complete_homework(&self, homework_id: i64, user_id: i64) -> Result<Option<HomeworkModel>> {
        let updated = sqlx::query(
            "UPDATE homeworks SET is_completed = 1 WHERE id = ? AND user_id = ? AND is_deleted = 0",
        )
        .bind(homework_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::info!("homework {homework_id} marked completed by user_id: {user_id}");
        self.homework(homework_id, user_id).await
    }

    /// Homeworks are soft-deleted: the row stays with `is_deleted` set.
    pub async fn delete_homework(&self, homework_id: i64, user_id: i64) -> Result<bool> {
        let deleted = sqlx::query(
            "UPDATE homeworks SET is_deleted = 1 WHERE id = ? AND user_id = ? AND is_deleted = 0",
        )
        .bind(homework_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let deleted = deleted.rows_affected() > 0;
        if deleted {
            tracing::info!("homework {homework_id} soft-deleted by user_id: {user_id}");
        }
        Ok(deleted)
    }
}

use color_eyre::Result;
use sqlx::SqliteConnection;

use super::catalog::get_or_create_subject;
use super::models::{PeriodRow, TimetableModel};
use super::Db;

/// One period slot with its subject name already normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSlot {
    pub day_id: i64,
    pub order: i64,
    pub subject: String,
}

impl Db {
    /// First id in `day_ids` that is not a known weekday.
    pub async fn unknown_day(&self, day_ids: &[i64]) -> Result<Option<i64>> {
        for &day_id in day_ids {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM days WHERE id = ?)")
                .bind(day_id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                return Ok(Some(day_id));
            }
        }
        Ok(None)
    }

    pub async fn create_timetable(
        &self,
        user_id: i64,
        name: &str,
        slots: &[PeriodSlot],
    ) -> Result<TimetableModel> {
        let mut tx = self.pool.begin().await?;

        let timetable = sqlx::query_as::<_, TimetableModel>(
            "INSERT INTO timetables (name, user_id) VALUES (?, ?) RETURNING id, name",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        upsert_periods(&mut *tx, timetable.id, slots).await?;

        tx.commit().await?;

        tracing::info!(
            "new timetable created with id: {} for user_id: {user_id}",
            timetable.id
        );
        Ok(timetable)
    }

    /// The user's first timetable by name.
    pub async fn first_timetable(&self, user_id: i64) -> Result<Option<TimetableModel>> {
        let timetable = sqlx::query_as::<_, TimetableModel>(
            "SELECT id, name FROM timetables WHERE user_id = ? ORDER BY name, id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(timetable)
    }

    pub async fn timetable_periods(&self, timetable_id: i64) -> Result<Vec<PeriodRow>> {
        let periods = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT
              d.id AS day_id,
              d.display_name AS day_name,
              p."order" AS "order",
              s.name AS subject
            FROM periods p
            JOIN days d ON d.id = p.day_id
            JOIN subjects s ON s.id = p.subject_id
            WHERE p.timetable_id = ?
            ORDER BY d.id, p."order"
            "#,
        )
        .bind(timetable_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    /// Rename and/or replace the subject of the given slots. Slots not named
    /// in `slots` are kept.
    pub async fn update_timetable(
        &self,
        timetable_id: i64,
        user_id: i64,
        name: Option<&str>,
        slots: &[PeriodSlot],
    ) -> Result<Option<TimetableModel>> {
        let mut tx = self.pool.begin().await?;

        let timetable = sqlx::query_as::<_, TimetableModel>(
            r#"
            UPDATE timetables SET name = COALESCE(?, name)
            WHERE id = ? AND user_id = ?
            RETURNING id, name
            "#,
        )
        .bind(name)
        .bind(timetable_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(timetable) = timetable else {
            return Ok(None);
        };

        upsert_periods(&mut *tx, timetable.id, slots).await?;

        tx.commit().await?;

        tracing::info!("timetable updated with id: {timetable_id} by user_id: {user_id}");
        Ok(Some(timetable))
    }

    pub async fn delete_timetable(&self, timetable_id: i64, user_id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM timetables WHERE id = ? AND user_id = ?")
            .bind(timetable_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = deleted.rows_affected() > 0;
        if deleted {
            tracing::info!("timetable deleted with id: {timetable_id} by user_id: {user_id}");
        }
        Ok(deleted)
    }
}

async fn upsert_periods(
    conn: &mut SqliteConnection,
    timetable_id: i64,
    slots: &[PeriodSlot],
) -> Result<()> {
    for slot in slots {
        let subject = get_or_create_subject(conn, &slot.subject).await?;

        sqlx::query(
            r#"
            INSERT INTO periods (timetable_id, day_id, "order", subject_id) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(timetable_id, day_id, "order") DO UPDATE SET subject_id = ?4
            "#,
        )
        .bind(timetable_id)
        .bind(slot.day_id)
        .bind(slot.order)
        .bind(subject.id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

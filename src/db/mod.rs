// Database module - provides data access layer

use std::str::FromStr;
use std::time::Duration;

use color_eyre::{eyre::ensure, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

// Re-export models for convenience
pub mod models;
pub use models::*;

// Internal modules
mod catalog;
mod exam;
mod homework;
mod migrations;
mod timetable;
mod user;

pub use catalog::{get_or_create_chapter, get_or_create_subject};
pub use timetable::PeriodSlot;

// Main database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    pub async fn new(url: impl AsRef<str>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url.as_ref())?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        // Verify connection
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        ensure!(one == 1, "database connection check returned {one}");

        migrations::run(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { pool })
    }

    pub async fn migration_applied(&self, version: &str) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)",
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }
}

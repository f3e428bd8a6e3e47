use color_eyre::Result;
use sqlx::SqlitePool;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "V1",
    sql: include_str!("../../migrations/V1__init.sql"),
}];

pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    for migration in MIGRATIONS {
        let already_applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)")
                .bind(migration.version)
                .fetch_one(pool)
                .await?;

        if already_applied {
            continue;
        }

        let mut tx = pool.begin().await?;

        // Execute multi-statement SQL using raw_sql
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;

        sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(version = migration.version, "applied database migration");
    }

    Ok(())
}

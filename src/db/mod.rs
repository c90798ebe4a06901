//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all catalog data.

mod query;
mod repository;

pub use query::*;
pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            youtube_channel_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            inserted_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            youtube_course_id TEXT NOT NULL UNIQUE,
            course_type TEXT NOT NULL,
            locale TEXT NOT NULL,
            published_at TEXT NOT NULL,
            inserted_at TEXT NOT NULL,
            view_count INTEGER NOT NULL DEFAULT 0,
            channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One entity table and one join table per tag kind
    for kind in crate::models::TagKind::ALL {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                name_folded TEXT NOT NULL
            );
            "#,
            table = kind.table(),
        ))
        .execute(pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {join} (
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                {fk} TEXT NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                PRIMARY KEY (course_id, {fk})
            );
            "#,
            join = kind.join_table(),
            fk = kind.foreign_key(),
            table = kind.table(),
        ))
        .execute(pool)
        .await?;
    }

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_courses_locale ON courses(locale);
        CREATE INDEX IF NOT EXISTS idx_courses_published_at ON courses(published_at);
        CREATE INDEX IF NOT EXISTS idx_courses_inserted_at ON courses(inserted_at);
        CREATE INDEX IF NOT EXISTS idx_courses_channel_id ON courses(channel_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

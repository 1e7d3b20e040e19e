use anyhow::Result;
use sqlx::postgres::PgConnection;

use crate::config::Config;
use crate::db::{Connect, ConnectionManager};

/// Create the `users` and `notes` tables if they do not exist.
///
/// Runs on every successful connect, so each statement must be idempotent.
pub async fn init_schema(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id SERIAL PRIMARY KEY,
            user_id TEXT NOT NULL,
            book TEXT NOT NULL,
            chapter INTEGER NOT NULL,
            verse INTEGER NOT NULL,
            verse_text TEXT NOT NULL,
            note TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notes_user_created ON notes (user_id, created_at DESC)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `biblot init`: connect (which initializes the schema) and report.
pub async fn run_init(config: &Config) -> Result<()> {
    let mut manager = ConnectionManager::connect_with_config(&config.db).await?;
    println!(
        "Database initialized successfully ({}).",
        manager.connector().describe()
    );
    manager.close().await;
    Ok(())
}

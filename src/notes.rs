//! User and note persistence.
//!
//! Every operation first asks the [`ConnectionManager`] for a live connection,
//! so a connection dropped while idle is replaced before the query runs.
//! Each write is its own transaction: committed on success, rolled back
//! before the error is returned otherwise.
//!
//! Notes are append-only. There is no update or delete.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{Connection, Row, Transaction};
use tracing::{info, warn};

use crate::config::{Config, DbConfig};
use crate::db::{ConnectionManager, PgConnector};
use crate::error::StoreError;
use crate::models::{Note, NoteEntry, StoreStats, User};
use crate::reference::Reference;
use crate::resolver::ReferenceResolver;

pub struct NoteStore {
    manager: ConnectionManager<PgConnector>,
}

impl NoteStore {
    pub fn new(manager: ConnectionManager<PgConnector>) -> Self {
        Self { manager }
    }

    /// Connect (with retries) and initialize the schema.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let manager = ConnectionManager::connect_with_config(config).await?;
        Ok(Self::new(manager))
    }

    pub fn manager(&self) -> &ConnectionManager<PgConnector> {
        &self.manager
    }

    pub async fn close(&mut self) {
        self.manager.close().await;
    }

    /// Return `user_id`, creating the user with `display_name` if absent.
    ///
    /// An existing user keeps the name it was created with.
    pub async fn get_or_create_user(
        &mut self,
        user_id: &str,
        display_name: &str,
    ) -> Result<String, StoreError> {
        let conn = self.manager.ensure_live().await?;
        let mut tx = conn.begin().await?;

        let result = sqlx::query(
            "INSERT INTO users (id, username) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(done) => {
                tx.commit().await?;
                if done.rows_affected() == 1 {
                    info!(user_id, display_name, "created user");
                } else {
                    info!(user_id, "existing user");
                }
                Ok(user_id.to_string())
            }
            Err(e) => {
                rollback(tx).await;
                warn!(user_id, error = %e, "get_or_create_user failed");
                Err(e.into())
            }
        }
    }

    pub async fn find_user(&mut self, user_id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.manager.ensure_live().await?;
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Store a note with a snapshot of the passage text. Returns the note id.
    ///
    /// `user_id` must already exist; otherwise the foreign key rejects the
    /// insert with [`StoreError::Constraint`] and nothing is written.
    pub async fn add_note(
        &mut self,
        user_id: &str,
        book: &str,
        chapter: u32,
        verse: u32,
        verse_text: &str,
        annotation: &str,
    ) -> Result<i32, StoreError> {
        let chapter = positive("chapter", chapter)?;
        let verse = positive("verse", verse)?;

        let conn = self.manager.ensure_live().await?;
        let mut tx = conn.begin().await?;

        info!(user_id, book, chapter, verse, "adding note");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO notes (user_id, book, chapter, verse, verse_text, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book)
        .bind(chapter)
        .bind(verse)
        .bind(verse_text)
        .bind(annotation)
        .fetch_one(&mut *tx)
        .await;

        match result {
            Ok(id) => {
                tx.commit().await?;
                info!(note_id = id, "note saved");
                Ok(id)
            }
            Err(e) => {
                rollback(tx).await;
                warn!(user_id, error = %e, "failed to add note");
                Err(e.into())
            }
        }
    }

    /// All notes of a user, newest first. Empty when there are none.
    pub async fn get_user_notes(&mut self, user_id: &str) -> Result<Vec<NoteEntry>, StoreError> {
        let conn = self.manager.ensure_live().await?;
        let rows = sqlx::query(
            r#"
            SELECT note, created_at, book, chapter, verse
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let entries = rows
            .iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        info!(user_id, count = entries.len(), "loaded notes");
        Ok(entries)
    }

    pub async fn get_note(&mut self, id: i32) -> Result<Option<Note>, StoreError> {
        let conn = self.manager.ensure_live().await?;
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book, chapter, verse, verse_text, note, created_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }

    pub async fn stats(&mut self) -> Result<StoreStats, StoreError> {
        let conn = self.manager.ensure_live().await?;
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await?;
        let notes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&mut *conn)
            .await?;
        Ok(StoreStats { users, notes })
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

fn entry_from_row(row: &PgRow) -> Result<NoteEntry, sqlx::Error> {
    Ok(NoteEntry {
        annotation: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
        book: row.try_get("book")?,
        chapter: row.try_get("chapter")?,
        verse: row.try_get("verse")?,
    })
}

fn note_from_row(row: &PgRow) -> Result<Note, sqlx::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        book: row.try_get("book")?,
        chapter: row.try_get("chapter")?,
        verse: row.try_get("verse")?,
        verse_text: row.try_get("verse_text")?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}

fn positive(field: &str, value: u32) -> Result<i32, StoreError> {
    match i32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(StoreError::InvalidInput(format!(
            "{} must be between 1 and {}, got {}",
            field,
            i32::MAX,
            value
        ))),
    }
}

async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

fn format_saved_at(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// `biblot note add`: resolve the verse, make sure the user exists, save.
pub async fn run_note_add(
    config: &Config,
    user_id: &str,
    display_name: Option<&str>,
    reference: &str,
    annotation: &str,
    translation: Option<String>,
) -> Result<()> {
    let (parsed, verse) = Reference::parse_verse(reference)?;

    let mut resolver = ReferenceResolver::from_config(&config.passage)?;
    if let Some(version) = translation {
        resolver = resolver.with_version(version);
    }
    let verse_text = resolver.resolve_verse(&parsed.to_string()).await?;

    let mut store = NoteStore::connect(&config.db).await?;
    let user_id = store
        .get_or_create_user(user_id, display_name.unwrap_or(user_id))
        .await?;
    let id = store
        .add_note(
            &user_id,
            &parsed.book,
            parsed.chapter,
            verse,
            &verse_text,
            annotation,
        )
        .await?;
    store.close().await;

    println!("Saved note #{} for {}", id, parsed);
    println!();
    println!("  {}", verse_text);
    println!();
    println!("  Note: {}", annotation);
    Ok(())
}

/// `biblot note list`: print a user's notes, newest first.
pub async fn run_note_list(config: &Config, user_id: &str, json: bool) -> Result<()> {
    let mut store = NoteStore::connect(&config.db).await?;
    let notes = store.get_user_notes(user_id).await?;
    store.close().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&notes).context("Failed to serialize notes")?
        );
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes saved yet. Use `biblot note add` to save one.");
        return Ok(());
    }

    println!("Notes ({})", notes.len());
    println!();
    for (i, entry) in notes.iter().enumerate() {
        println!("{}. {}", i + 1, entry.location());
        println!("   {}", entry.annotation);
        println!("   saved {}", format_saved_at(&entry.created_at));
        println!();
    }
    Ok(())
}

/// `biblot note show`: print one note with its stored passage text.
pub async fn run_note_show(config: &Config, id: i32) -> Result<()> {
    let mut store = NoteStore::connect(&config.db).await?;
    let note = store.get_note(id).await?;
    store.close().await;

    let note = match note {
        Some(note) => note,
        None => anyhow::bail!("note not found: {}", id),
    };

    println!("--- Note #{} ---", note.id);
    println!("user:      {}", note.user_id);
    println!("passage:   {} {}:{}", note.book, note.chapter, note.verse);
    println!("saved:     {}", format_saved_at(&note.created_at));
    println!();
    println!("{}", note.verse_text);
    println!();
    println!("{}", note.note);
    Ok(())
}

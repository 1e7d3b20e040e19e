//! Rows stored by the note store and the shapes returned to callers.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A user, keyed by an opaque external identifier.
///
/// Only the display name given on first contact is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: NaiveDateTime,
}

/// A stored note, including the passage text captured when it was saved.
///
/// `verse_text` is a snapshot and never tracks later changes to the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i32,
    pub user_id: String,
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
    pub verse_text: String,
    pub note: String,
    pub created_at: NaiveDateTime,
}

/// One line of a user's note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub annotation: String,
    pub created_at: NaiveDateTime,
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
}

impl NoteEntry {
    pub fn location(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub users: i64,
    pub notes: i64,
}

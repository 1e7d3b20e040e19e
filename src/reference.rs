//! Structured scripture references.
//!
//! The resolver accepts any string and lets the source decide whether it
//! exists. Commands that persist a note need the book, chapter and verse as
//! separate values, so they parse the reference first.

use std::fmt;
use std::str::FromStr;

use crate::error::ReferenceError;

/// A "Book Chapter[:Verse]" locator such as `Juan 3:16` or `1 Juan 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

impl Reference {
    /// Parse a reference. The last whitespace-separated token is the
    /// chapter (optionally `chapter:verse`), everything before it the book.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let (book, locator) = match input.rsplit_once(char::is_whitespace) {
            Some((book, locator)) => (book.trim(), locator),
            None if input.chars().any(|c| c.is_ascii_digit()) => {
                return Err(ReferenceError::MissingBook(input.to_string()))
            }
            None => return Err(ReferenceError::MissingChapter(input.to_string())),
        };

        if book.is_empty() {
            return Err(ReferenceError::MissingBook(input.to_string()));
        }

        let (chapter, verse) = match locator.split_once(':') {
            Some((chapter, verse)) => (parse_number(chapter)?, Some(parse_number(verse)?)),
            None => (parse_number(locator)?, None),
        };

        // Collapse inner runs of whitespace so "1   Juan" and "1 Juan" match.
        let book = book.split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(Self {
            book,
            chapter,
            verse,
        })
    }

    /// Parse a reference that must name a single verse.
    pub fn parse_verse(input: &str) -> Result<(Self, u32), ReferenceError> {
        let reference = Self::parse(input)?;
        match reference.verse {
            Some(verse) => Ok((reference, verse)),
            None => Err(ReferenceError::MissingVerse(input.trim().to_string())),
        }
    }
}

fn parse_number(token: &str) -> Result<u32, ReferenceError> {
    match token.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ReferenceError::InvalidNumber(token.to_string())),
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verse {
            Some(verse) => write!(f, "{} {}:{}", self.book, self.chapter, verse),
            None => write!(f, "{} {}", self.book, self.chapter),
        }
    }
}

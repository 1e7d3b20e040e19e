//! Error types for passage resolution and note storage.
//!
//! Resolution failures split into three families: the source could not be
//! reached ([`ResolveError::Fetch`], [`ResolveError::FetchStatus`]), the source
//! answered but had no passage ([`ResolveError::NotFound`]), or something else
//! went wrong while reading the answer ([`ResolveError::Resolution`]).
//!
//! Storage failures distinguish fatal connection loss from constraint
//! violations so callers can render them differently.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Transport failure reaching the passage source.
    #[error("failed to fetch passage '{reference}': {source}")]
    Fetch {
        reference: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with a non-2xx status.
    #[error("passage source returned {status} for '{reference}'")]
    FetchStatus {
        reference: String,
        status: reqwest::StatusCode,
    },

    /// The page has no passage container, usually an invalid reference.
    #[error("no passage found for '{reference}'")]
    NotFound { reference: String },

    #[error("could not resolve '{reference}': {source}")]
    Resolution {
        reference: String,
        #[source]
        source: BoxError,
    },
}

impl ResolveError {
    /// Fetch failures may succeed on a later attempt; the others will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::FetchStatus { .. })
    }

    pub fn reference(&self) -> &str {
        match self {
            Self::Fetch { reference, .. }
            | Self::FetchStatus { reference, .. }
            | Self::NotFound { reference }
            | Self::Resolution { reference, .. } => reference,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database url is not configured (set db.url or the DATABASE_URL environment variable)")]
    MissingUrl,

    #[error("invalid database configuration: {0}")]
    InvalidConfig(String),

    /// Raised once the bounded connect loop gives up.
    #[error("could not connect to the database after {attempts} attempt(s): {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// The manager already gave up connecting and will not retry on its own.
    #[error("database connection is unavailable; reconnect explicitly")]
    Unavailable,

    #[error("constraint violation: {message}")]
    Constraint {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let message = match &err {
            sqlx::Error::Database(db_err) => {
                use sqlx::error::ErrorKind;
                match db_err.kind() {
                    ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::UniqueViolation
                    | ErrorKind::CheckViolation => Some(db_err.message().to_string()),
                    _ => None,
                }
            }
            _ => None,
        };

        match message {
            Some(message) => StoreError::Constraint {
                message,
                source: err,
            },
            None => StoreError::Database(err),
        }
    }
}

/// A reference string that does not have the "Book Chapter[:Verse]" shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("reference is empty")]
    Empty,
    #[error("reference '{0}' is missing a book name")]
    MissingBook(String),
    #[error("reference '{0}' is missing a chapter")]
    MissingChapter(String),
    #[error("'{0}' is not a valid chapter or verse number")]
    InvalidNumber(String),
    #[error("reference '{0}' needs a verse (use Book Chapter:Verse)")]
    MissingVerse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_only_for_fetch_failures() {
        let status = ResolveError::FetchStatus {
            reference: "Juan 3:16".into(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert!(status.is_retryable());

        let missing = ResolveError::NotFound {
            reference: "Juan 99:99".into(),
        };
        assert!(!missing.is_retryable());
        assert_eq!(missing.reference(), "Juan 99:99");

        let other = ResolveError::Resolution {
            reference: "Juan 3".into(),
            source: "bad markup".into(),
        };
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_non_database_errors_are_not_constraints() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_constraint());
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_display_mentions_environment_variable() {
        assert!(StoreError::MissingUrl.to_string().contains("DATABASE_URL"));
    }
}

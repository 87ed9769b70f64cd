//! Domain error taxonomy
//!
//! Every failure a manager or command can raise is a recoverable domain
//! error: the outer dispatch loop prints the message and carries on.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} '{name}' is in use and cannot be deleted")]
    InUse { kind: &'static str, name: String },

    #[error("species '{species}' is already in category '{category}'")]
    AlreadyInCategory { species: String, category: String },

    #[error("rating '{rating}' does not exist in scheme '{scheme}'")]
    RatingNotFound { rating: String, scheme: String },

    #[error("status scheme '{0}' does not exist")]
    SchemeNotFound(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("unknown report type '{0}'")]
    UnknownReportType(String),

    #[error("unknown export type '{0}'")]
    UnknownExportType(String),

    #[error("there is no history entry {0}")]
    InvalidHistoryEntry(usize),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("'{0}' is not a valid date (expected dd/mm/yyyy)")]
    InvalidDate(String),

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructors keep manager call sites short.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn in_use(kind: &'static str, name: impl Into<String>) -> Self {
        Error::InUse {
            kind,
            name: name.into(),
        }
    }
}

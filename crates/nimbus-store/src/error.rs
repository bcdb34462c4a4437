//! Error types for nimbus-store.

use std::path::PathBuf;

/// Result type for nimbus-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nimbus-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record that was just written could not be read back.
    #[error("Record not found for city: {0}")]
    RecordNotFound(String),
}

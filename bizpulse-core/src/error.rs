//! Error types for bizpulse-core

use thiserror::Error;

/// Main error type for the bizpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A write to the record store failed while persisting a primary entity
    #[error("storage error: {0}")]
    Storage(String),

    /// Client not found
    #[error("client not found: {0}")]
    ClientNotFound(String),

    /// Project not found
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Input rejected before it reached storage
    #[error("invalid input: {0}")]
    Validation(String),

    /// `stop_timer` was called with nothing running
    #[error("no timer is running")]
    NoActiveTimer,
}

/// Result type alias for bizpulse-core
pub type Result<T> = std::result::Result<T, Error>;

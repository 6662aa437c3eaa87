//! Core error types for studytimer-core.
//!
//! This module defines the error hierarchy using thiserror. None of these
//! errors can leave the timer engine in a corrupted state: validation errors
//! are returned before anything is mutated, and recorder/notifier errors are
//! logged by the engine and otherwise ignored.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studytimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session recorder errors
    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The timer driver task has shut down.
    #[error("Timer driver is not running")]
    DriverClosed,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Settings validation errors.
///
/// Returned by [`SettingsStore::apply`](crate::timer::SettingsStore::apply)
/// before anything is mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric setting is outside its declared range.
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl ValidationError {
    /// Name of the offending settings field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

/// Failures reported by a [`SessionRecorder`](crate::recorder::SessionRecorder).
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Local storage rejected the record.
    #[error("Failed to store session: {0}")]
    Storage(#[from] DatabaseError),

    /// Remote endpoint could not be reached.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status.
    #[error("Session endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid endpoint URL.
    #[error("Invalid session endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// Asynchronous recorders need a tokio runtime to spawn on.
    #[error("No tokio runtime available to deliver the session")]
    NoRuntime,

    /// The background delivery thread is gone.
    #[error("Session delivery worker stopped")]
    WorkerStopped,
}

/// Failures reported by a [`Notifier`](crate::notify::Notifier).
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Notification permission has not been granted.
    #[error("Notification permission not granted")]
    PermissionDenied,

    /// The platform notification service rejected the alert.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The background delivery thread is gone.
    #[error("Notification delivery worker stopped")]
    WorkerStopped,

    /// IO errors while writing the alert
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

//! Core error types for focusmonitor-core.
//!
//! One top-level [`CoreError`] wraps the per-area error enums via
//! thiserror `#[from]` conversions.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusmonitor-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid session requests and transitions
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Settings errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected session requests. These are reported synchronously and never
/// change machine state.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Requested duration was zero
    #[error("Focus duration must be positive")]
    InvalidDuration,

    /// Scheduled start was not strictly in the future
    #[error("Scheduled time {requested} is not in the future (now: {now})")]
    ScheduledInPast {
        requested: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    },

    /// A session is already live
    #[error("A session is already {status:?}; stop it first")]
    AlreadyActive {
        status: crate::session::SessionStatus,
    },
}

/// Record-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the store
    #[error("Failed to open record store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A record with this id is already persisted
    #[error("A record with id {0} already exists")]
    DuplicateId(String),

    /// Underlying storage rejected the operation
    #[error("Record store unavailable: {0}")]
    Unavailable(rusqlite::Error),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => match e.code {
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
                | rusqlite::ErrorCode::DiskFull
                | rusqlite::ErrorCode::ReadOnly => StoreError::Unavailable(err),
                _ => StoreError::QueryFailed(err.to_string()),
            },
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Settings errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to load the settings file
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save the settings file
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown settings key
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    /// Value cannot be parsed for the key's type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

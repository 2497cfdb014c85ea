//! Error types for PackVault
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for PackVault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the versioned archive and migration orchestrator
#[derive(Debug, Error)]
pub enum Error {
    /// No usable schema source exists anywhere (fatal at initialization)
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Migration requested when the active schema already matches the live data
    #[error("Already current at version {version}")]
    AlreadyCurrent {
        /// The version both sides agree on
        version: String,
    },

    /// No pack snapshot exists for the version a migration must diff against
    #[error("No pack snapshot archived for version {version}")]
    HistoryMissing {
        /// The previous version whose snapshot is absent
        version: String,
    },

    /// The diff engine failed; nothing was committed
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// Archive entry not found
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Archive container is damaged (checksum or format mismatch)
    #[error("Archive corruption: {0}")]
    Corruption(String),

    /// I/O error (archive or filesystem)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// Report decoding error
    #[error("Decode error: {0}")]
    Decode(String),
}

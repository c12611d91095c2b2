//! Error types for flight-log decoding.
//!
//! Only failures that end a session are errors in this crate. Corruption inside
//! the log itself (invalid schema records, NaN payloads, time going backwards)
//! is recoverable and is reported through
//! [`LoadingStatus`](crate::LoadingStatus) instead.
//!
//! ## Error Categories
//!
//! - **File Errors**: the log file could not be opened or read
//! - **Sink Errors**: the data sink refused a transaction, type or row
//! - **Config Errors**: a [`ParserConfig`](crate::ParserConfig) failed validation
//! - **Stream Errors**: the async decoding task could not be joined
//!
//! ## Recovery
//!
//! ```rust
//! use dataflash::DataflashError;
//!
//! let error = DataflashError::sink_failed("add_row", "disk full");
//! assert!(error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decoding operations.
pub type Result<T, E = DataflashError> = std::result::Result<T, E>;

/// Main error type for decoding sessions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DataflashError {
    #[error("Log file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data sink failed during {operation}: {message}")]
    Sink { operation: String, message: String },

    #[error("Invalid parser configuration: {details}")]
    Config { details: String },

    #[error("Decoding task failed: {details}")]
    Stream { details: String },
}

impl DataflashError {
    /// Returns whether this error ends the session it occurred in.
    ///
    /// Configuration errors are raised before a session starts and leave
    /// nothing half-written, so they are not fatal in that sense.
    pub fn is_fatal(&self) -> bool {
        match self {
            DataflashError::File { .. } => true,
            DataflashError::Sink { .. } => true,
            DataflashError::Stream { .. } => true,
            DataflashError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DataflashError::File { .. } => vec![
                "Check file exists and is readable",
                "Verify the file is a binary dataflash log",
                "Check file permissions",
            ],
            DataflashError::Sink { .. } => vec![
                "Check the data sink is open and writable",
                "Inspect the sink's own error log",
                "Retry the import into a fresh sink",
            ],
            DataflashError::Config { .. } => vec![
                "Check the configuration file against the documented keys",
                "Remove the key to fall back to its default",
            ],
            DataflashError::Stream { .. } => vec![
                "Check the decoding task was not cancelled by runtime shutdown",
                "Run the session synchronously to surface the panic",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        DataflashError::File { path, source }
    }

    /// Helper constructor for sink failures.
    pub fn sink_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DataflashError::Sink { operation: operation.into(), message: message.into() }
    }

    /// Helper constructor for configuration validation errors.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        DataflashError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for DataflashError {
    fn from(err: std::io::Error) -> Self {
        DataflashError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

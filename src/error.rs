//! Error types for compose-events.
//!
//! Only protocol violations are errors here. A Compose operation that failed
//! for some resource is reported as an [`Event`](crate::compose::Event) with
//! status `Error`, never as an [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for compose-events operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for compose-events.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// The captured stderr is not valid UTF-8.
    #[error("Compose output is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A JSON-lines progress record could not be decoded.
    #[error("Cannot parse JSON event from line {line:?}: {source}")]
    JsonEvent {
        /// The offending line
        line: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A line in JSON mode that is valid input but not an event record.
    #[error("Unexpected record {line:?}: {message}")]
    UnexpectedRecord {
        /// The offending line
        line: String,
        /// Error message
        message: String,
    },

    /// A Compose version string that is not semver-like.
    #[error("Invalid Compose version '{version}': {message}")]
    InvalidVersion {
        /// Version string as reported by `docker compose version`
        version: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Installing the global tracing subscriber failed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new JSON event error.
    pub fn json_event(line: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonEvent {
            line: line.into(),
            source,
        }
    }

    /// Creates a new unexpected record error.
    pub fn unexpected_record(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedRecord {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid version error.
    pub fn invalid_version(version: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid config error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error means Compose broke the output contract
    /// (undecodable bytes or records), as opposed to a local setup problem.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Error::Utf8(_) | Error::JsonEvent { .. } | Error::UnexpectedRecord { .. }
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}

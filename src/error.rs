//! Unified error types for Quarry.
//!
//! Session-scoped operations fail with [`QuarryError::NoActiveSession`] when
//! no session is live. Provider failures are always recoverable: callers log
//! them through [`FailOpen`] and fall back to rule-based behaviour. Storage
//! failures propagate to whoever asked for the write.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// I/O errors from vault or session file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A session-scoped operation was invoked with no live session.
    #[error("no active atomisation session")]
    NoActiveSession,

    /// Text-generation provider unavailable or failed.
    #[error("provider error: {message}")]
    Provider { message: String },

    /// JSON or markdown parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Quarry note discovery errors.
    #[error("discovery error: {message}")]
    Discovery { message: String },

    /// Template resolution or substitution errors.
    #[error("template error: {message}")]
    Template { message: String },

    /// A phase name that is not one of the workflow phases.
    #[error("invalid phase: '{value}'")]
    InvalidPhase { value: String },

    /// Atom creation aborted part-way through a batch.
    ///
    /// `created` lists the vault paths written before the failure; they are
    /// left in place.
    #[error("atom creation aborted after {} file(s): {source}", created.len())]
    Materialise {
        created: Vec<String>,
        #[source]
        source: Box<QuarryError>,
    },
}

/// A specialized Result type for Quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;

impl QuarryError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a discovery error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a template error.
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an invalid phase error.
    pub fn invalid_phase(value: impl Into<String>) -> Self {
        Self::InvalidPhase {
            value: value.into(),
        }
    }

    /// Wrap a failure that interrupted a materialisation batch.
    pub fn materialise(created: Vec<String>, source: QuarryError) -> Self {
        Self::Materialise {
            created,
            source: Box::new(source),
        }
    }

    /// Whether the failure can be recovered from by falling back to rules.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

impl From<io::Error> for QuarryError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for QuarryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and carry on with a fallback value.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }
}

/// Exit codes for the Quarry CLI.
pub mod exit_codes {
    /// Command completed.
    pub const OK: i32 = 0;

    /// Command failed.
    pub const ERROR: i32 = 1;

    /// Command needs a live session and none exists.
    pub const NO_SESSION: i32 = 2;
}

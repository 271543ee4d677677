//! Error types for the ckjm-driver library.
//!
//! A run reports at most one terminal failure. Everything that can go wrong
//! while staging or dispatching a run collapses into one of two categories:
//! the configuration was unusable, or an I/O operation failed. The underlying
//! cause is preserved so the host can print a useful diagnostic.

use std::io;

use thiserror::Error;

/// Main result type for driver operations.
pub type Result<T> = std::result::Result<T, TaskError>;

/// The single failure type reported for a run.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Required configuration missing or structurally invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable error message
        message: String,
        /// Configuration attribute that caused the error
        field: Option<String>,
    },

    /// Failure to scan, open, read or write while performing the run.
    #[error("Error file handling: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error naming the offending attribute
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether this error was raised while validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Prefix the message with additional context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            Self::Config { message, .. } | Self::Io { message, .. } => {
                *message = format!("{context}: {message}");
            }
        }
        self
    }
}

impl From<io::Error> for TaskError {
    fn from(err: io::Error) -> Self {
        let message = err.to_string();
        Self::io(message, err)
    }
}

impl From<serde_yaml::Error> for TaskError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(format!("YAML parsing failed: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add lazily built context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TaskError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

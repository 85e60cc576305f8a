//! Error handling for the MProbe workshop
//!
//! This module defines the crate error type and a Result alias. Errors only
//! travel between the backend seam and the state holders; the table adapters
//! convert them into cell sentinels before anything reaches a view.

use thiserror::Error;

/// Main error type for workshop operations
#[derive(Error, Debug)]
pub enum WorkshopError {
    /// A call into the analysis library failed
    #[error("Library error: {0}")]
    Library(String),

    /// The problem instance or analysis handle is not loaded
    #[error("Not loaded: {0}")]
    NotLoaded(&'static str),

    /// An entity index outside the backing collection
    #[error("{kind} index {index} out of range (0..{len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// The library returned a code this crate does not know
    #[error("Unexpected {what} code {code:#04x}")]
    UnexpectedCode { what: &'static str, code: i32 },

    /// A user-entered value was rejected
    #[error("{0}")]
    Validation(String),

    /// Loading a problem instance failed
    #[error("Load error: {0}")]
    Load(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background task was cancelled before finishing
    #[error("Cancelled")]
    Cancelled,

    /// The analysis handle is in use by a running analysis
    #[error("Analysis in progress")]
    Busy,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WorkshopError>,
    },
}

impl WorkshopError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WorkshopError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True for validation failures, which are shown to the user verbatim
    pub fn is_validation(&self) -> bool {
        match self {
            WorkshopError::Validation(_) => true,
            WorkshopError::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Result type alias for workshop operations
pub type Result<T> = std::result::Result<T, WorkshopError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl From<toml::de::Error> for WorkshopError {
    fn from(err: toml::de::Error) -> Self {
        WorkshopError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for WorkshopError {
    fn from(err: toml::ser::Error) -> Self {
        WorkshopError::Serialization(err.to_string())
    }
}

//! Engine error types.

use std::io;
use thiserror::Error;

use booksmart_store::StoreError;

use crate::diagnostics::SourceFailure;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every calendar source failed; there is nothing to show.
    #[error("could not load calendar: {}", describe(.failures))]
    CalendarUnavailable { failures: Vec<SourceFailure> },

    /// A store call outside an aggregation pass failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error (config file, snapshot file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn describe(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the error means no calendar data could be loaded.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::CalendarUnavailable { .. })
    }
}

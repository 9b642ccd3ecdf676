//! Error types for store access and record normalization.

use std::fmt;
use thiserror::Error;

/// The category of a store error.
///
/// Reported per failed source by the engine, together with whether a later
/// pass may succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    /// The store rejected our credentials (401).
    AuthenticationFailed,
    /// The user lacks permission on the resource (403).
    AuthorizationFailed,
    /// Connection failed, DNS resolution failed, body could not be read.
    NetworkError,
    /// The fetch did not complete within the configured time.
    Timeout,
    /// Too many requests (429).
    RateLimited,
    /// The store returned a 5xx status.
    ServerError,
    /// Unexpected status or a body that could not be decoded.
    InvalidResponse,
    /// The endpoint does not exist (404).
    NotFound,
    /// Missing or invalid configuration (bad URL, unreadable snapshot).
    ConfigurationError,
}

impl StoreErrorCode {
    /// Returns true if this error is transient and the fetch may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while reading from a store.
#[derive(Debug, Error)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    /// The store that produced this error (e.g. "http", "static").
    store: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Creates a new store error with the given code and message.
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            store: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Timeout, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::ConfigurationError, message)
    }

    /// Sets the store name for this error.
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the store name, if set.
    pub fn store(&self) -> Option<&str> {
        self.store.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref store) = self.store {
            write!(f, "[{}] ", store)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The kind of record a store returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Meeting,
    Task,
    Recurrence,
    Participant,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Task => "task",
            Self::Recurrence => "recurrence",
            Self::Participant => "participant",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that could not be turned into a calendar event or rule.
///
/// The record is skipped; callers count it and carry on with the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {entity} {}: {reason}", display_id(.id))]
pub struct MalformedEntity {
    /// What kind of record failed.
    pub entity: RecordKind,
    /// The record's store id, when it could be read.
    pub id: Option<i64>,
    /// Why the record was rejected.
    pub reason: String,
}

fn display_id(id: &Option<i64>) -> String {
    id.map_or_else(|| "(no id)".to_string(), |id| format!("#{}", id))
}

impl MalformedEntity {
    /// Creates a malformed-entity error.
    pub fn new(entity: RecordKind, id: Option<i64>, reason: impl Into<String>) -> Self {
        Self {
            entity,
            id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(StoreErrorCode::NetworkError.is_retryable());
        assert!(StoreErrorCode::Timeout.is_retryable());
        assert!(StoreErrorCode::ServerError.is_retryable());
        assert!(!StoreErrorCode::AuthenticationFailed.is_retryable());
        assert!(!StoreErrorCode::InvalidResponse.is_retryable());
    }

    #[test]
    fn store_error_with_store() {
        let err = StoreError::rate_limited("slow down").with_store("http");
        assert_eq!(err.code(), StoreErrorCode::RateLimited);
        assert_eq!(err.store(), Some("http"));
        assert_eq!(err.to_string(), "[http] rate_limited: slow down");
    }

    #[test]
    fn store_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk gone");
        let err = StoreError::configuration("cannot read snapshot").with_source(io_err);
        assert!(err.source().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_entity_display() {
        let err = MalformedEntity::new(RecordKind::Meeting, Some(12), "missing title");
        assert_eq!(err.to_string(), "malformed meeting #12: missing title");

        let err = MalformedEntity::new(RecordKind::Task, None, "not an object");
        assert_eq!(err.to_string(), "malformed task (no id): not an object");
    }
}

//! HTTP client for the booking store's REST API.
//!
//! Reads the four listing endpoints:
//! - `GET {base}/meetings/` and `GET {base}/tasks/` return JSON arrays
//! - `GET {base}/recurrences/` returns `{"recurring_meetings": [...]}`
//! - `GET {base}/participants/` returns a JSON array

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::raw::{RawMeeting, RawParticipant, RawRecurrence, RawTask, RecurrenceList, decode_records};
use crate::store::{BoxFuture, CalendarStore, Source};

/// Configuration for the HTTP store.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the API. Always ends with `/`.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl HttpStoreConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("booksmart/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the URL of a source's listing endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, source: Source) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("{}/", source.as_str()))
    }
}

/// A [`CalendarStore`] backed by the booking REST API.
pub struct HttpStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpStore {
    /// Creates a new HTTP store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                StoreError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_store("http")
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpStoreConfig {
        &self.config
    }

    /// Fetches a listing endpoint and returns the body text.
    async fn get(&self, source: Source) -> StoreResult<String> {
        let url = self.config.endpoint(source).map_err(|e| {
            StoreError::configuration(format!("Invalid endpoint for {}: {}", source, e))
        })?;
        trace!(url = %url, "Sending request");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                let error = if e.is_timeout() {
                    StoreError::timeout(format!("Request for {} timed out", source))
                } else {
                    StoreError::network(format!("Request failed: {}", e))
                };
                error.with_store("http").with_source(e)
            })?;

        handle_response(response).await
    }

    async fn fetch_list(&self, source: Source) -> StoreResult<Vec<Value>> {
        let body = self.get(source).await?;
        let values = decode_array(&body)?;
        debug!(source = %source, count = values.len(), "Fetched listing");
        Ok(values)
    }
}

/// Handles the HTTP response and extracts the body.
async fn handle_response(response: Response) -> StoreResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if status.is_success() {
        return response
            .text()
            .await
            .map_err(|e| {
                StoreError::network(format!("Failed to read response: {}", e)).with_store("http")
            });
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Maps an unsuccessful status to a store error.
fn status_error(status: StatusCode, body: &str) -> StoreError {
    let error = match status {
        StatusCode::UNAUTHORIZED => StoreError::authentication("Authentication failed"),
        StatusCode::FORBIDDEN => StoreError::authorization("Access denied"),
        StatusCode::NOT_FOUND => StoreError::not_found("Endpoint not found"),
        StatusCode::TOO_MANY_REQUESTS => StoreError::rate_limited("Too many requests to store"),
        s if s.is_server_error() => StoreError::server(format!("Server error ({}): {}", s, body)),
        s => {
            warn!(status = %s, body = %body, "Unexpected response status");
            StoreError::invalid_response(format!("Unexpected status {}: {}", s, body))
        }
    };
    error.with_store("http")
}

/// Decodes a JSON array body.
fn decode_array(body: &str) -> StoreResult<Vec<Value>> {
    serde_json::from_str(body).map_err(|e| {
        StoreError::invalid_response(format!("Expected a JSON array: {}", e)).with_store("http")
    })
}

/// Decodes the recurrences envelope.
fn decode_recurrences(body: &str) -> StoreResult<Vec<Value>> {
    serde_json::from_str::<RecurrenceList>(body)
        .map(|list| list.recurring_meetings)
        .map_err(|e| {
            StoreError::invalid_response(format!("Expected a recurring_meetings object: {}", e))
                .with_store("http")
        })
}

impl CalendarStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    fn list_meetings(&self) -> BoxFuture<'_, StoreResult<Vec<RawMeeting>>> {
        Box::pin(async move { Ok(decode_records(self.fetch_list(Source::Meetings).await?)) })
    }

    fn list_tasks(&self) -> BoxFuture<'_, StoreResult<Vec<RawTask>>> {
        Box::pin(async move { Ok(decode_records(self.fetch_list(Source::Tasks).await?)) })
    }

    fn list_recurrence_rules(&self) -> BoxFuture<'_, StoreResult<Vec<RawRecurrence>>> {
        Box::pin(async move {
            let body = self.get(Source::Recurrences).await?;
            let values = decode_recurrences(&body)?;
            debug!(count = values.len(), "Fetched recurrence rules");
            Ok(decode_records(values))
        })
    }

    fn list_participants(&self) -> BoxFuture<'_, StoreResult<Vec<RawParticipant>>> {
        Box::pin(async move { Ok(decode_records(self.fetch_list(Source::Participants).await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;

    mod config {
        use super::*;

        #[test]
        fn adds_trailing_slash() {
            let config = HttpStoreConfig::new("http://localhost:8000/api").unwrap();
            assert_eq!(config.base_url.as_str(), "http://localhost:8000/api/");
            assert_eq!(
                config.endpoint(Source::Meetings).unwrap().as_str(),
                "http://localhost:8000/api/meetings/"
            );
        }

        #[test]
        fn root_base_url() {
            let config = HttpStoreConfig::new("http://localhost:8000").unwrap();
            assert_eq!(
                config.endpoint(Source::Recurrences).unwrap().as_str(),
                "http://localhost:8000/recurrences/"
            );
        }

        #[test]
        fn rejects_invalid_url() {
            assert!(HttpStoreConfig::new("not a url").is_err());
        }

        #[test]
        fn client_creation() {
            let config = HttpStoreConfig::new("http://localhost:8000/")
                .unwrap()
                .with_timeout(Duration::from_secs(5))
                .with_user_agent("booksmart-test");
            let store = HttpStore::new(config).unwrap();
            assert_eq!(store.name(), "http");
            assert_eq!(store.config().user_agent, "booksmart-test");
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn status_mapping() {
            let cases = [
                (StatusCode::UNAUTHORIZED, StoreErrorCode::AuthenticationFailed),
                (StatusCode::FORBIDDEN, StoreErrorCode::AuthorizationFailed),
                (StatusCode::NOT_FOUND, StoreErrorCode::NotFound),
                (StatusCode::TOO_MANY_REQUESTS, StoreErrorCode::RateLimited),
                (StatusCode::BAD_GATEWAY, StoreErrorCode::ServerError),
                (StatusCode::IM_A_TEAPOT, StoreErrorCode::InvalidResponse),
            ];
            for (status, code) in cases {
                let err = status_error(status, "");
                assert_eq!(err.code(), code, "status {}", status);
                assert_eq!(err.store(), Some("http"));
            }
        }

        #[test]
        fn decodes_array_body() {
            let values = decode_array(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
            assert_eq!(values.len(), 2);
        }

        #[test]
        fn non_array_body_is_invalid() {
            let err = decode_array(r#"{"detail": "nope"}"#).unwrap_err();
            assert_eq!(err.code(), StoreErrorCode::InvalidResponse);
        }

        #[test]
        fn decodes_recurrence_envelope() {
            let values = decode_recurrences(
                r#"{"recurring_meetings": [{"recurrence_id": 1, "frequency": "daily"}]}"#,
            )
            .unwrap();
            let rules: Vec<RawRecurrence> = decode_records(values);
            assert_eq!(rules[0].recurrence_id, Some(1));
            assert_eq!(rules[0].frequency.as_deref(), Some("daily"));
        }

        #[test]
        fn bare_array_is_not_an_envelope() {
            assert!(decode_recurrences("[]").is_err());
        }
    }
}

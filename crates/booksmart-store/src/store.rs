//! CalendarStore trait definition and in-memory stores.
//!
//! The engine only reads from the store. A store lists four kinds of
//! records; each listing is an independent fetch that may fail on its own.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreErrorCode, StoreResult};
use crate::raw::{RawMeeting, RawParticipant, RawRecord, RawRecurrence, RawTask, decode_records};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One of the store's listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Meetings,
    Tasks,
    Recurrences,
    Participants,
}

impl Source {
    /// The three sources an aggregation pass reads.
    pub const CALENDAR: [Source; 3] = [Source::Meetings, Source::Tasks, Source::Recurrences];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meetings => "meetings",
            Self::Tasks => "tasks",
            Self::Recurrences => "recurrences",
            Self::Participants => "participants",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the booking store.
///
/// Implementations must be `Send + Sync`; the engine holds them behind an
/// `Arc` and runs the listings concurrently.
pub trait CalendarStore: Send + Sync {
    /// Returns the name of this store (e.g. "http", "static").
    fn name(&self) -> &str;

    /// Lists one-off meeting rows.
    fn list_meetings(&self) -> BoxFuture<'_, StoreResult<Vec<RawMeeting>>>;

    /// Lists tasks.
    fn list_tasks(&self) -> BoxFuture<'_, StoreResult<Vec<RawTask>>>;

    /// Lists recurrence rules.
    fn list_recurrence_rules(&self) -> BoxFuture<'_, StoreResult<Vec<RawRecurrence>>>;

    /// Lists known participants.
    fn list_participants(&self) -> BoxFuture<'_, StoreResult<Vec<RawParticipant>>>;
}

/// A store that fails every listing with the same error.
///
/// Stands in for a store that could not be configured.
#[derive(Debug)]
pub struct ErrorStore {
    name: String,
    code: StoreErrorCode,
    message: String,
}

impl ErrorStore {
    /// Creates a new error store.
    pub fn new(name: impl Into<String>, error: StoreError) -> Self {
        Self {
            name: name.into(),
            code: error.code(),
            message: error.message().to_string(),
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, StoreResult<T>> {
        let error = StoreError::new(self.code, &self.message).with_store(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl CalendarStore for ErrorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_meetings(&self) -> BoxFuture<'_, StoreResult<Vec<RawMeeting>>> {
        self.fail()
    }

    fn list_tasks(&self) -> BoxFuture<'_, StoreResult<Vec<RawTask>>> {
        self.fail()
    }

    fn list_recurrence_rules(&self) -> BoxFuture<'_, StoreResult<Vec<RawRecurrence>>> {
        self.fail()
    }

    fn list_participants(&self) -> BoxFuture<'_, StoreResult<Vec<RawParticipant>>> {
        self.fail()
    }
}

/// The full contents of a store, as JSON records.
///
/// Field names match the store's listing payloads, so a snapshot can be
/// captured by saving the four responses side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub meetings: Vec<Value>,
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub recurring_meetings: Vec<Value>,
    #[serde(default)]
    pub participants: Vec<Value>,
}

impl Snapshot {
    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an invalid-response error if the text is not a snapshot object.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            StoreError::invalid_response(format!("invalid snapshot: {}", e)).with_source(e)
        })
    }

    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read, or an
    /// invalid-response error if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StoreError::configuration(format!("cannot read snapshot {}: {}", path.display(), e))
                .with_source(e)
        })?;
        Self::from_json(&text)
    }
}

/// An in-memory store.
///
/// Listings are decoded from the snapshot on every call, the same way the
/// HTTP store decodes response bodies. Individual sources can be made to
/// fail or to respond late.
#[derive(Debug, Default)]
pub struct StaticStore {
    snapshot: Snapshot,
    failures: HashMap<Source, (StoreErrorCode, String)>,
    delays: HashMap<Source, Duration>,
}

impl StaticStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store serving the given snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Builder method to add a meeting record.
    pub fn with_meeting(mut self, record: Value) -> Self {
        self.snapshot.meetings.push(record);
        self
    }

    /// Builder method to add a task record.
    pub fn with_task(mut self, record: Value) -> Self {
        self.snapshot.tasks.push(record);
        self
    }

    /// Builder method to add a recurrence record.
    pub fn with_recurrence(mut self, record: Value) -> Self {
        self.snapshot.recurring_meetings.push(record);
        self
    }

    /// Builder method to add a participant record.
    pub fn with_participant(mut self, record: Value) -> Self {
        self.snapshot.participants.push(record);
        self
    }

    /// Builder method to make a source fail.
    pub fn with_failure(mut self, source: Source, error: StoreError) -> Self {
        self.failures
            .insert(source, (error.code(), error.message().to_string()));
        self
    }

    /// Builder method to delay a source's response.
    pub fn with_delay(mut self, source: Source, delay: Duration) -> Self {
        self.delays.insert(source, delay);
        self
    }

    /// Returns the snapshot served by this store.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn list<T: RawRecord + Send + 'static>(
        &self,
        source: Source,
        values: &[Value],
    ) -> BoxFuture<'_, StoreResult<Vec<T>>> {
        let delay = self.delays.get(&source).copied();
        let outcome = match self.failures.get(&source) {
            Some((code, message)) => Err(StoreError::new(*code, message).with_store("static")),
            None => Ok(values.to_vec()),
        };
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let values = outcome?;
            debug!(source = %source, count = values.len(), "Serving static records");
            Ok(decode_records(values))
        })
    }
}

impl CalendarStore for StaticStore {
    fn name(&self) -> &str {
        "static"
    }

    fn list_meetings(&self) -> BoxFuture<'_, StoreResult<Vec<RawMeeting>>> {
        self.list(Source::Meetings, &self.snapshot.meetings)
    }

    fn list_tasks(&self) -> BoxFuture<'_, StoreResult<Vec<RawTask>>> {
        self.list(Source::Tasks, &self.snapshot.tasks)
    }

    fn list_recurrence_rules(&self) -> BoxFuture<'_, StoreResult<Vec<RawRecurrence>>> {
        self.list(Source::Recurrences, &self.snapshot.recurring_meetings)
    }

    fn list_participants(&self) -> BoxFuture<'_, StoreResult<Vec<RawParticipant>>> {
        self.list(Source::Participants, &self.snapshot.participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn store() -> StaticStore {
        StaticStore::new()
            .with_meeting(json!({"id": 1, "title": "Sync", "date": "2024-01-01",
                "start_time": "09:00", "end_time": "10:00"}))
            .with_task(json!({"id": 2, "title": "Report", "due_date": "2024-01-02"}))
            .with_participant(json!({"id": 3, "name": "Alice", "email": "alice@example.com"}))
    }

    #[tokio::test]
    async fn static_store_lists_records() {
        let store = store();
        let meetings = store.list_meetings().await.unwrap();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].title.as_deref(), Some("Sync"));
        assert_eq!(store.list_tasks().await.unwrap().len(), 1);
        assert!(store.list_recurrence_rules().await.unwrap().is_empty());
        assert_eq!(store.list_participants().await.unwrap()[0].id, Some(3));
    }

    #[tokio::test]
    async fn static_store_failure_injection() {
        let store = store().with_failure(Source::Tasks, StoreError::server("boom"));
        assert!(store.list_meetings().await.is_ok());

        let err = store.list_tasks().await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::ServerError);
        assert_eq!(err.store(), Some("static"));
    }

    #[tokio::test]
    async fn static_store_delay() {
        let store = store().with_delay(Source::Meetings, Duration::from_millis(5));
        let started = std::time::Instant::now();
        store.list_meetings().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn error_store_fails_everything() {
        let store = ErrorStore::new("http", StoreError::authentication("bad token"));
        assert_eq!(store.name(), "http");

        let err = store.list_meetings().await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::AuthenticationFailed);
        assert_eq!(err.store(), Some("http"));
        assert!(store.list_tasks().await.is_err());
        assert!(store.list_recurrence_rules().await.is_err());
        assert!(store.list_participants().await.is_err());
    }

    mod snapshot {
        use super::*;

        #[test]
        fn from_json_defaults_missing_lists() {
            let snapshot = Snapshot::from_json(r#"{"meetings": [{"id": 1}]}"#).unwrap();
            assert_eq!(snapshot.meetings.len(), 1);
            assert!(snapshot.recurring_meetings.is_empty());
        }

        #[test]
        fn from_json_rejects_garbage() {
            let err = Snapshot::from_json("[1, 2]").unwrap_err();
            assert_eq!(err.code(), StoreErrorCode::InvalidResponse);
        }

        #[test]
        fn from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(
                file,
                r#"{{"recurring_meetings": [{{"recurrence_id": 4, "frequency": "weekly"}}]}}"#
            )
            .unwrap();

            let snapshot = Snapshot::from_file(file.path()).unwrap();
            let store = StaticStore::from_snapshot(snapshot);
            assert_eq!(store.snapshot().recurring_meetings.len(), 1);
        }

        #[test]
        fn missing_file_is_configuration_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = Snapshot::from_file(dir.path().join("absent.json")).unwrap_err();
            assert_eq!(err.code(), StoreErrorCode::ConfigurationError);
        }
    }
}

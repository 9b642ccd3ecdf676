//! Raw records as the store returns them.
//!
//! Fields are kept loosely typed (strings, optional everything) so that a
//! bad record can be reported with its id instead of failing the whole
//! list. Turning them into calendar types is the job of
//! [`crate::normalize`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::RecordKind;

/// A record type that can be decoded element by element from a JSON list.
pub trait RawRecord: DeserializeOwned {
    /// What this record describes.
    const KIND: RecordKind;
    /// JSON field holding the record's id.
    const ID_FIELD: &'static str = "id";

    /// Builds a placeholder for an element that failed to decode.
    fn undecodable(id: Option<i64>, reason: String) -> Self;

    /// Returns the decode failure, if this record is a placeholder.
    fn decode_error(&self) -> Option<&str>;
}

/// Decodes a list of JSON values into records.
///
/// Elements that fail to decode are kept as placeholders carrying the
/// failure, so normalization can report them.
pub fn decode_records<T: RawRecord>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .map(|value| {
            let id = value.get(T::ID_FIELD).and_then(Value::as_i64);
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(entity = %T::KIND, id = ?id, error = %e, "Undecodable record");
                T::undecodable(id, e.to_string())
            })
        })
        .collect()
}

/// A one-off meeting row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeeting {
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Expected to be an array of `{id, name, email}` objects.
    #[serde(default)]
    pub participants: Value,
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawRecord for RawMeeting {
    const KIND: RecordKind = RecordKind::Meeting;

    fn undecodable(id: Option<i64>, reason: String) -> Self {
        Self {
            id,
            decode_error: Some(reason),
            ..Self::default()
        }
    }

    fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }
}

/// A task with a due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD`, or a date-time `YYYY-MM-DDTHH:MM[:SS]`.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Array of `{"id", "name"}` objects; anything else means none.
    #[serde(default)]
    pub categories: Value,
    #[serde(default)]
    pub participants: Value,
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawRecord for RawTask {
    const KIND: RecordKind = RecordKind::Task;

    fn undecodable(id: Option<i64>, reason: String) -> Self {
        Self {
            id,
            decode_error: Some(reason),
            ..Self::default()
        }
    }

    fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }
}

/// A recurrence rule joined with its underlying meeting row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecurrence {
    pub recurrence_id: Option<i64>,
    #[serde(default)]
    pub meeting_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// First occurrence date.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    /// Missing means 1.
    #[serde(default)]
    pub interval: Option<i64>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub participants: Value,
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawRecord for RawRecurrence {
    const KIND: RecordKind = RecordKind::Recurrence;
    const ID_FIELD: &'static str = "recurrence_id";

    fn undecodable(id: Option<i64>, reason: String) -> Self {
        Self {
            recurrence_id: id,
            decode_error: Some(reason),
            ..Self::default()
        }
    }

    fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }
}

/// Envelope of the recurrences listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecurrenceList {
    #[serde(default)]
    pub recurring_meetings: Vec<Value>,
}

/// A participant row from the participants listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParticipant {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawRecord for RawParticipant {
    const KIND: RecordKind = RecordKind::Participant;

    fn undecodable(id: Option<i64>, reason: String) -> Self {
        Self {
            id,
            decode_error: Some(reason),
            ..Self::default()
        }
    }

    fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }
}

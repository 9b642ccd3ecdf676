//! Raw record to calendar type conversion.
//!
//! - meetings become [`EventKind::Meeting`] events
//! - tasks become [`EventKind::Task`] events starting at their due date
//! - recurrences become [`RecurrenceRule`]s, expanded later by the engine
//!
//! Every conversion is per record: a bad record yields a
//! [`MalformedEntity`] and the batch helpers carry on with the rest.

use booksmart_core::{
    CalendarEvent, EventKind, Frequency, Participant, Participants, RecurrenceRule, Timestamp,
    parse_date, parse_time,
};
use serde_json::Value;
use tracing::warn;

use crate::error::{MalformedEntity, RecordKind};
use crate::raw::{RawMeeting, RawParticipant, RawRecord, RawRecurrence, RawTask};

/// The outcome of normalizing a list of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    /// Records that converted cleanly, in input order.
    pub items: Vec<T>,
    /// Records that were skipped.
    pub malformed: Vec<MalformedEntity>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            malformed: Vec::new(),
        }
    }
}

fn normalize_all<R, T>(
    records: &[R],
    convert: impl Fn(&R) -> Result<T, MalformedEntity>,
) -> Normalized<T> {
    let mut out = Normalized::default();
    for record in records {
        match convert(record) {
            Ok(item) => out.items.push(item),
            Err(err) => {
                warn!(entity = %err.entity, id = ?err.id, reason = %err.reason, "Skipping malformed record");
                out.malformed.push(err);
            }
        }
    }
    out
}

/// Normalizes a meeting row.
///
/// # Errors
///
/// Fails when the id, title, date or either time is missing or unparsable.
pub fn normalize_meeting(raw: &RawMeeting) -> Result<CalendarEvent, MalformedEntity> {
    let record = Record::check(raw, raw.id)?;

    let id = record.id()?;
    let title = record.text(raw.title.as_deref(), "title")?;
    let date = record.parse(raw.date.as_deref(), "date", parse_date)?;
    let start = record.parse(raw.start_time.as_deref(), "start_time", parse_time)?;
    let end = record.parse(raw.end_time.as_deref(), "end_time", parse_time)?;

    let (start, end) = Timestamp::span(date, start, end);

    let mut event = CalendarEvent::new(format!("meeting-{}", id), title, start, EventKind::Meeting)
        .with_end(end)
        .with_color(raw.color.as_deref())
        .with_participants(parse_participants(&raw.participants))
        .with_source_id(id);

    if let Some(description) = non_blank(raw.description.as_deref()) {
        event = event.with_description(description);
    }
    Ok(event)
}

/// Normalizes a task.
///
/// A date-only due date starts at midnight; a date-time keeps its time.
///
/// # Errors
///
/// Fails when the id, title or due date is missing or unparsable.
pub fn normalize_task(raw: &RawTask) -> Result<CalendarEvent, MalformedEntity> {
    let record = Record::check(raw, raw.id)?;

    let id = record.id()?;
    let title = record.text(raw.title.as_deref(), "title")?;
    let due = record.parse(raw.due_date.as_deref(), "due_date", Timestamp::parse)?;

    let mut event = CalendarEvent::new(format!("task-{}", id), title, due, EventKind::Task)
        .with_color(raw.color.as_deref())
        .with_participants(parse_participants(&raw.participants))
        .with_categories(parse_categories(&raw.categories))
        .with_source_id(id);

    if let Some(description) = non_blank(raw.description.as_deref()) {
        event = event.with_description(description);
    }
    Ok(event)
}

/// Normalizes a recurrence rule.
///
/// The interval is carried as received (a missing interval means 1);
/// non-positive values are rejected at expansion time.
///
/// # Errors
///
/// Fails when the rule id, title, date, times or frequency is missing or
/// unparsable, or when an end date is present but unparsable.
pub fn normalize_recurrence(raw: &RawRecurrence) -> Result<RecurrenceRule, MalformedEntity> {
    let record = Record::check(raw, raw.recurrence_id)?;

    let recurrence_id = record.id()?;
    let title = record.text(raw.title.as_deref(), "title")?;
    let start_date = record.parse(raw.date.as_deref(), "date", parse_date)?;
    let start_time = record.parse(raw.start_time.as_deref(), "start_time", parse_time)?;
    let end_time = record.parse(raw.end_time.as_deref(), "end_time", parse_time)?;
    let frequency = record
        .text(raw.frequency.as_deref(), "frequency")?
        .parse::<Frequency>()
        .map_err(|e| record.fail(e.to_string()))?;

    let mut rule = RecurrenceRule::new(recurrence_id, title, start_date, start_time, end_time, frequency)
        .with_interval(raw.interval.unwrap_or(1))
        .with_participants(parse_participants(&raw.participants));

    if non_blank(raw.end_date.as_deref()).is_some() {
        rule = rule.with_end_date(record.parse(raw.end_date.as_deref(), "end_date", parse_date)?);
    }
    if let Some(description) = non_blank(raw.description.as_deref()) {
        rule = rule.with_description(description);
    }
    if let Some(color) = non_blank(raw.color.as_deref()) {
        rule = rule.with_color(color);
    }
    if let Some(meeting_id) = raw.meeting_id {
        rule = rule.with_meeting_id(meeting_id);
    }
    Ok(rule)
}

/// Normalizes a participant row.
///
/// # Errors
///
/// Fails when the id or email is missing.
pub fn normalize_participant(raw: &RawParticipant) -> Result<Participant, MalformedEntity> {
    let record = Record::check(raw, raw.id)?;

    let id = record.id()?;
    let email = record.text(raw.email.as_deref(), "email")?;
    let name = non_blank(raw.name.as_deref()).unwrap_or(email);
    Ok(Participant::new(id, email, name))
}

/// Normalizes a list of meetings, skipping malformed ones.
pub fn normalize_meetings(raws: &[RawMeeting]) -> Normalized<CalendarEvent> {
    normalize_all(raws, normalize_meeting)
}

/// Normalizes a list of tasks, skipping malformed ones.
pub fn normalize_tasks(raws: &[RawTask]) -> Normalized<CalendarEvent> {
    normalize_all(raws, normalize_task)
}

/// Normalizes a list of recurrence rules, skipping malformed ones.
pub fn normalize_recurrences(raws: &[RawRecurrence]) -> Normalized<RecurrenceRule> {
    normalize_all(raws, normalize_recurrence)
}

/// Normalizes a list of participants, skipping malformed ones.
pub fn normalize_participants(raws: &[RawParticipant]) -> Normalized<Participant> {
    normalize_all(raws, normalize_participant)
}

/// Reads an embedded participant list.
///
/// Anything other than an array means no participants. Elements without
/// an integer id or a non-blank email are skipped, and the first element
/// wins when ids repeat.
pub fn parse_participants(value: &Value) -> Participants {
    let Some(items) = value.as_array() else {
        return Participants::new();
    };

    let mut participants = Participants::new();
    for item in items {
        let id = item.get("id").and_then(Value::as_i64);
        let email = item
            .get("email")
            .and_then(Value::as_str)
            .and_then(|e| non_blank(Some(e)));
        let (Some(id), Some(email)) = (id, email) else {
            continue;
        };
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .and_then(|n| non_blank(Some(n)))
            .unwrap_or(email);
        participants.insert(Participant::new(id, email, name));
    }
    participants
}

/// Reads task category names from a raw `categories` value.
///
/// Anything other than an array means no categories. Elements without a
/// non-blank name are skipped.
pub fn parse_categories(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter_map(|name| non_blank(Some(name)))
        .map(str::to_string)
        .collect()
}

/// Field access for one record, producing errors tagged with its kind and id.
struct Record {
    kind: RecordKind,
    id: Option<i64>,
}

impl Record {
    /// Starts reading a record, failing if it never decoded.
    fn check<R: RawRecord>(raw: &R, id: Option<i64>) -> Result<Self, MalformedEntity> {
        let record = Self { kind: R::KIND, id };
        match raw.decode_error() {
            Some(reason) => Err(record.fail(reason)),
            None => Ok(record),
        }
    }

    fn fail(&self, reason: impl Into<String>) -> MalformedEntity {
        MalformedEntity::new(self.kind, self.id, reason)
    }

    fn id(&self) -> Result<i64, MalformedEntity> {
        self.id.ok_or_else(|| self.fail("missing id"))
    }

    fn text<'a>(&self, value: Option<&'a str>, name: &str) -> Result<&'a str, MalformedEntity> {
        non_blank(value).ok_or_else(|| self.fail(format!("missing {}", name)))
    }

    fn parse<T>(
        &self,
        value: Option<&str>,
        name: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, MalformedEntity> {
        let text = self.text(value, name)?;
        parse(text).ok_or_else(|| self.fail(format!("invalid {} {:?}", name, text)))
    }
}

/// Trimmed, non-blank text.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

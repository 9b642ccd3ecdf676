//! Event types for the calendar.
//!
//! This module provides the unified output shape of the engine:
//! - [`CalendarEvent`]: one displayable event (meeting, task or occurrence)
//! - [`EventKind`]: what the event was derived from
//! - [`Participant`] / [`Participants`]: who can see an event

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Default display color for meetings and meeting occurrences.
pub const DEFAULT_MEETING_COLOR: &str = "#3788d8";

/// Default display color for tasks.
pub const DEFAULT_TASK_COLOR: &str = "#ff9f89";

/// The kind of a calendar event.
///
/// The declaration order is the tie-break precedence used when two events
/// share the same start: meetings first, then tasks, then occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A one-off meeting row from the store.
    Meeting,
    /// A task with a due date.
    Task,
    /// An occurrence generated from a recurrence rule.
    RecurringMeeting,
}

impl EventKind {
    /// Returns the color used when the store did not provide one.
    pub fn default_color(&self) -> &'static str {
        match self {
            Self::Meeting | Self::RecurringMeeting => DEFAULT_MEETING_COLOR,
            Self::Task => DEFAULT_TASK_COLOR,
        }
    }
}

/// Normalizes an email address for comparison (trimmed, lower-cased).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A participant reference attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The store's participant id.
    pub id: i64,
    /// The participant's email address, as stored.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Creates a new participant.
    pub fn new(id: i64, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
        }
    }

    /// Returns true if this participant's email matches, ignoring case.
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }
}

/// A set of participants, unique by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Participant>", into = "Vec<Participant>")]
pub struct Participants(Vec<Participant>);

impl Participants {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant. Returns false if one with the same id is already present.
    pub fn insert(&mut self, participant: Participant) -> bool {
        if self.0.iter().any(|p| p.id == participant.id) {
            return false;
        }
        self.0.push(participant);
        true
    }

    /// Returns true if any participant has the given email (case-insensitive).
    pub fn contains_email(&self, email: &str) -> bool {
        let wanted = normalize_email(email);
        !wanted.is_empty() && self.0.iter().any(|p| normalize_email(&p.email) == wanted)
    }

    /// Returns the number of participants.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no participants.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the participants.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.0.iter()
    }
}

impl From<Vec<Participant>> for Participants {
    fn from(list: Vec<Participant>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Participants> for Vec<Participant> {
    fn from(set: Participants) -> Self {
        set.0
    }
}

impl FromIterator<Participant> for Participants {
    fn from_iter<I: IntoIterator<Item = Participant>>(iter: I) -> Self {
        let mut set = Self::new();
        for participant in iter {
            set.insert(participant);
        }
        set
    }
}

/// A calendar event ready for display.
///
/// This is the canonical representation produced by every stage of the
/// engine, whatever record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Identifier, unique within one aggregation pass.
    pub id: String,
    /// The event title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// When the event starts (the due date for tasks).
    pub start: Timestamp,
    /// When the event ends. Absent for tasks.
    pub end: Option<Timestamp>,
    /// What the event was derived from.
    pub kind: EventKind,
    /// Display color hint.
    pub color: String,
    /// Who takes part in the event.
    pub participants: Participants,
    /// Category names (tasks only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Store id of the record this event was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
}

impl CalendarEvent {
    /// Creates a new event with the kind's default color and no participants.
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: Timestamp, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            start,
            end: None,
            kind,
            color: kind.default_color().to_string(),
            participants: Participants::new(),
            categories: Vec::new(),
            source_id: None,
        }
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the color. `None` keeps the kind's default.
    pub fn with_color(mut self, color: Option<&str>) -> Self {
        if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
            self.color = color.to_string();
        }
        self
    }

    /// Builder method to set participants.
    pub fn with_participants(mut self, participants: Participants) -> Self {
        self.participants = participants;
        self
    }

    /// Builder method to set categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Builder method to set the source record id.
    pub fn with_source_id(mut self, id: i64) -> Self {
        self.source_id = Some(id);
        self
    }

    /// Returns true if the user (by email, case-insensitive) participates.
    pub fn is_visible_to(&self, user_email: &str) -> bool {
        self.participants.contains_email(user_email)
    }

    /// Returns the duration in minutes, if the event has an end.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end
            .map(|end| (end.as_naive() - self.start.as_naive()).num_minutes())
    }
}

/// Total display order for events.
///
/// Ascending by start; ties broken by kind precedence
/// (Meeting < Task < RecurringMeeting), then by id.
pub fn display_order(a: &CalendarEvent, b: &CalendarEvent) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts events in place by [`display_order`].
pub fn sort_for_display(events: &mut [CalendarEvent]) {
    events.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Timestamp::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(h, min, 0).unwrap(),
        )
    }

    mod participants {
        use super::*;

        #[test]
        fn unique_by_id() {
            let mut set = Participants::new();
            assert!(set.insert(Participant::new(1, "a@example.com", "A")));
            assert!(!set.insert(Participant::new(1, "other@example.com", "A again")));
            assert!(set.insert(Participant::new(2, "b@example.com", "B")));
            assert_eq!(set.len(), 2);
            assert!(!set.contains_email("other@example.com"));
        }

        #[test]
        fn email_match_ignores_case_and_whitespace() {
            let set: Participants = vec![Participant::new(1, "Alice@Example.com", "Alice")].into();
            assert!(set.contains_email("alice@example.com"));
            assert!(set.contains_email("  ALICE@EXAMPLE.COM "));
            assert!(!set.contains_email("bob@example.com"));
            assert!(!set.contains_email(""));
        }

        #[test]
        fn deserializing_collapses_duplicates() {
            let json = r#"[
                {"id": 1, "email": "a@example.com", "name": "A"},
                {"id": 1, "email": "a@example.com", "name": "A"}
            ]"#;
            let set: Participants = serde_json::from_str(json).unwrap();
            assert_eq!(set.len(), 1);
        }
    }

    mod calendar_event {
        use super::*;

        #[test]
        fn default_color_by_kind() {
            let meeting = CalendarEvent::new("m", "M", ts(2024, 1, 1, 9, 0), EventKind::Meeting);
            let task = CalendarEvent::new("t", "T", ts(2024, 1, 1, 0, 0), EventKind::Task);
            assert_eq!(meeting.color, DEFAULT_MEETING_COLOR);
            assert_eq!(task.color, DEFAULT_TASK_COLOR);
        }

        #[test]
        fn blank_color_keeps_default() {
            let event = CalendarEvent::new("t", "T", ts(2024, 1, 1, 0, 0), EventKind::Task)
                .with_color(Some("  "));
            assert_eq!(event.color, DEFAULT_TASK_COLOR);

            let event = event.with_color(Some("#00ff00"));
            assert_eq!(event.color, "#00ff00");
        }

        #[test]
        fn duration() {
            let event = CalendarEvent::new("m", "M", ts(2024, 1, 1, 9, 0), EventKind::Meeting)
                .with_end(ts(2024, 1, 1, 10, 30));
            assert_eq!(event.duration_minutes(), Some(90));

            let task = CalendarEvent::new("t", "T", ts(2024, 1, 1, 0, 0), EventKind::Task);
            assert_eq!(task.duration_minutes(), None);
        }

        #[test]
        fn serde_roundtrip() {
            let event = CalendarEvent::new("m-1", "Standup", ts(2024, 1, 1, 9, 0), EventKind::Meeting)
                .with_end(ts(2024, 1, 1, 9, 15))
                .with_participants(vec![Participant::new(1, "a@example.com", "A")].into())
                .with_source_id(1);
            let json = serde_json::to_string(&event).unwrap();
            assert!(json.contains("\"kind\":\"meeting\""));
            let parsed: CalendarEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, parsed);
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn ties_break_by_kind_then_id() {
            let start = ts(2024, 1, 1, 9, 0);
            let mut events = vec![
                CalendarEvent::new("recurrence-1-2024-01-01", "R", start, EventKind::RecurringMeeting),
                CalendarEvent::new("task-2", "T2", start, EventKind::Task),
                CalendarEvent::new("task-1", "T1", start, EventKind::Task),
                CalendarEvent::new("meeting-9", "M", start, EventKind::Meeting),
                CalendarEvent::new("meeting-0", "Early", ts(2024, 1, 1, 8, 0), EventKind::Meeting),
            ];
            sort_for_display(&mut events);
            let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(
                ids,
                vec!["meeting-0", "meeting-9", "task-1", "task-2", "recurrence-1-2024-01-01"]
            );
        }
    }
}

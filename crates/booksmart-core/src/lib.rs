//! Core types: time, events, recurrence expansion, dedup, participant filters

pub mod dedup;
pub mod error;
pub mod event;
pub mod participants;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use dedup::{MeetingSlots, SlotKey, dedupe, slot_key};
pub use error::{DirectoryError, ExpansionError};
pub use event::{
    CalendarEvent, DEFAULT_MEETING_COLOR, DEFAULT_TASK_COLOR, EventKind, Participant, Participants,
    display_order, normalize_email, sort_for_display,
};
pub use participants::{ParticipantDirectory, filter_for_user};
pub use recurrence::{Expander, Expansion, RecurrenceRule, expand, occurrence_id};
pub use time::{Frequency, Horizon, Timestamp, UnknownFrequency, format_date, parse_date, parse_time};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

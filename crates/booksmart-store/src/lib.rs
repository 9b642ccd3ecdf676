//! Store access for the booksmart calendar engine.
//!
//! - [`CalendarStore`] - read access to meetings, tasks, recurrence rules
//!   and participants
//! - [`raw`] - records as the store returns them
//! - [`normalize`] - conversion of raw records into calendar types
//! - [`HttpStore`] - the REST API client
//! - [`StaticStore`] / [`ErrorStore`] - in-memory stores
//!
//! ```text
//!  HttpStore / StaticStore
//!          │ CalendarStore
//!          ▼
//!   RawMeeting, RawTask, RawRecurrence
//!          │ normalize_*()
//!          ▼
//!   CalendarEvent, RecurrenceRule  (+ MalformedEntity per skipped record)
//! ```

pub mod error;
pub mod http;
pub mod normalize;
pub mod raw;
pub mod store;

pub use error::{MalformedEntity, RecordKind, StoreError, StoreErrorCode, StoreResult};
pub use http::{HttpStore, HttpStoreConfig};
pub use normalize::{
    Normalized, normalize_meeting, normalize_meetings, normalize_participant,
    normalize_participants, normalize_recurrence, normalize_recurrences, normalize_task,
    normalize_tasks, parse_categories, parse_participants,
};
pub use raw::{RawMeeting, RawParticipant, RawRecord, RawRecurrence, RawTask, RecurrenceList};
pub use store::{BoxFuture, CalendarStore, ErrorStore, Snapshot, Source, StaticStore};

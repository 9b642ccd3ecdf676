//! Recurrence rules and their expansion into concrete occurrences.
//!
//! A [`RecurrenceRule`] describes a meeting that repeats every `interval`
//! days, weeks, months or years from a start date. The [`Expander`] turns a
//! rule into dated [`CalendarEvent`]s up to a [`Horizon`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExpansionError;
use crate::event::{CalendarEvent, EventKind, Participants};
use crate::time::{Frequency, Horizon, Timestamp, format_date};

/// Builds the stable id of the occurrence of a rule on a given date.
///
/// The same rule and date always produce the same id, across passes.
pub fn occurrence_id(recurrence_id: i64, date: NaiveDate) -> String {
    format!("recurrence-{}-{}", recurrence_id, format_date(date))
}

/// A recurrence rule as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// The store's rule id.
    pub recurrence_id: i64,
    /// The store's underlying meeting row, if known.
    pub meeting_id: Option<i64>,
    /// Title copied onto every occurrence.
    pub title: String,
    /// Description copied onto every occurrence.
    pub description: Option<String>,
    /// Date of the first occurrence.
    pub start_date: NaiveDate,
    /// Start time of each occurrence.
    pub start_time: NaiveTime,
    /// End time of each occurrence.
    pub end_time: NaiveTime,
    /// Step unit.
    pub frequency: Frequency,
    /// Number of units between occurrences.
    ///
    /// Kept as received from the store so that invalid values can be
    /// rejected at expansion time.
    pub interval: i64,
    /// Last day the rule may produce an occurrence on (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Display color override.
    pub color: Option<String>,
    /// Participants copied onto every occurrence.
    pub participants: Participants,
}

impl RecurrenceRule {
    /// Creates a rule with an interval of 1 and no end date.
    pub fn new(
        recurrence_id: i64,
        title: impl Into<String>,
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        frequency: Frequency,
    ) -> Self {
        Self {
            recurrence_id,
            meeting_id: None,
            title: title.into(),
            description: None,
            start_date,
            start_time,
            end_time,
            frequency,
            interval: 1,
            end_date: None,
            color: None,
            participants: Participants::new(),
        }
    }

    /// Builder method to set the interval.
    pub fn with_interval(mut self, interval: i64) -> Self {
        self.interval = interval;
        self
    }

    /// Builder method to set the end date.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set participants.
    pub fn with_participants(mut self, participants: Participants) -> Self {
        self.participants = participants;
        self
    }

    /// Builder method to set the underlying meeting id.
    pub fn with_meeting_id(mut self, meeting_id: i64) -> Self {
        self.meeting_id = Some(meeting_id);
        self
    }

    /// Builder method to set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Builds the occurrence of this rule on `date`.
    ///
    /// An end time earlier than the start time ends on the following day.
    pub fn occurrence_on(&self, date: NaiveDate) -> CalendarEvent {
        let (start, end) = Timestamp::span(date, self.start_time, self.end_time);

        let mut event = CalendarEvent::new(
            occurrence_id(self.recurrence_id, date),
            &self.title,
            start,
            EventKind::RecurringMeeting,
        )
        .with_end(end)
        .with_color(self.color.as_deref())
        .with_participants(self.participants.clone());

        if let Some(ref description) = self.description {
            event = event.with_description(description);
        }
        if let Some(meeting_id) = self.meeting_id {
            event = event.with_source_id(meeting_id);
        }
        event
    }
}

/// The result of expanding one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Occurrences in strictly increasing date order.
    pub occurrences: Vec<CalendarEvent>,
    /// Whether the occurrence cap stopped expansion before the limit.
    pub truncated: bool,
}

/// Expands recurrence rules up to a horizon.
#[derive(Debug, Clone, Copy)]
pub struct Expander {
    horizon: Horizon,
    max_occurrences: usize,
}

impl Expander {
    /// Default cap on occurrences produced by a single rule.
    pub const DEFAULT_MAX_OCCURRENCES: usize = 5000;

    /// Creates an expander bounded by `horizon`.
    pub fn new(horizon: Horizon) -> Self {
        Self {
            horizon,
            max_occurrences: Self::DEFAULT_MAX_OCCURRENCES,
        }
    }

    /// Builder: set the per-rule occurrence cap.
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max;
        self
    }

    /// Expands a rule into its occurrences.
    ///
    /// Occurrence `n` falls on `start_date + n * interval` units, computed
    /// from the start date each time. Expansion stops at the earlier of the
    /// rule's end date and the horizon, at the occurrence cap, or when the
    /// date arithmetic leaves the representable range.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::NonAdvancingRule`] if the interval is zero
    /// or negative, or if a computed date fails to move past the previous one.
    pub fn expand(&self, rule: &RecurrenceRule) -> Result<Expansion, ExpansionError> {
        if rule.interval < 1 {
            return Err(ExpansionError::non_advancing(rule.recurrence_id, rule.interval));
        }
        let step = u32::try_from(rule.interval).unwrap_or(u32::MAX);
        let limit = self.horizon.limit_for(rule.end_date);

        let mut occurrences = Vec::new();
        let mut truncated = false;
        let mut previous: Option<NaiveDate> = None;
        let mut n: u32 = 0;

        loop {
            let Some(cursor) = n
                .checked_mul(step)
                .and_then(|offset| rule.frequency.advance(rule.start_date, offset))
            else {
                break;
            };
            if cursor > limit {
                break;
            }
            if previous.is_some_and(|prev| cursor <= prev) {
                return Err(ExpansionError::non_advancing(rule.recurrence_id, rule.interval));
            }
            if occurrences.len() >= self.max_occurrences {
                warn!(
                    recurrence_id = rule.recurrence_id,
                    max = self.max_occurrences,
                    "Occurrence cap reached, truncating expansion"
                );
                truncated = true;
                break;
            }

            occurrences.push(rule.occurrence_on(cursor));
            previous = Some(cursor);

            match n.checked_add(1) {
                Some(next) => n = next,
                None => break,
            }
        }

        debug!(
            recurrence_id = rule.recurrence_id,
            frequency = %rule.frequency,
            interval = rule.interval,
            limit = %format_date(limit),
            count = occurrences.len(),
            "Expanded recurrence rule"
        );

        Ok(Expansion {
            occurrences,
            truncated,
        })
    }
}

/// Expands a rule up to `horizon` with the default occurrence cap.
///
/// # Errors
///
/// See [`Expander::expand`].
pub fn expand(rule: &RecurrenceRule, horizon: Horizon) -> Result<Vec<CalendarEvent>, ExpansionError> {
    Expander::new(horizon)
        .expand(rule)
        .map(|expansion| expansion.occurrences)
}

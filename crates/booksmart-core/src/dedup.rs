//! Suppression of recurrence occurrences that a real meeting already covers.
//!
//! A real meeting row sharing the date and start time of an occurrence is
//! taken to be an override of that single instance (rescheduled, or
//! cancelled and replaced), so the synthetic occurrence is dropped and the
//! stored meeting is shown instead. Titles are not compared.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

use crate::event::{CalendarEvent, EventKind};

/// The slot an event occupies for deduplication purposes.
pub type SlotKey = (NaiveDate, NaiveTime);

/// Returns the `(date, start time)` slot of an event.
pub fn slot_key(event: &CalendarEvent) -> SlotKey {
    (event.start.date(), event.start.time())
}

/// The set of slots taken by real meetings.
#[derive(Debug, Clone, Default)]
pub struct MeetingSlots {
    taken: HashSet<SlotKey>,
}

impl MeetingSlots {
    /// Collects the slots of every [`EventKind::Meeting`] in `events`.
    ///
    /// Other kinds are ignored.
    pub fn from_meetings<'a>(events: impl IntoIterator<Item = &'a CalendarEvent>) -> Self {
        let taken = events
            .into_iter()
            .filter(|e| e.kind == EventKind::Meeting)
            .map(slot_key)
            .collect();
        Self { taken }
    }

    /// Returns true if a real meeting occupies the event's slot.
    pub fn covers(&self, event: &CalendarEvent) -> bool {
        self.taken.contains(&slot_key(event))
    }

    /// Returns the number of distinct slots.
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Returns true if no slot is taken.
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// Drops the occurrences whose slot is taken by one of `real_meetings`.
///
/// Pure: the relative order of the remaining occurrences is preserved.
pub fn dedupe(occurrences: Vec<CalendarEvent>, real_meetings: &[CalendarEvent]) -> Vec<CalendarEvent> {
    let slots = MeetingSlots::from_meetings(real_meetings);
    if slots.is_empty() {
        return occurrences;
    }
    occurrences
        .into_iter()
        .filter(|occurrence| !slots.covers(occurrence))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{RecurrenceRule, expand};
    use crate::time::{Frequency, Horizon, Timestamp};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).unwrap()
    }

    fn meeting(id: &str, d: NaiveDate, t: NaiveTime, title: &str) -> CalendarEvent {
        CalendarEvent::new(id, title, Timestamp::new(d, t), EventKind::Meeting)
    }

    fn month_end_occurrences() -> Vec<CalendarEvent> {
        let rule = RecurrenceRule::new(
            7,
            "Month-end review",
            date(2024, 1, 31),
            time(9, 0),
            time(10, 0),
            Frequency::Monthly,
        );
        expand(&rule, Horizon::new(date(2024, 4, 30))).unwrap()
    }

    #[test]
    fn suppresses_exactly_the_matching_occurrence() {
        let real = vec![meeting("meeting-1", date(2024, 2, 29), time(9, 0), "Moved review")];
        let kept = dedupe(month_end_occurrences(), &real);
        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "recurrence-7-2024-01-31",
                "recurrence-7-2024-03-31",
                "recurrence-7-2024-04-30",
            ]
        );
    }

    #[test]
    fn different_start_time_does_not_match() {
        let real = vec![meeting("meeting-1", date(2024, 2, 29), time(9, 30), "Other")];
        assert_eq!(dedupe(month_end_occurrences(), &real).len(), 4);
    }

    #[test]
    fn title_is_ignored() {
        let real = vec![meeting("meeting-1", date(2024, 3, 31), time(9, 0), "Unrelated")];
        assert_eq!(dedupe(month_end_occurrences(), &real).len(), 3);
    }

    #[test]
    fn tasks_never_suppress() {
        let task = CalendarEvent::new(
            "task-1",
            "Due",
            Timestamp::new(date(2024, 2, 29), time(9, 0)),
            EventKind::Task,
        );
        assert_eq!(dedupe(month_end_occurrences(), &[task]).len(), 4);
    }

    #[test]
    fn deterministic() {
        let real = vec![meeting("meeting-1", date(2024, 1, 31), time(9, 0), "Kickoff")];
        let first = dedupe(month_end_occurrences(), &real);
        let second = dedupe(month_end_occurrences(), &real);
        assert_eq!(first, second);
    }

    #[test]
    fn slots_collapse_duplicates() {
        let real = vec![
            meeting("meeting-1", date(2024, 1, 31), time(9, 0), "A"),
            meeting("meeting-2", date(2024, 1, 31), time(9, 0), "B"),
        ];
        assert_eq!(MeetingSlots::from_meetings(&real).len(), 1);
    }
}

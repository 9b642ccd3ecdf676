//! Time types for calendar events.
//!
//! This module provides [`Timestamp`], the single wall-clock value every event
//! start/end is expressed in, [`Frequency`] with its calendar-aware stepping,
//! and [`Horizon`] for bounding how far ahead recurrences are materialized.
//!
//! All values live in one fixed calendar system: there is no timezone
//! conversion anywhere in the engine.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date format used on the wire and in occurrence ids.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A point in time on the calendar (date plus wall-clock time).
///
/// Timestamps are immutable and totally ordered. They serialize as
/// `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Creates a timestamp from a date and a time of day.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    /// Creates a timestamp at midnight of the given date.
    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN))
    }

    /// Creates a timestamp from a naive datetime.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self(dt)
    }

    /// Returns the date portion.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Returns the time-of-day portion.
    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// Returns the underlying naive datetime.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns the start and end of an event held on `date`.
    ///
    /// An end time earlier than the start time ends on the following day.
    pub fn span(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> (Self, Self) {
        let end_date = if end < start {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        (Self::new(date, start), Self::new(end_date, end))
    }

    /// Parses `YYYY-MM-DDTHH:MM[:SS]` (a space is accepted instead of `T`)
    /// or a bare `YYYY-MM-DD`, which maps to midnight.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(date) = parse_date(input) {
            return Some(Self::at_midnight(date));
        }
        let (date, time) = input.split_once(['T', ' '])?;
        Some(Self::new(parse_date(date)?, parse_time(time)?))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Parses a time of day as `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

/// Formats a date the way occurrence ids and the store expect it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// How often a recurrence repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the wire name of this frequency.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Returns the date `steps` units of this frequency after `anchor`.
    ///
    /// Stepping is always computed from the anchor, never chained from a
    /// previous result. Month and year steps land on the last valid day of
    /// the target month when the anchor's day does not exist there, so a
    /// Jan 31 anchor yields Feb 29 (or 28), Mar 31, Apr 30, ...
    ///
    /// Returns `None` if the result falls outside the representable range.
    pub fn advance(self, anchor: NaiveDate, steps: u32) -> Option<NaiveDate> {
        match self {
            Self::Daily => anchor.checked_add_days(Days::new(u64::from(steps))),
            Self::Weekly => anchor.checked_add_days(Days::new(u64::from(steps) * 7)),
            Self::Monthly => anchor.checked_add_months(Months::new(steps)),
            Self::Yearly => steps
                .checked_mul(12)
                .and_then(|months| anchor.checked_add_months(Months::new(months))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a frequency name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recurrence frequency: {0}")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

/// The forward boundary for materializing recurrences.
///
/// A horizon is an inclusive last calendar day: an occurrence on that day is
/// still produced, one on the day after is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horizon {
    last_day: NaiveDate,
}

impl Horizon {
    /// Default look-ahead in calendar months.
    pub const DEFAULT_MONTHS: u32 = 2;

    /// Creates a horizon ending on the given day (inclusive).
    pub fn new(last_day: NaiveDate) -> Self {
        Self { last_day }
    }

    /// Creates a horizon `months` calendar months after `today`.
    pub fn from_today(today: NaiveDate, months: u32) -> Self {
        let last_day = today
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);
        Self { last_day }
    }

    /// Creates the default horizon relative to the local clock.
    pub fn from_now(months: u32) -> Self {
        Self::from_today(Local::now().date_naive(), months)
    }

    /// Returns the last day covered by this horizon.
    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Returns true if `date` is on or before the horizon.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date <= self.last_day
    }

    /// Returns the effective expansion limit for a rule with an optional end date.
    ///
    /// This is the earlier of the rule's end date and the horizon.
    pub fn limit_for(&self, end_date: Option<NaiveDate>) -> NaiveDate {
        end_date.map_or(self.last_day, |end| end.min(self.last_day))
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::from_now(Self::DEFAULT_MONTHS)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_date(self.last_day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).unwrap()
    }

    mod timestamp {
        use super::*;

        #[test]
        fn parts() {
            let ts = Timestamp::new(date(2024, 2, 29), time(9, 30));
            assert_eq!(ts.date(), date(2024, 2, 29));
            assert_eq!(ts.time(), time(9, 30));
            assert_eq!(ts.to_string(), "2024-02-29T09:30:00");
        }

        #[test]
        fn span_same_day() {
            let (start, end) = Timestamp::span(date(2024, 4, 2), time(9, 0), time(10, 0));
            assert_eq!(start, Timestamp::new(date(2024, 4, 2), time(9, 0)));
            assert_eq!(end, Timestamp::new(date(2024, 4, 2), time(10, 0)));

            let (start, end) = Timestamp::span(date(2024, 4, 2), time(9, 0), time(9, 0));
            assert_eq!(start, end);
        }

        #[test]
        fn span_overnight_ends_next_day() {
            let (start, end) = Timestamp::span(date(2024, 2, 28), time(22, 0), time(1, 0));
            assert_eq!(start, Timestamp::new(date(2024, 2, 28), time(22, 0)));
            assert_eq!(end, Timestamp::new(date(2024, 2, 29), time(1, 0)));
            assert!(end > start);
        }

        #[test]
        fn parse_variants() {
            let expected = Timestamp::new(date(2024, 3, 1), time(14, 5));
            assert_eq!(Timestamp::parse("2024-03-01T14:05"), Some(expected));
            assert_eq!(Timestamp::parse("2024-03-01T14:05:00"), Some(expected));
            assert_eq!(Timestamp::parse("2024-03-01 14:05:00"), Some(expected));
            assert_eq!(
                Timestamp::parse("2024-03-01"),
                Some(Timestamp::at_midnight(date(2024, 3, 1)))
            );
        }

        #[test]
        fn parse_rejects_garbage() {
            assert_eq!(Timestamp::parse(""), None);
            assert_eq!(Timestamp::parse("tomorrow"), None);
            assert_eq!(Timestamp::parse("2024-02-30"), None);
            assert_eq!(Timestamp::parse("2024-03-01T25:00"), None);
        }

        #[test]
        fn ordering() {
            let a = Timestamp::new(date(2024, 1, 1), time(9, 0));
            let b = Timestamp::new(date(2024, 1, 1), time(10, 0));
            let c = Timestamp::at_midnight(date(2024, 1, 2));
            assert!(a < b);
            assert!(b < c);
        }

        #[test]
        fn serde_roundtrip() {
            let ts = Timestamp::new(date(2024, 1, 31), time(9, 0));
            let json = serde_json::to_string(&ts).unwrap();
            assert_eq!(json, "\"2024-01-31T09:00:00\"");
            let parsed: Timestamp = serde_json::from_str(&json).unwrap();
            assert_eq!(ts, parsed);
        }
    }

    mod time_of_day {
        use super::*;

        #[test]
        fn accepts_short_and_long_forms() {
            assert_eq!(parse_time("09:00"), Some(time(9, 0)));
            assert_eq!(parse_time("09:00:00"), Some(time(9, 0)));
            assert_eq!(parse_time(" 23:59 "), Some(time(23, 59)));
        }

        #[test]
        fn rejects_invalid() {
            assert_eq!(parse_time("9am"), None);
            assert_eq!(parse_time("24:00"), None);
        }
    }

    mod frequency {
        use super::*;

        #[test]
        fn daily_and_weekly() {
            let anchor = date(2024, 2, 27);
            assert_eq!(Frequency::Daily.advance(anchor, 3), Some(date(2024, 3, 1)));
            assert_eq!(Frequency::Weekly.advance(anchor, 2), Some(date(2024, 3, 12)));
            assert_eq!(Frequency::Daily.advance(anchor, 0), Some(anchor));
        }

        #[test]
        fn monthly_clamps_to_month_end_without_drift() {
            let anchor = date(2024, 1, 31);
            assert_eq!(Frequency::Monthly.advance(anchor, 1), Some(date(2024, 2, 29)));
            assert_eq!(Frequency::Monthly.advance(anchor, 2), Some(date(2024, 3, 31)));
            assert_eq!(Frequency::Monthly.advance(anchor, 3), Some(date(2024, 4, 30)));
            assert_eq!(Frequency::Monthly.advance(anchor, 13), Some(date(2025, 2, 28)));
        }

        #[test]
        fn yearly_from_leap_day() {
            let anchor = date(2024, 2, 29);
            assert_eq!(Frequency::Yearly.advance(anchor, 1), Some(date(2025, 2, 28)));
            assert_eq!(Frequency::Yearly.advance(anchor, 4), Some(date(2028, 2, 29)));
        }

        #[test]
        fn overflow_is_none() {
            assert_eq!(Frequency::Yearly.advance(date(2024, 1, 1), u32::MAX), None);
            assert_eq!(Frequency::Daily.advance(NaiveDate::MAX, 1), None);
        }

        #[test]
        fn parse_names() {
            assert_eq!("weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
            assert_eq!("MONTHLY".parse::<Frequency>(), Ok(Frequency::Monthly));
            assert!("fortnightly".parse::<Frequency>().is_err());
        }

        #[test]
        fn serde_names() {
            let json = serde_json::to_string(&Frequency::Yearly).unwrap();
            assert_eq!(json, "\"yearly\"");
        }
    }

    mod horizon {
        use super::*;

        #[test]
        fn from_today_uses_calendar_months() {
            let horizon = Horizon::from_today(date(2024, 12, 31), 2);
            assert_eq!(horizon.last_day(), date(2025, 2, 28));
        }

        #[test]
        fn covers_is_inclusive() {
            let horizon = Horizon::new(date(2024, 4, 30));
            assert!(horizon.covers(date(2024, 4, 30)));
            assert!(!horizon.covers(date(2024, 5, 1)));
        }

        #[test]
        fn limit_takes_earlier_bound() {
            let horizon = Horizon::new(date(2024, 4, 30));
            assert_eq!(horizon.limit_for(None), date(2024, 4, 30));
            assert_eq!(horizon.limit_for(Some(date(2024, 3, 15))), date(2024, 3, 15));
            assert_eq!(horizon.limit_for(Some(date(2030, 1, 1))), date(2024, 4, 30));
        }
    }
}

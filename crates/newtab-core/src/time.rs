//! Time helpers for the "today" calendar view.
//!
//! This module provides [`TimeWindow`] for defining query ranges and a few
//! helpers to resolve local wall-clock values (midnights, ICS datetimes)
//! into UTC instants for an arbitrary [`TimeZone`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Resolves a local wall-clock datetime in `tz` to a UTC instant.
///
/// Ambiguous times (DST fold) resolve to the earliest instant. Times that
/// do not exist locally (DST gap) are read with the offset in force before
/// the gap, which moves them forward by the gap length; a midnight that is
/// skipped resolves to the first valid instant of the day.
pub fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::hours(24)))
                .fix();
            (naive - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
        }
    }
}

/// Returns local midnight of `date` in `tz` as a UTC instant.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(NaiveTime::MIN), tz)
}

/// Returns the local calendar date of `now` in `tz`.
pub fn local_date<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// If `end` is before `start`, the window is empty and starts at `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end }
        }
    }

    /// Creates the window covering the whole local day containing `now`:
    /// `[todayMidnight, tomorrowMidnight)`.
    pub fn today<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        Self::for_date(local_date(now, tz), tz)
    }

    /// Creates a time window for a single day in the given timezone.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        Self::new(local_midnight(date, tz), local_midnight(next_day(date), tz))
    }

    /// Creates a time window for "today" starting from now until end of day.
    pub fn today_remaining<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        let tomorrow = next_day(local_date(now, tz));
        Self::new(now, local_midnight(tomorrow, tz))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the window contains no instant.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

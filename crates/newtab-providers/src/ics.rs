//! ICS feed parsing.
//!
//! Public calendar feeds hold the whole calendar, so parsing only has to
//! pull a start time and a title out of each `VEVENT`. Lines are matched
//! with regular expressions instead of a full RFC 5545 parser; folded lines,
//! escapes and recurrence rules are not interpreted.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use tracing::debug;

use newtab_core::{CalendarEvent, effective_title, local_midnight, resolve_local};

static DTSTART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DTSTART[;:]([^\r\n]+)").expect("Invalid DTSTART regex"));

static SUMMARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SUMMARY:([^\r\n]+)").expect("Invalid SUMMARY regex"));

/// Splits ICS text into event blocks.
///
/// Everything before the first `BEGIN:VEVENT` (calendar header, timezone
/// definitions) is dropped.
pub fn split_event_blocks(ics: &str) -> impl Iterator<Item = &str> {
    ics.split("BEGIN:VEVENT").skip(1)
}

/// Parses a single event block into a [`CalendarEvent`].
///
/// Returns `None` when the block has no `DTSTART` or the start value cannot
/// be read. Date-times are interpreted as local wall-clock time in `tz`,
/// including values with a trailing `Z`.
pub fn parse_event_block<Tz: TimeZone>(block: &str, tz: &Tz) -> Option<CalendarEvent> {
    let Some(dtstart) = DTSTART_REGEX.captures(block).and_then(|c| c.get(1)) else {
        debug!("skipping VEVENT without DTSTART");
        return None;
    };

    // Parameters such as `VALUE=DATE:` or `TZID=Europe/Paris:` end at the
    // last colon.
    let token = dtstart.as_str().rsplit(':').next().unwrap_or_default().trim();

    let Some((start, is_all_day)) = parse_ics_start(token, tz) else {
        debug!(token = %token, "skipping VEVENT with unreadable DTSTART");
        return None;
    };

    let summary = SUMMARY_REGEX
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    let title = effective_title(summary);

    Some(if is_all_day {
        CalendarEvent::all_day(start, title)
    } else {
        CalendarEvent::new(start, title)
    })
}

/// Parses a `DTSTART` value.
///
/// - `YYYYMMDDTHHMMSS[Z]` gives a timed event at that local wall-clock time.
///   The `Z` is dropped, not honoured.
/// - `YYYYMMDD` gives an all-day event at local midnight.
///
/// Returns the UTC instant and whether the event is all-day.
pub fn parse_ics_start<Tz: TimeZone>(token: &str, tz: &Tz) -> Option<(DateTime<Utc>, bool)> {
    let token = token.trim();

    if token.contains('T') {
        let clean = token.replacen('Z', "", 1);
        let date = parse_date(&clean)?;
        let hour = digits(&clean, 9..11)?;
        let minute = digits(&clean, 11..13)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some((resolve_local(date.and_time(time), tz), false))
    } else {
        let date = parse_date(token)?;
        Some((local_midnight(date, tz), true))
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let year = digits(s, 0..4)?;
    let month = digits(s, 4..6)?;
    let day = digits(s, 6..8)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn digits(s: &str, range: Range<usize>) -> Option<u32> {
    let field = s.get(range)?;
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

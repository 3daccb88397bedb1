//! Conversion from source payloads to [`CalendarEvent`].
//!
//! Both source kinds end up in the same shape: a UTC start instant, a
//! non-empty title and an all-day flag. Bare dates become local midnight.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::warn;

use newtab_core::{CalendarEvent, TimeWindow, effective_title, local_midnight};

use crate::ics::parse_event_block;
use crate::raw_event::{ApiEvent, RawEvent};

/// Normalizes an API event.
///
/// Returns `None` for cancelled events and for events whose start is
/// missing or unparseable.
pub fn normalize_api_event<Tz: TimeZone>(event: &ApiEvent, tz: &Tz) -> Option<CalendarEvent> {
    if event.is_cancelled() {
        return None;
    }

    let id = event.id.as_deref().unwrap_or("<no id>");
    let title = effective_title(event.summary.as_deref());

    match (&event.start.date_time, &event.start.date) {
        (Some(date_time), _) => {
            let start = DateTime::parse_from_rfc3339(date_time)
                .map_err(|e| warn!(event = %id, error = %e, "failed to parse start time"))
                .ok()?;
            Some(CalendarEvent::new(start.with_timezone(&Utc), title))
        }
        (None, Some(date)) => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| warn!(event = %id, error = %e, "failed to parse start date"))
                .ok()?;
            Some(CalendarEvent::all_day(local_midnight(date, tz), title))
        }
        (None, None) => {
            warn!(event = %id, "event has no start time");
            None
        }
    }
}

/// Normalizes a single raw event.
///
/// ICS blocks are kept only if they start within `today`, because feeds
/// carry the whole calendar. API events are already bounded by the query.
pub fn normalize_event<Tz: TimeZone>(
    raw: &RawEvent,
    today: &TimeWindow,
    tz: &Tz,
) -> Option<CalendarEvent> {
    match raw {
        RawEvent::Api(event) => normalize_api_event(event, tz),
        RawEvent::IcsBlock(block) => {
            parse_event_block(block, tz).filter(|event| today.contains(event.start))
        }
    }
}

/// Normalizes a batch of raw events, dropping the ones that do not qualify.
pub fn normalize_events<Tz: TimeZone>(
    raw: &[RawEvent],
    today: &TimeWindow,
    tz: &Tz,
) -> Vec<CalendarEvent> {
    raw.iter()
        .filter_map(|event| normalize_event(event, today, tz))
        .collect()
}

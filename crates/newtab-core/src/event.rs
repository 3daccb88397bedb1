//! Normalized calendar event.
//!
//! [`CalendarEvent`] is the common shape every calendar source is converted
//! into before events from different sources are merged.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a source provides no summary, or an empty one.
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// Returns the display title for an optional summary.
///
/// Absent, empty and whitespace-only summaries fall back to [`UNTITLED_EVENT`].
pub fn effective_title(summary: Option<&str>) -> String {
    summary
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNTITLED_EVENT)
        .to_string()
}

/// A calendar event in provider-agnostic form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// When the event starts. All-day events start at local midnight.
    pub start: DateTime<Utc>,
    /// The event title.
    pub title: String,
    /// Whether the event only carries a date, no time of day.
    pub is_all_day: bool,
}

impl CalendarEvent {
    /// Creates a timed event.
    pub fn new(start: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start,
            title: title.into(),
            is_all_day: false,
        }
    }

    /// Creates an all-day event starting at the given (local midnight) instant.
    pub fn all_day(start: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start,
            title: title.into(),
            is_all_day: true,
        }
    }

    /// Returns the start time in the given timezone.
    pub fn start_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.start.with_timezone(tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_title() {
        assert_eq!(effective_title(None), "Untitled Event");
        assert_eq!(effective_title(Some("")), "Untitled Event");
        assert_eq!(effective_title(Some("   ")), "Untitled Event");
        assert_eq!(effective_title(Some(" Standup ")), "Standup");
    }

    #[test]
    fn constructors_set_all_day_flag() {
        let start = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        assert!(!CalendarEvent::new(start, "Lunch").is_all_day);
        assert!(CalendarEvent::all_day(start, "Holiday").is_all_day);
    }

    #[test]
    fn start_in_timezone() {
        let start = Utc.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap();
        let event = CalendarEvent::new(start, "Call");
        let offset = chrono::FixedOffset::east_opt(13 * 3600).unwrap();
        assert_eq!(
            event.start_in(&offset).format("%Y-%m-%d %H:%M").to_string(),
            "2024-03-15 14:00"
        );
    }
}

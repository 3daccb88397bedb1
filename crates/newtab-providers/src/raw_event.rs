//! Raw event data as returned by calendar sources.
//!
//! A [`RawEvent`] lives for a single aggregation pass: adapters produce it,
//! the normalizer turns it into a [`newtab_core::CalendarEvent`] and it is
//! dropped.

use serde::Deserialize;

/// A source-specific event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A JSON event object from the API-key calendar source.
    Api(ApiEvent),
    /// The text of one `VEVENT` block from an ICS feed, without the
    /// leading `BEGIN:VEVENT`.
    IcsBlock(String),
}

impl RawEvent {
    /// Returns a short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api(_) => "api",
            Self::IcsBlock(_) => "ics",
        }
    }
}

impl From<ApiEvent> for RawEvent {
    fn from(event: ApiEvent) -> Self {
        Self::Api(event)
    }
}

/// Response from the `events` list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    /// The events. A missing array is treated as empty.
    #[serde(default)]
    pub items: Vec<ApiEvent>,
}

/// A single event from the calendar API.
///
/// Only the fields the agenda needs are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// Event identifier.
    pub id: Option<String>,
    /// Event title.
    pub summary: Option<String>,
    /// `confirmed`, `tentative` or `cancelled`.
    pub status: Option<String>,
    /// Start time.
    #[serde(default)]
    pub start: ApiEventTime,
    /// End time.
    #[serde(default)]
    pub end: Option<ApiEventTime>,
}

impl ApiEvent {
    /// Returns true if the event was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// Event time from the API: either a full timestamp or a bare date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    /// `YYYY-MM-DD` for all-day events.
    pub date: Option<String>,
    /// RFC 3339 timestamp for timed events.
    pub date_time: Option<String>,
    /// IANA timezone of the event, informational.
    pub time_zone: Option<String>,
}

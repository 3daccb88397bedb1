//! Agenda presentation for the calendar widget.
//!
//! The aggregator hands over either an ordered list of events or one of
//! three sentinel states. This module turns that into an [`Agenda`] of
//! `{time, title}` lines and renders it:
//! - **Text**: one line per event, or the sentinel message
//! - **JSON**: machine-readable output with the sentinel state spelled out
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use newtab_core::format::{Agenda, AgendaFormatter};
//! use newtab_core::CalendarEvent;
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
//! let agenda = Agenda::from_events(&[CalendarEvent::new(start, "Standup")], &Utc);
//! let text = AgendaFormatter::with_defaults().format_text(&agenda);
//! assert_eq!(text, "09:00  Standup");
//! ```

use std::borrow::Cow;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;

/// The output format for agenda display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Time format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// 24-hour format (e.g., "14:30").
    #[default]
    H24,
    /// 12-hour format with AM/PM (e.g., "2:30 PM").
    H12,
}

impl TimeFormat {
    fn pattern(&self) -> &'static str {
        match self {
            Self::H24 => "%H:%M",
            Self::H12 => "%-I:%M %p",
        }
    }
}

/// What the presenter should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgendaState {
    /// No usable calendar source is configured.
    NotConfigured,
    /// Sources were queried and none has an event today.
    NoEvents,
    /// Every configured source failed.
    FetchError,
    /// At least one event to show.
    Events,
}

/// One rendered agenda entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaLine {
    /// Local start time, blank for all-day events.
    pub time: String,
    /// Event title.
    pub title: String,
}

/// The presenter-facing result of one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    /// Sentinel or [`AgendaState::Events`].
    pub state: AgendaState,
    /// Lines in display order. Empty unless `state` is `Events`.
    pub lines: Vec<AgendaLine>,
}

impl Agenda {
    /// The "not configured" sentinel.
    pub fn not_configured() -> Self {
        Self::sentinel(AgendaState::NotConfigured)
    }

    /// The "no events today" sentinel.
    pub fn no_events() -> Self {
        Self::sentinel(AgendaState::NoEvents)
    }

    /// The "fetch failed" sentinel.
    pub fn fetch_error() -> Self {
        Self::sentinel(AgendaState::FetchError)
    }

    fn sentinel(state: AgendaState) -> Self {
        Self {
            state,
            lines: Vec::new(),
        }
    }

    /// Builds an agenda from ordered events using 24-hour times.
    ///
    /// An empty slice yields [`Agenda::no_events`].
    pub fn from_events<Tz: TimeZone>(events: &[CalendarEvent], tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self::from_events_with(events, tz, TimeFormat::H24)
    }

    /// Builds an agenda from ordered events with the given time format.
    pub fn from_events_with<Tz: TimeZone>(
        events: &[CalendarEvent],
        tz: &Tz,
        time_format: TimeFormat,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        if events.is_empty() {
            return Self::no_events();
        }

        let lines = events
            .iter()
            .map(|event| AgendaLine {
                time: format_start_time(event, tz, time_format),
                title: event.title.clone(),
            })
            .collect();

        Self {
            state: AgendaState::Events,
            lines,
        }
    }
}

/// Formats an event's local start time, or an empty string for all-day events.
pub fn format_start_time<Tz: TimeZone>(
    event: &CalendarEvent,
    tz: &Tz,
    time_format: TimeFormat,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if event.is_all_day {
        return String::new();
    }
    event
        .start_in(tz)
        .format(time_format.pattern())
        .to_string()
}

/// Messages shown for the sentinel states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaMessages {
    /// Shown when no calendar source is configured.
    pub not_configured: String,
    /// Shown when there are no events today.
    pub no_events: String,
    /// Shown when every source failed.
    pub fetch_error: String,
}

impl Default for AgendaMessages {
    fn default() -> Self {
        Self {
            not_configured: "Configure calendar in config.toml".to_string(),
            no_events: "No events today".to_string(),
            fetch_error: "Failed to load calendar".to_string(),
        }
    }
}

/// Configuration options for agenda rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Maximum length for titles (truncated with ellipsis).
    pub max_title_length: Option<usize>,
    /// Sentinel messages.
    pub messages: AgendaMessages,
}

/// JSON output format for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAgenda {
    /// The agenda state.
    pub state: AgendaState,
    /// Human-readable message for sentinel states.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Agenda lines.
    pub events: Vec<AgendaLine>,
    /// Number of events returned.
    pub count: usize,
}

/// Renders agendas.
#[derive(Debug, Clone)]
pub struct AgendaFormatter {
    options: FormatOptions,
}

impl AgendaFormatter {
    /// Creates a new formatter with the given options.
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Creates a new formatter with default options.
    pub fn with_defaults() -> Self {
        Self::new(FormatOptions::default())
    }

    /// Returns the message for a sentinel state, `None` for `Events`.
    pub fn message_for(&self, state: AgendaState) -> Option<&str> {
        let messages = &self.options.messages;
        match state {
            AgendaState::NotConfigured => Some(&messages.not_configured),
            AgendaState::NoEvents => Some(&messages.no_events),
            AgendaState::FetchError => Some(&messages.fetch_error),
            AgendaState::Events => None,
        }
    }

    /// Formats the agenda as plain text, one event per line.
    ///
    /// The time column is padded so all-day events line up with timed ones.
    pub fn format_text(&self, agenda: &Agenda) -> String {
        if let Some(message) = self.message_for(agenda.state) {
            return message.to_string();
        }

        let width = agenda
            .lines
            .iter()
            .map(|l| l.time.chars().count())
            .max()
            .unwrap_or(0);

        agenda
            .lines
            .iter()
            .map(|line| {
                format!(
                    "{:<width$}  {}",
                    line.time,
                    self.title(&line.title),
                    width = width
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the agenda for JSON output.
    pub fn format_json(&self, agenda: &Agenda) -> JsonAgenda {
        let events: Vec<AgendaLine> = agenda
            .lines
            .iter()
            .map(|line| AgendaLine {
                time: line.time.clone(),
                title: self.title(&line.title).into_owned(),
            })
            .collect();

        JsonAgenda {
            state: agenda.state,
            message: self.message_for(agenda.state).map(str::to_string),
            count: events.len(),
            events,
        }
    }

    fn title<'a>(&self, title: &'a str) -> Cow<'a, str> {
        match self.options.max_title_length {
            Some(max) => ellipsis(title, max),
            None => Cow::Borrowed(title),
        }
    }
}

/// Truncates a string with ellipsis if it exceeds the given length.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}

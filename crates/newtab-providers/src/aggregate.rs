//! Multi-source aggregation for the "today" agenda.
//!
//! One pass:
//!
//! ```text
//!   plan_sources ──▶ [source, source, ...] ── fan out (timeout each) ──┐
//!                                                                     │ join
//!   AggregationOutcome ◀── truncate ◀── stable sort ◀── normalize ◀───┘
//! ```
//!
//! A failing source contributes no events; only when every source fails does
//! the pass report [`AggregationOutcome::FetchError`].

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use newtab_core::{Agenda, CalendarEvent, TimeFormat, TimeWindow};

use crate::error::ProviderErrorCode;
use crate::http::HttpClient;
use crate::normalize::normalize_events;
use crate::source::{CalendarSource, CalendarSourceConfig};

/// Picks the sources for a pass.
///
/// API-key sources win when `api_key` is non-empty and at least one calendar
/// id is set; otherwise the public URLs are used. Blank ids and URLs are
/// ignored. An empty result means nothing is configured.
pub fn plan_sources(
    api_key: Option<&str>,
    calendar_ids: &[String],
    public_urls: &[String],
) -> Vec<CalendarSourceConfig> {
    let api_key = api_key.map(str::trim).filter(|key| !key.is_empty());
    let ids: Vec<&str> = non_blank(calendar_ids).collect();

    match api_key {
        Some(key) if !ids.is_empty() => ids
            .into_iter()
            .map(|id| CalendarSourceConfig::api_key(key, id))
            .collect(),
        _ => non_blank(public_urls)
            .map(CalendarSourceConfig::public_url)
            .collect(),
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Aggregation settings.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum number of events in the result.
    pub max_results: usize,
    /// Upper bound for a single source fetch.
    pub source_timeout: Duration,
}

impl AggregatorConfig {
    /// Default result limit.
    pub const DEFAULT_MAX_RESULTS: usize = 10;

    /// Default per-source timeout in seconds.
    pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;

    /// Sets the result limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sets the per-source timeout.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Caps the per-source timeout so a pass never outlives the refresh interval.
    pub fn bounded_by(mut self, refresh_interval: Duration) -> Self {
        self.source_timeout = self.source_timeout.min(refresh_interval);
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_results: Self::DEFAULT_MAX_RESULTS,
            source_timeout: Duration::from_secs(Self::DEFAULT_SOURCE_TIMEOUT_SECS),
        }
    }
}

/// How a single source fared during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Fetched; `events` is the number that survived normalization.
    Ok { events: usize },
    /// The fetch failed.
    Failed {
        code: ProviderErrorCode,
        message: String,
    },
    /// The fetch did not finish within the per-source timeout.
    TimedOut,
}

impl SourceStatus {
    /// Returns true if the source contributed (possibly zero) events.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Per-source entry of an [`Aggregation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// The source name.
    pub source: String,
    /// What happened.
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// What the presenter should show after a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationOutcome {
    /// No usable source is configured.
    NotConfigured,
    /// Sources answered but nothing happens today.
    NoEvents,
    /// Every configured source failed.
    FetchError,
    /// Events ascending by start, at most `max_results`.
    Events(Vec<CalendarEvent>),
}

impl AggregationOutcome {
    /// Returns the events, empty for sentinel outcomes.
    pub fn events(&self) -> &[CalendarEvent] {
        match self {
            Self::Events(events) => events,
            _ => &[],
        }
    }

    /// Converts the outcome into presenter lines in `tz`.
    pub fn to_agenda<Tz: TimeZone>(&self, tz: &Tz, time_format: TimeFormat) -> Agenda
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Self::NotConfigured => Agenda::not_configured(),
            Self::NoEvents => Agenda::no_events(),
            Self::FetchError => Agenda::fetch_error(),
            Self::Events(events) => Agenda::from_events_with(events, tz, time_format),
        }
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// What to show.
    pub outcome: AggregationOutcome,
    /// One entry per source, in configuration order.
    pub reports: Vec<SourceReport>,
}

/// Runs all sources for a pass and merges their events.
pub struct Aggregator {
    sources: Vec<Box<dyn CalendarSource>>,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Creates an aggregator over already-built sources.
    pub fn new(sources: Vec<Box<dyn CalendarSource>>, config: AggregatorConfig) -> Self {
        Self { sources, config }
    }

    /// Builds the sources described by `plan`.
    pub fn from_plan(
        plan: &[CalendarSourceConfig],
        http: &HttpClient,
        config: AggregatorConfig,
    ) -> Self {
        let sources = plan
            .iter()
            .map(|source| source.build(http, config.max_results))
            .collect();
        Self::new(sources, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Returns the source names in configuration order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Runs a pass for the current local day.
    pub async fn aggregate(&self) -> Aggregation {
        self.aggregate_at(Utc::now(), &Local).await
    }

    /// Runs a pass as if it were `now` in `tz`.
    pub async fn aggregate_at<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Aggregation {
        if self.sources.is_empty() {
            info!("no calendar source configured");
            return Aggregation {
                outcome: AggregationOutcome::NotConfigured,
                reports: Vec::new(),
            };
        }

        let query_window = TimeWindow::today_remaining(now, tz);
        let today = TimeWindow::today(now, tz);
        let timeout = self.config.source_timeout;

        debug!(
            sources = self.sources.len(),
            start = %query_window.start,
            end = %query_window.end,
            "starting aggregation"
        );

        let fetches = self.sources.iter().map(|source| async move {
            let result = tokio::time::timeout(timeout, source.fetch_today(query_window)).await;
            (source.name(), result)
        });
        let results = join_all(fetches).await;

        let mut merged: Vec<CalendarEvent> = Vec::new();
        let mut reports = Vec::with_capacity(results.len());

        for (name, result) in results {
            let status = match result {
                Ok(Ok(raw)) => {
                    let events = normalize_events(&raw, &today, tz);
                    debug!(source = %name, raw = raw.len(), events = events.len(), "source done");
                    let count = events.len();
                    merged.extend(events);
                    SourceStatus::Ok { events: count }
                }
                Ok(Err(e)) => {
                    warn!(source = %name, error = %e, "source failed");
                    SourceStatus::Failed {
                        code: e.code(),
                        message: e.message().to_string(),
                    }
                }
                Err(_) => {
                    warn!(source = %name, timeout_secs = timeout.as_secs(), "source timed out");
                    SourceStatus::TimedOut
                }
            };
            reports.push(SourceReport {
                source: name.to_string(),
                status,
            });
        }

        // Stable: equal start times keep source order
        merged.sort_by_key(|event| event.start);
        merged.truncate(self.config.max_results);

        let failed = reports.iter().filter(|r| !r.status.is_ok()).count();
        let outcome = if failed == reports.len() {
            AggregationOutcome::FetchError
        } else if merged.is_empty() {
            AggregationOutcome::NoEvents
        } else {
            AggregationOutcome::Events(merged)
        };

        info!(
            sources = reports.len(),
            failed,
            events = outcome.events().len(),
            "aggregation finished"
        );

        Aggregation { outcome, reports }
    }
}

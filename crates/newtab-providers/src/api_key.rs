//! Calendar API source authenticated with an API key.
//!
//! One GET per calendar against `{base}/calendars/{id}/events`, with the
//! query bounded to the remaining part of today and recurring events
//! expanded server-side.

use chrono::SecondsFormat;
use tracing::debug;

use newtab_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;
use crate::raw_event::{EventListResponse, RawEvent};
use crate::source::{BoxFuture, CalendarSource};

/// Reads one calendar through the JSON API.
#[derive(Debug, Clone)]
pub struct ApiKeySource {
    http: HttpClient,
    name: String,
    api_key: String,
    calendar_id: String,
    max_results: usize,
}

impl ApiKeySource {
    /// Creates a new API-key source.
    pub fn new(
        http: HttpClient,
        api_key: impl Into<String>,
        calendar_id: impl Into<String>,
        max_results: usize,
    ) -> Self {
        let calendar_id = calendar_id.into();
        Self {
            http,
            name: format!("api:{}", calendar_id),
            api_key: api_key.into(),
            calendar_id,
            max_results,
        }
    }

    /// Returns the events endpoint for this calendar.
    pub fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.http.config().api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Returns the query parameters for the given window.
    pub fn query(&self, window: &TimeWindow) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.api_key.clone()),
            (
                "timeMin",
                window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "timeMax",
                window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("maxResults", self.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]
    }

    async fn list_events(&self, window: TimeWindow) -> ProviderResult<Vec<RawEvent>> {
        let url = self.events_url();
        debug!(
            calendar = %self.calendar_id,
            start = %window.start,
            end = %window.end,
            "listing events"
        );

        let body = self.http.get_text(&url, &self.query(&window)).await?;
        let events = parse_event_list(&body)?;

        debug!(calendar = %self.calendar_id, count = events.len(), "fetched events");
        Ok(events)
    }
}

/// Parses an `events` list body into raw events.
pub fn parse_event_list(body: &str) -> ProviderResult<Vec<RawEvent>> {
    let response: EventListResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
            .with_source(e)
    })?;
    Ok(response.items.into_iter().map(RawEvent::Api).collect())
}

impl CalendarSource for ApiKeySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_today(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.list_events(window)
                .await
                .map_err(|e| e.with_provider(&self.name))
        })
    }
}

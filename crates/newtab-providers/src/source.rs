//! The [`CalendarSource`] trait and source configuration.
//!
//! A source fetches raw events for one calendar. It reports failures as
//! [`ProviderError`]; the aggregator decides what a failure means for the
//! agenda.

use std::future::Future;
use std::pin::Pin;

use newtab_core::TimeWindow;

use crate::api_key::ApiKeySource;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;
use crate::public_url::PublicUrlSource;
use crate::raw_event::RawEvent;

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so sources of different kinds can sit
/// in one `Vec<Box<dyn CalendarSource>>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One configured calendar source.
///
/// A configuration list may mix both kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSourceConfig {
    /// A calendar read through the JSON API with an API key.
    ApiKey {
        /// The API key, passed through as a query parameter.
        api_key: String,
        /// The calendar identifier, e.g. `team@example.com`.
        calendar_id: String,
    },
    /// A public ICS feed.
    PublicUrl {
        /// The feed URL.
        url: String,
    },
}

impl CalendarSourceConfig {
    /// Creates an API-key source configuration.
    pub fn api_key(api_key: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self::ApiKey {
            api_key: api_key.into(),
            calendar_id: calendar_id.into(),
        }
    }

    /// Creates a public URL source configuration.
    pub fn public_url(url: impl Into<String>) -> Self {
        Self::PublicUrl { url: url.into() }
    }

    /// Returns the name used in logs and reports. Never contains the API key.
    pub fn name(&self) -> String {
        match self {
            Self::ApiKey { calendar_id, .. } => format!("api:{}", calendar_id),
            Self::PublicUrl { url } => format!("ics:{}", url),
        }
    }

    /// Builds the source.
    ///
    /// A source that cannot be built (e.g. an unparseable feed URL) becomes
    /// an [`ErrorSource`], so it shows up as failed in the report instead of
    /// aborting the whole pass.
    pub fn build(&self, http: &HttpClient, max_results: usize) -> Box<dyn CalendarSource> {
        let built: ProviderResult<Box<dyn CalendarSource>> = match self {
            Self::ApiKey {
                api_key,
                calendar_id,
            } => Ok(Box::new(ApiKeySource::new(
                http.clone(),
                api_key.clone(),
                calendar_id.clone(),
                max_results,
            ))),
            Self::PublicUrl { url } => PublicUrlSource::new(http.clone(), url)
                .map(|source| Box::new(source) as Box<dyn CalendarSource>),
        };

        built.unwrap_or_else(|error| Box::new(ErrorSource::new(self.name(), error)))
    }
}

/// A calendar backend.
///
/// # Example Implementation
///
/// ```ignore
/// struct FeedSource {
///     http: HttpClient,
///     url: String,
/// }
///
/// impl CalendarSource for FeedSource {
///     fn name(&self) -> &str { &self.url }
///
///     fn fetch_today(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
///         Box::pin(async move {
///             let body = self.http.get_text(&self.url, &[]).await?;
///             Ok(split_event_blocks(&body).map(|b| RawEvent::IcsBlock(b.to_string())).collect())
///         })
///     }
/// }
/// ```
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source for logs and reports.
    fn name(&self) -> &str;

    /// Fetches the raw events for the given query window.
    ///
    /// The window runs from now to the next local midnight. Sources that
    /// cannot filter server-side may return more; the normalizer trims them
    /// to today.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failures, non-2xx responses and
    /// unparseable bodies.
    fn fetch_today(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>>;
}

/// A source that always returns an error.
///
/// Stands in for a source that failed to initialize.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    /// Creates a new error source.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl CalendarSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_today(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        // ProviderError is not Clone because of the boxed source
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::http::HttpConfig;
    use chrono::Utc;

    fn window() -> TimeWindow {
        let now = Utc::now();
        TimeWindow::new(now, now + chrono::Duration::hours(1))
    }

    #[test]
    fn names_hide_api_key() {
        let config = CalendarSourceConfig::api_key("secret-key", "team@example.com");
        assert_eq!(config.name(), "api:team@example.com");
        assert!(!config.name().contains("secret"));

        let config = CalendarSourceConfig::public_url("https://example.com/basic.ics");
        assert_eq!(config.name(), "ics:https://example.com/basic.ics");
    }

    #[test]
    fn build_picks_adapter() {
        let http = HttpClient::new(HttpConfig::default()).unwrap();

        let api = CalendarSourceConfig::api_key("key", "primary").build(&http, 10);
        assert_eq!(api.name(), "api:primary");

        let ics = CalendarSourceConfig::public_url("https://example.com/basic.ics").build(&http, 10);
        assert_eq!(ics.name(), "ics:https://example.com/basic.ics");
    }

    #[tokio::test]
    async fn invalid_url_becomes_error_source() {
        let http = HttpClient::new(HttpConfig::default()).unwrap();
        let source = CalendarSourceConfig::public_url("not a url").build(&http, 10);

        assert_eq!(source.name(), "ics:not a url");
        let err = source.fetch_today(window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("ics:not a url"));
    }

    #[tokio::test]
    async fn error_source_returns_error() {
        let source = ErrorSource::new("broken", ProviderError::network("unreachable"));
        assert_eq!(source.name(), "broken");

        let err = source.fetch_today(window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.message(), "unreachable");
    }
}

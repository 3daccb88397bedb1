//! Shared HTTP plumbing for calendar sources.
//!
//! All adapters go through one [`HttpClient`] built from [`HttpConfig`], so
//! they share the connection pool, the request timeout and the user agent.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// HTTP settings shared by every source.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Prefix prepended to the percent-encoded feed URL of public sources,
    /// e.g. `https://corsproxy.io/?`.
    pub cors_relay: Option<String>,

    /// Base URL of the calendar API used by API-key sources.
    pub api_base_url: String,
}

impl HttpConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    /// Calendar API v3 base URL.
    pub const DEFAULT_API_BASE_URL: &'static str = "https://www.googleapis.com/calendar/v3";

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Routes public feed requests through a relay.
    pub fn with_cors_relay(mut self, relay: impl Into<String>) -> Self {
        self.cors_relay = Some(relay.into());
        self
    }

    /// Sets the calendar API base URL.
    pub fn with_api_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = base.into();
        self
    }

    /// Checks that the configured URLs parse.
    pub fn validate(&self) -> ProviderResult<()> {
        Url::parse(&self.api_base_url).map_err(|e| {
            ProviderError::configuration(format!(
                "invalid api_base_url {:?}: {}",
                self.api_base_url, e
            ))
        })?;
        if let Some(ref relay) = self.cors_relay {
            Url::parse(relay).map_err(|e| {
                ProviderError::configuration(format!("invalid cors_relay {:?}: {}", relay, e))
            })?;
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("newtab/{}", env!("CARGO_PKG_VERSION")),
            cors_relay: None,
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Thin wrapper over [`reqwest::Client`] that maps failures to [`ProviderError`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: HttpConfig) -> ProviderResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Performs a GET request and returns the body of a 2xx response.
    ///
    /// `query` pairs are percent-encoded and appended to `url`.
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> ProviderResult<String> {
        trace!(url = %url, "sending GET");

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        debug!(url = %url, status = %status, "received response");

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(ProviderError::http_status(status.as_u16(), reason));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.user_agent.starts_with("newtab/"));
        assert!(config.cors_relay.is_none());
        assert_eq!(config.api_base_url, "https://www.googleapis.com/calendar/v3");
    }

    #[test]
    fn config_builder_methods() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent")
            .with_cors_relay("https://corsproxy.io/?")
            .with_api_base_url("http://localhost:8080/v3");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.cors_relay.as_deref(), Some("https://corsproxy.io/?"));
        assert_eq!(config.api_base_url, "http://localhost:8080/v3");
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let bad_base = HttpConfig::default().with_api_base_url("not a url");
        assert!(bad_base.validate().is_err());

        let bad_relay = HttpConfig::default().with_cors_relay("corsproxy");
        assert!(HttpClient::new(bad_relay).is_err());
    }

    #[test]
    fn client_creation() {
        let client = HttpClient::new(HttpConfig::default()).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(15));
    }

    mod over_the_wire {
        use super::*;
        use crate::error::ProviderErrorCode;
        use crate::test_support::CannedServer;

        #[tokio::test]
        async fn success_returns_body_and_sends_query() {
            let server = CannedServer::start("200 OK", "text/plain", "hello").await;
            let client = HttpClient::new(HttpConfig::default()).unwrap();

            let body = client
                .get_text(
                    &format!("{}/feed", server.base_url),
                    &[("q", "a b".to_string())],
                )
                .await
                .unwrap();

            assert_eq!(body, "hello");
            assert_eq!(server.request_line().await, "GET /feed?q=a+b HTTP/1.1");
        }

        #[tokio::test]
        async fn non_success_status_is_an_error() {
            let server = CannedServer::start("403 Forbidden", "text/plain", "denied").await;
            let client = HttpClient::new(HttpConfig::default()).unwrap();

            let err = client
                .get_text(&format!("{}/feed", server.base_url), &[])
                .await
                .unwrap_err();

            assert_eq!(err.code(), ProviderErrorCode::HttpStatus);
            assert_eq!(err.message(), "HTTP 403: Forbidden");
            assert_eq!(server.request_line().await, "GET /feed HTTP/1.1");
        }

        #[tokio::test]
        async fn refused_connection_is_a_network_error() {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let client = HttpClient::new(HttpConfig::default()).unwrap();
            let err = client
                .get_text(&format!("http://{}/feed", addr), &[])
                .await
                .unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        }
    }
}

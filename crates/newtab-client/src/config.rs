//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/newtab/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [calendar]
//! api_key = "AIza..."
//! calendar_ids = ["primary"]
//! public_urls = ["https://calendar.example.com/basic.ics"]
//! max_results = 10
//!
//! [refresh]
//! calendar_secs = 600
//!
//! [http]
//! cors_relay = "https://corsproxy.io/?"
//!
//! [[radio]]
//! name = "Radio One"
//! url = "https://stream.example.com/one"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use newtab_core::{AgendaMessages, FormatOptions, RadioStation, TimeFormat};
use newtab_providers::{AggregatorConfig, CalendarSourceConfig, HttpConfig, plan_sources};

use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the newtab client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Calendar sources.
    pub calendar: CalendarSettings,

    /// Refresh intervals.
    pub refresh: RefreshSettings,

    /// HTTP settings.
    pub http: HttpSettings,

    /// Display settings.
    pub display: DisplaySettings,

    /// Radio stations, in display order.
    pub radio: Vec<RadioStation>,
}

/// Calendar source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// API key for the calendar API.
    pub api_key: Option<String>,

    /// Calendars read with `api_key`.
    pub calendar_ids: Vec<String>,

    /// Public ICS feeds, used when no API key source is configured.
    pub public_urls: Vec<String>,

    /// Maximum number of events shown.
    pub max_results: usize,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            calendar_ids: Vec::new(),
            public_urls: Vec::new(),
            max_results: AggregatorConfig::DEFAULT_MAX_RESULTS,
        }
    }
}

impl CalendarSettings {
    /// Returns the sources to query. Empty when nothing usable is configured.
    pub fn plan(&self) -> Vec<CalendarSourceConfig> {
        plan_sources(
            self.api_key.as_deref(),
            &self.calendar_ids,
            &self.public_urls,
        )
    }
}

/// Refresh intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Seconds between calendar refreshes.
    pub calendar_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self { calendar_secs: 600 }
    }
}

impl RefreshSettings {
    /// Returns the calendar refresh interval.
    pub fn calendar_interval(&self) -> Duration {
        Duration::from_secs(self.calendar_secs)
    }
}

/// HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Upper bound for one source fetch in seconds.
    pub source_timeout_secs: u64,

    /// User agent override.
    pub user_agent: Option<String>,

    /// Relay prefix for public feeds, e.g. `https://corsproxy.io/?`.
    pub cors_relay: Option<String>,

    /// Calendar API base URL override.
    pub api_base_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: HttpConfig::DEFAULT_TIMEOUT_SECS,
            source_timeout_secs: AggregatorConfig::DEFAULT_SOURCE_TIMEOUT_SECS,
            user_agent: None,
            cors_relay: None,
            api_base_url: None,
        }
    }
}

/// Display settings for agenda rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// 24-hour or 12-hour times.
    pub time_format: TimeFormat,

    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,

    /// Texts shown for the sentinel states.
    pub messages: AgendaMessages,
}

impl DisplaySettings {
    /// Returns the formatter options.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            max_title_length: self.max_title_length,
            messages: self.messages.clone(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newtab")
    }

    /// Returns the HTTP configuration for the sources.
    pub fn http_config(&self) -> HttpConfig {
        let mut config =
            HttpConfig::default().with_timeout(Duration::from_secs(self.http.timeout_secs));

        if let Some(ref user_agent) = self.http.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(ref relay) = self.http.cors_relay {
            config = config.with_cors_relay(relay);
        }
        if let Some(ref base) = self.http.api_base_url {
            config = config.with_api_base_url(base);
        }

        config
    }

    /// Returns the aggregation settings, with the per-source timeout capped
    /// at the refresh interval.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig::default()
            .with_max_results(self.calendar.max_results)
            .with_source_timeout(Duration::from_secs(self.http.source_timeout_secs))
            .bounded_by(self.refresh.calendar_interval())
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> ClientResult<()> {
        if self.calendar.max_results == 0 {
            return Err(ClientError::Config(
                "calendar.max_results must be at least 1".into(),
            ));
        }
        if self.refresh.calendar_secs == 0 {
            return Err(ClientError::Config(
                "refresh.calendar_secs must be at least 1".into(),
            ));
        }
        if self.http.timeout_secs == 0 || self.http.source_timeout_secs == 0 {
            return Err(ClientError::Config(
                "http timeouts must be at least 1 second".into(),
            ));
        }

        self.http_config().validate()?;

        for url in self.calendar.public_urls.iter().filter(|u| !u.trim().is_empty()) {
            url::Url::parse(url.trim()).map_err(|e| {
                ClientError::Config(format!("invalid public URL {:?}: {}", url, e))
            })?;
        }

        for (index, station) in self.radio.iter().enumerate() {
            if station.name.trim().is_empty() || station.url.trim().is_empty() {
                return Err(ClientError::Config(format!(
                    "radio station #{} needs both a name and a url",
                    index + 1
                )));
            }
        }

        Ok(())
    }
}

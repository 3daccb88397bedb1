//! Logging setup for the `newtab` binary.
//!
//! Logs always go to stderr so agenda output on stdout stays machine-readable.
//! `RUST_LOG` overrides the preset level.
//!
//! ```ignore
//! use newtab_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::watch())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, fmt::format::FmtSpan, prelude::*};

/// Prefix shared by every workspace target (`newtab`, `newtab_core`, ...).
const FILTER_TARGET: &str = "newtab";

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for workspace targets when `RUST_LOG` is unset
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Print file and line of each event
    pub include_location: bool,
    /// Ignored by the pretty format, which always prints time
    pub include_timestamp: bool,
    /// Log span open/close, used to time refresh cycles
    pub include_span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_timestamp: true,
            include_span_events: false,
        }
    }
}

impl TracingConfig {
    /// `--debug`: everything from the workspace, with source locations.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
            include_span_events: false,
        }
    }

    /// Long-running `watch` loop: timestamped single lines.
    #[must_use]
    pub fn watch() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_timestamp: true,
            include_span_events: true,
        }
    }

    /// The filter used when `RUST_LOG` is unset, e.g. `newtab=INFO`.
    pub fn default_directive(&self) -> String {
        format!("{}={}", FILTER_TARGET, self.default_level)
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let location = self.include_location;
        match self.output_format {
            TracingOutputFormat::Pretty => fmt::layer()
                .pretty()
                .with_file(location)
                .with_line_number(location)
                .with_span_events(self.span_events())
                .with_writer(std::io::stderr)
                .boxed(),
            TracingOutputFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_file(location)
                    .with_line_number(location)
                    .with_span_events(self.span_events())
                    .with_writer(std::io::stderr);
                if self.include_timestamp {
                    layer.boxed()
                } else {
                    layer.without_time().boxed()
                }
            }
            TracingOutputFormat::Json => fmt::layer()
                .json()
                .with_file(location)
                .with_line_number(location)
                .with_span_events(self.span_events())
                .with_writer(std::io::stderr)
                .boxed(),
        }
    }
}

/// Installs the global subscriber. Call once, before any command runs.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let subscriber = tracing_subscriber::registry()
        .with(config.layer())
        .with(env_filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = TracingConfig::default();
        assert_eq!(default.default_level, Level::INFO);
        assert_eq!(default.output_format, TracingOutputFormat::Pretty);
        assert!(!default.include_span_events);

        let debug = TracingConfig::cli_debug();
        assert_eq!(debug.default_level, Level::DEBUG);
        assert!(debug.include_location);
        assert!(!debug.include_timestamp);

        let watch = TracingConfig::watch();
        assert_eq!(watch.output_format, TracingOutputFormat::Compact);
        assert!(watch.include_span_events);
    }

    #[test]
    fn default_directive() {
        assert_eq!(TracingConfig::default().default_directive(), "newtab=INFO");
        assert_eq!(
            TracingConfig::watch()
                .with_level(Level::WARN)
                .default_directive(),
            "newtab=WARN"
        );
    }

    #[test]
    fn quiet_cli_preset() {
        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert_eq!(config.span_events(), FmtSpan::NONE);
    }
}

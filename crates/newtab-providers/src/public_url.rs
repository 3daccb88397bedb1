//! Public ICS feed source.
//!
//! The feed is fetched whole, optionally through a relay, and split into
//! `VEVENT` blocks. Filtering to today happens during normalization.

use tracing::debug;
use url::Url;

use newtab_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;
use crate::ics::split_event_blocks;
use crate::raw_event::RawEvent;
use crate::source::{BoxFuture, CalendarSource};

/// Reads a public ICS feed.
#[derive(Debug, Clone)]
pub struct PublicUrlSource {
    http: HttpClient,
    name: String,
    url: Url,
}

impl PublicUrlSource {
    /// Creates a new public URL source.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `url` is not an absolute URL.
    pub fn new(http: HttpClient, url: &str) -> ProviderResult<Self> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            ProviderError::configuration(format!("invalid feed URL {:?}: {}", url, e))
                .with_source(e)
        })?;

        Ok(Self {
            http,
            name: format!("ics:{}", url),
            url: parsed,
        })
    }

    /// Returns the URL actually requested: the feed URL, or the relay prefix
    /// followed by the percent-encoded feed URL.
    pub fn request_url(&self) -> String {
        match self.http.config().cors_relay {
            Some(ref relay) => format!("{}{}", relay, urlencoding::encode(self.url.as_str())),
            None => self.url.to_string(),
        }
    }

    async fn fetch_feed(&self) -> ProviderResult<Vec<RawEvent>> {
        let request_url = self.request_url();
        debug!(feed = %self.url, url = %request_url, "fetching feed");

        let body = self.http.get_text(&request_url, &[]).await?;
        let blocks: Vec<RawEvent> = split_event_blocks(&body)
            .map(|block| RawEvent::IcsBlock(block.to_string()))
            .collect();

        debug!(feed = %self.url, blocks = blocks.len(), "fetched feed");
        Ok(blocks)
    }
}

impl CalendarSource for PublicUrlSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_today(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.fetch_feed()
                .await
                .map_err(|e| e.with_provider(&self.name))
        })
    }
}

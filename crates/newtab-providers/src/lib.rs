//! Calendar sources and aggregation.
//!
//! This crate fetches today's events from every configured calendar and
//! merges them into one ordered agenda:
//!
//! - [`CalendarSource`] - The trait every calendar backend implements
//! - [`ApiKeySource`] / [`PublicUrlSource`] - JSON API and ICS feed adapters
//! - [`RawEvent`] - Source payload before normalization
//! - [`normalize_event`] - Conversion to [`newtab_core::CalendarEvent`]
//! - [`Aggregator`] - Concurrent fan-out, merge, sort, truncate
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Calendar API   │    │  Public ICS URL │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  ApiKeySource   │    │ PublicUrlSource │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          │    CalendarSource    │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!              ┌─────────────┐
//!              │  RawEvent   │
//!              └──────┬──────┘
//!                     │
//!                     ▼ normalize_event()
//!              ┌──────────────────┐
//!              │  CalendarEvent   │
//!              └──────┬───────────┘
//!                     │
//!                     ▼ Aggregator
//!              ┌──────────────────────┐
//!              │  AggregationOutcome  │
//!              └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use newtab_providers::{Aggregator, AggregatorConfig, HttpClient, HttpConfig, plan_sources};
//!
//! let plan = plan_sources(None, &[], &["https://example.com/basic.ics".into()]);
//! let http = HttpClient::new(HttpConfig::default())?;
//! let aggregator = Aggregator::from_plan(&plan, &http, AggregatorConfig::default());
//! let aggregation = aggregator.aggregate().await;
//! ```

pub mod aggregate;
pub mod api_key;
pub mod error;
pub mod http;
pub mod ics;
pub mod normalize;
pub mod public_url;
pub mod raw_event;
pub mod source;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use aggregate::{
    Aggregation, AggregationOutcome, Aggregator, AggregatorConfig, SourceReport, SourceStatus,
    plan_sources,
};
pub use api_key::ApiKeySource;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use http::{HttpClient, HttpConfig};
pub use ics::{parse_event_block, parse_ics_start, split_event_blocks};
pub use normalize::{normalize_api_event, normalize_event, normalize_events};
pub use public_url::PublicUrlSource;
pub use raw_event::{ApiEvent, ApiEventTime, RawEvent};
pub use source::{BoxFuture, CalendarSource, CalendarSourceConfig, ErrorSource};

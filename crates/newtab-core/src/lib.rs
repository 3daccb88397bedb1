//! Core types: time windows, events, agenda formatting, radio state

pub mod event;
pub mod format;
pub mod radio;
pub mod time;
pub mod tracing;

pub use event::{CalendarEvent, UNTITLED_EVENT, effective_title};
pub use format::{
    Agenda, AgendaFormatter, AgendaLine, AgendaMessages, AgendaState, FormatOptions, JsonAgenda,
    OutputFormat, TimeFormat, ellipsis,
};
pub use radio::{RadioController, RadioError, RadioState, RadioStation, format_elapsed};
pub use time::{TimeWindow, local_date, local_midnight, resolve_local};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

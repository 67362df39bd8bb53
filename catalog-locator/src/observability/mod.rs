//! Observability utilities.

mod logging;
mod wide_events;

pub use logging::{init_tracing, LogFormat, DEFAULT_FILTER};
pub use wide_events::{LoggingWideEventSink, SearchEventEmitter, SearchSummary, WideEventSink};

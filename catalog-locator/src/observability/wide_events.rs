//! Wide event emitted once per search.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Everything worth knowing about one finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    /// Search id.
    pub search_id: Uuid,
    /// Target label as given.
    pub query: String,
    /// `found`, `not_found`, or `error`.
    pub status: &'static str,
    /// When the search started.
    pub started_at: DateTime<Utc>,
    /// Wall time of the whole search.
    pub duration_ms: f64,
    /// Listing fetches issued, retries included.
    pub pages_fetched: usize,
    /// Pages whose fetch failed and were treated as missing.
    pub uncertain_pages: Vec<u32>,
    /// Page of the matched entry.
    pub page_number: Option<u32>,
    /// How the entry matched (`exact` or `contains`).
    pub match_kind: Option<String>,
    /// Why the search found nothing.
    pub not_found_reason: Option<String>,
    /// Number of extracted records.
    pub records: Option<usize>,
    /// Which extractor produced the records.
    pub extraction_method: Option<String>,
    /// Error view, for failed searches.
    pub error: Option<HashMap<String, serde_json::Value>>,
}

impl SearchSummary {
    /// A summary with only the fields known at the start of a search.
    #[must_use]
    pub fn new(search_id: Uuid, query: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            search_id,
            query: query.into(),
            status: "error",
            started_at,
            duration_ms: 0.0,
            pages_fetched: 0,
            uncertain_pages: Vec::new(),
            page_number: None,
            match_kind: None,
            not_found_reason: None,
            records: None,
            extraction_method: None,
            error: None,
        }
    }
}

/// Receives wide events.
pub trait WideEventSink: Send + Sync {
    /// Handles one event.
    fn emit(&self, event_type: &str, payload: &serde_json::Value);
}

/// Sink that writes wide events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingWideEventSink;

impl WideEventSink for LoggingWideEventSink {
    fn emit(&self, event_type: &str, payload: &serde_json::Value) {
        tracing::info!(event_type, payload = %payload, "Wide event");
    }
}

/// Emitter for the per-search wide event.
#[derive(Clone)]
pub struct SearchEventEmitter {
    /// Event type of search events.
    pub event_type: String,
    sink: Arc<dyn WideEventSink>,
}

impl Default for SearchEventEmitter {
    fn default() -> Self {
        Self {
            event_type: "search.wide".to_string(),
            sink: Arc::new(LoggingWideEventSink),
        }
    }
}

impl std::fmt::Debug for SearchEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEventEmitter")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

impl SearchEventEmitter {
    /// Creates an emitter that logs through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends events to `sink` instead.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn WideEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the event payload.
    #[must_use]
    pub fn build_payload(summary: &SearchSummary) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "search_id": summary.search_id.to_string(),
            "query": summary.query,
            "status": summary.status,
            "started_at": summary.started_at.to_rfc3339(),
            "duration_ms": summary.duration_ms,
            "pages_fetched": summary.pages_fetched,
            "uncertain": !summary.uncertain_pages.is_empty(),
            "uncertain_pages": summary.uncertain_pages,
        });

        if let serde_json::Value::Object(ref mut map) = payload {
            let optional = [
                ("page_number", summary.page_number.map(|p| serde_json::json!(p))),
                ("match_kind", summary.match_kind.as_ref().map(|m| serde_json::json!(m))),
                (
                    "not_found_reason",
                    summary.not_found_reason.as_ref().map(|r| serde_json::json!(r)),
                ),
                ("records", summary.records.map(|n| serde_json::json!(n))),
                (
                    "extraction_method",
                    summary.extraction_method.as_ref().map(|m| serde_json::json!(m)),
                ),
                ("error", summary.error.as_ref().map(|e| serde_json::json!(e))),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    map.insert(key.to_string(), value);
                }
            }
        }

        payload
    }

    /// Emits the wide event for a finished search.
    pub fn emit(&self, summary: &SearchSummary) {
        let payload = Self::build_payload(summary);
        self.sink.emit(&self.event_type, &payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(String, serde_json::Value)>>);

    impl WideEventSink for Capture {
        fn emit(&self, event_type: &str, payload: &serde_json::Value) {
            self.0.lock().push((event_type.to_string(), payload.clone()));
        }
    }

    fn summary() -> SearchSummary {
        let mut summary = SearchSummary::new(Uuid::new_v4(), "notepad.exe", Utc::now());
        summary.status = "found";
        summary.pages_fetched = 5;
        summary.page_number = Some(12);
        summary.match_kind = Some("exact".to_string());
        summary.records = Some(2);
        summary
    }

    #[test]
    fn test_build_payload() {
        let payload = SearchEventEmitter::build_payload(&summary());
        assert_eq!(payload["query"], "notepad.exe");
        assert_eq!(payload["status"], "found");
        assert_eq!(payload["page_number"], 12);
        assert_eq!(payload["records"], 2);
        assert_eq!(payload["uncertain"], false);
        assert!(payload.get("not_found_reason").is_none());
        assert!(payload.get("error").is_none());
    }

    #[test]
    fn test_emit_to_sink() {
        let capture = Arc::new(Capture::default());
        let emitter = SearchEventEmitter::new().with_sink(capture.clone());
        emitter.emit(&summary());

        let events = capture.0.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "search.wide");
        assert_eq!(events[0].1["pages_fetched"], 5);
    }
}

//! Search outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::catalog::Entry;
use crate::extractor::Record;
use crate::locator::{MatchKind, NotFoundReason};

/// Which extractor produced a report's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Header-mapped detail table.
    Table,
    /// Regex fallback over the page text.
    TextPattern,
    /// Neither produced a record.
    None,
}

impl ExtractionMethod {
    /// Stable snake-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::TextPattern => "text_pattern",
            Self::None => "none",
        }
    }
}

/// A located entry and the records extracted from its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Search id.
    pub search_id: Uuid,
    /// When the search started.
    pub started_at: DateTime<Utc>,
    /// Target label as given.
    pub query: String,
    /// Page the entry is listed on.
    pub page_number: u32,
    /// The matched entry.
    pub entry: Entry,
    /// How the entry matched.
    pub match_kind: MatchKind,
    /// URL the detail page was served from.
    pub detail_url: String,
    /// Extracted records, possibly empty.
    pub records: Vec<Record>,
    /// Which extractor produced `records`.
    pub extraction_method: ExtractionMethod,
    /// Listing fetches issued, retries included.
    pub pages_fetched: usize,
    /// Pages whose fetch failed and were treated as missing.
    pub uncertain_pages: Vec<u32>,
    /// Wall time of the whole search in milliseconds.
    pub duration_ms: f64,
}

impl SearchReport {
    /// Converts to dictionary, writing `absent_marker` for absent fields.
    #[must_use]
    pub fn to_dict(&self, absent_marker: &str) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("search_id".to_string(), serde_json::json!(self.search_id.to_string()));
        dict.insert("started_at".to_string(), serde_json::json!(self.started_at.to_rfc3339()));
        dict.insert("query".to_string(), serde_json::json!(self.query));
        dict.insert("page_number".to_string(), serde_json::json!(self.page_number));
        dict.insert("entry".to_string(), serde_json::json!(self.entry.to_dict()));
        dict.insert("match_kind".to_string(), serde_json::json!(self.match_kind.as_str()));
        dict.insert("detail_url".to_string(), serde_json::json!(self.detail_url));
        dict.insert(
            "records".to_string(),
            serde_json::json!(self
                .records
                .iter()
                .map(|r| r.to_dict(absent_marker))
                .collect::<Vec<_>>()),
        );
        dict.insert(
            "extraction_method".to_string(),
            serde_json::json!(self.extraction_method.as_str()),
        );
        dict.insert("pages_fetched".to_string(), serde_json::json!(self.pages_fetched));
        dict.insert("uncertain_pages".to_string(), serde_json::json!(self.uncertain_pages));
        dict.insert("duration_ms".to_string(), serde_json::json!(self.duration_ms));
        dict
    }
}

/// A search that found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFoundReport {
    /// Search id.
    pub search_id: Uuid,
    /// Target label as given.
    pub query: String,
    /// Why the search ended.
    pub reason: NotFoundReason,
    /// Listing fetches issued, retries included.
    pub pages_fetched: usize,
    /// Pages whose fetch failed and were treated as missing. Non-empty means
    /// the entry may exist after all.
    pub uncertain_pages: Vec<u32>,
    /// Wall time of the whole search in milliseconds.
    pub duration_ms: f64,
}

impl NotFoundReport {
    /// Whether a fetch failure may have hidden the entry.
    #[must_use]
    pub fn is_uncertain(&self) -> bool {
        !self.uncertain_pages.is_empty()
    }
}

/// Found with records, or not found with a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The entry was located and its detail page read.
    Found(SearchReport),
    /// The entry was not located.
    NotFound(NotFoundReport),
}

impl SearchOutcome {
    /// The report, if found.
    #[must_use]
    pub fn report(&self) -> Option<&SearchReport> {
        match self {
            Self::Found(report) => Some(report),
            Self::NotFound(_) => None,
        }
    }

    /// The not-found reason, if not found.
    #[must_use]
    pub fn not_found_reason(&self) -> Option<NotFoundReason> {
        match self {
            Self::Found(_) => None,
            Self::NotFound(report) => Some(report.reason),
        }
    }

    /// Pages treated as missing after failed fetches.
    #[must_use]
    pub fn uncertain_pages(&self) -> &[u32] {
        match self {
            Self::Found(report) => &report.uncertain_pages,
            Self::NotFound(report) => &report.uncertain_pages,
        }
    }
}

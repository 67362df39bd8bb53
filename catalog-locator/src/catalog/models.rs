//! Entries, pages and ranges.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalises a label for comparison: trimmed and lower-cased.
///
/// All ordering and matching in the locator goes through this function, so
/// labels compare case-insensitively in plain lexicographic order.
#[must_use]
pub fn fold_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// One catalog item listed on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Display label, as listed.
    pub label: String,
    /// Opaque reference to the item's detail page (usually an absolute URL).
    pub link: String,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: link.into(),
        }
    }

    /// Whether the label equals `folded_target` ignoring case.
    #[must_use]
    pub fn matches_exactly(&self, folded_target: &str) -> bool {
        fold_label(&self.label) == folded_target
    }

    /// Whether the label contains `folded_target` ignoring case.
    #[must_use]
    pub fn contains(&self, folded_target: &str) -> bool {
        fold_label(&self.label).contains(folded_target)
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("label".to_string(), serde_json::json!(self.label));
        dict.insert("link".to_string(), serde_json::json!(self.link));
        dict
    }
}

/// Where a target falls relative to a page's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    /// Strictly before the first label.
    Before,
    /// Between the first and last labels, inclusive.
    Within,
    /// Strictly after the last label.
    After,
}

/// The folded first and last labels of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// Folded label of the first entry.
    pub first: String,
    /// Folded label of the last entry.
    pub last: String,
}

impl PageRange {
    /// Positions a folded target against this range.
    #[must_use]
    pub fn position_of(&self, folded_target: &str) -> RangePosition {
        if folded_target < self.first.as_str() {
            RangePosition::Before
        } else if folded_target > self.last.as_str() {
            RangePosition::After
        } else {
            RangePosition::Within
        }
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" to \"{}\"", self.first, self.last)
    }
}

/// One fetched listing page.
///
/// A page exists exactly when it has at least one qualifying entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based page number.
    pub page_number: u32,
    /// Qualifying entries, in listing order.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl PageInfo {
    /// Creates a page from its qualifying entries.
    #[must_use]
    pub fn new(page_number: u32, entries: Vec<Entry>) -> Self {
        Self {
            page_number,
            entries,
        }
    }

    /// Creates a page that does not exist.
    #[must_use]
    pub fn missing(page_number: u32) -> Self {
        Self {
            page_number,
            entries: Vec::new(),
        }
    }

    /// Whether the page has any qualifying entries.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The folded first/last labels, or `None` for a missing page.
    #[must_use]
    pub fn range(&self) -> Option<PageRange> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some(PageRange {
            first: fold_label(&first.label),
            last: fold_label(&last.label),
        })
    }

    /// First entry whose label equals the folded target.
    #[must_use]
    pub fn find_exact(&self, folded_target: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.matches_exactly(folded_target))
    }

    /// First entry whose label contains the folded target.
    #[must_use]
    pub fn find_containing(&self, folded_target: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.contains(folded_target))
    }

    /// Whether the entries are in ascending folded order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| fold_label(&pair[0].label) <= fold_label(&pair[1].label))
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("page_number".to_string(), serde_json::json!(self.page_number));
        dict.insert("exists".to_string(), serde_json::json!(self.exists()));
        dict.insert("count".to_string(), serde_json::json!(self.entries.len()));
        if let Some(range) = self.range() {
            dict.insert("first".to_string(), serde_json::json!(range.first));
            dict.insert("last".to_string(), serde_json::json!(range.last));
        }
        dict
    }
}

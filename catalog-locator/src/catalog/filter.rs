//! Entry qualification rules.

use serde::{Deserialize, Serialize};

/// Decides which listing links count as catalog entries.
///
/// Listing pages carry navigation, footer and advertising links as well as
/// catalog items; only labels passing this filter take part in ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Required label suffix, compared ignoring case.
    #[serde(default = "default_required_suffix")]
    pub required_suffix: Option<String>,
    /// Labels containing any of these (ignoring case) are rejected.
    #[serde(default = "default_excluded_substrings")]
    pub excluded_substrings: Vec<String>,
}

fn default_required_suffix() -> Option<String> {
    Some(".exe".to_string())
}

fn default_excluded_substrings() -> Vec<String> {
    vec!["processchecker".to_string()]
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            required_suffix: default_required_suffix(),
            excluded_substrings: default_excluded_substrings(),
        }
    }
}

impl EntryFilter {
    /// A filter accepting every non-empty label.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            required_suffix: None,
            excluded_substrings: Vec::new(),
        }
    }

    /// Sets the required suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.required_suffix = Some(suffix.into());
        self
    }

    /// Adds an excluded substring.
    #[must_use]
    pub fn with_excluded(mut self, substring: impl Into<String>) -> Self {
        self.excluded_substrings.push(substring.into());
        self
    }

    /// Whether a label qualifies as a catalog entry.
    #[must_use]
    pub fn accepts(&self, label: &str) -> bool {
        let lower = label.trim().to_lowercase();
        if lower.is_empty() {
            return false;
        }
        if let Some(ref suffix) = self.required_suffix {
            if !lower.ends_with(&suffix.to_lowercase()) {
                return false;
            }
        }
        !self
            .excluded_substrings
            .iter()
            .any(|excluded| lower.contains(&excluded.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = EntryFilter::default();
        assert!(filter.accepts("notepad.exe"));
        assert!(filter.accepts("  NOTEPAD.EXE "));
        assert!(!filter.accepts("notepad.dll"));
        assert!(!filter.accepts("processchecker.exe"));
        assert!(!filter.accepts(""));
        assert!(!filter.accepts("   "));
    }

    #[test]
    fn test_accept_all() {
        let filter = EntryFilter::accept_all();
        assert!(filter.accepts("anything"));
        assert!(!filter.accepts(""));
    }

    #[test]
    fn test_builder() {
        let filter = EntryFilter::accept_all()
            .with_suffix(".DLL")
            .with_excluded("sponsored");
        assert!(filter.accepts("kernel32.dll"));
        assert!(!filter.accepts("sponsored.dll"));
        assert!(!filter.accepts("kernel32.exe"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let filter: EntryFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, EntryFilter::default());

        let custom: EntryFilter =
            serde_json::from_str(r#"{"required_suffix": null, "excluded_substrings": []}"#).unwrap();
        assert_eq!(custom, EntryFilter::accept_all());
    }
}

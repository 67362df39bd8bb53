//! Error types for catalog location and extraction.
//!
//! Not-found outcomes are not errors: they are reported as
//! [`NotFoundReason`](crate::locator::NotFoundReason) values. The types here
//! cover malformed input, cancellation, and collaborator failures.

use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by a page source or detail fetcher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The request did not complete within the collaborator's timeout.
    #[error("Timed out fetching {target}")]
    Timeout {
        /// Page number or URL that was being fetched.
        target: String,
    },

    /// A transport-level failure (connection reset, DNS, TLS).
    #[error("Transport error fetching {target}: {message}")]
    Transport {
        /// Page number or URL that was being fetched.
        target: String,
        /// Underlying error text.
        message: String,
    },

    /// The remote answered with an unexpected HTTP status.
    #[error("Unexpected status {status} fetching {target}")]
    Status {
        /// Page number or URL that was being fetched.
        target: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response could not be interpreted.
    #[error("Malformed content from {target}: {message}")]
    Malformed {
        /// Page number or URL that was being fetched.
        target: String,
        /// What was wrong with the content.
        message: String,
    },

    /// A condition the search cannot recover from (bad configuration,
    /// closed session). Aborts the whole search.
    #[error("Non-recoverable source failure: {0}")]
    Fatal(String),
}

impl SourceError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(target: impl Into<String>) -> Self {
        Self::Timeout {
            target: target.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(target: impl Into<String>, status: u16) -> Self {
        Self::Status {
            target: target.into(),
            status,
        }
    }

    /// Creates a malformed-content error.
    #[must_use]
    pub fn malformed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates a fatal error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Whether the locator must abort instead of treating the page as missing.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Short machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::Fatal(_) => "fatal",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("fatal".to_string(), serde_json::json!(self.is_fatal()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors that abort a call to [`locate`](crate::locator::locate).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// The target label was empty or blank.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The search was cancelled between fetch steps.
    #[error("Search cancelled: {0}")]
    Cancelled(String),

    /// The page source reported a non-recoverable failure.
    #[error("Page {page} could not be fetched: {source}")]
    Source {
        /// Page number being fetched when the failure occurred.
        page: u32,
        /// The collaborator failure.
        #[source]
        source: SourceError,
    },
}

impl LocatorError {
    /// Creates an invalid target error.
    #[must_use]
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget(message.into())
    }
}

/// Errors returned by a complete search (locate, fetch detail, extract).
#[derive(Debug, Error)]
pub enum SearchError {
    /// The locator aborted.
    #[error("{0}")]
    Locator(#[from] LocatorError),

    /// The matched entry's detail page could not be fetched.
    #[error("Detail page for '{label}' could not be fetched: {source}")]
    DetailFetch {
        /// Label of the matched entry.
        label: String,
        /// The collaborator failure.
        #[source]
        source: SourceError,
    },

    /// The catalog source could not be set up.
    #[error("Catalog source could not be set up: {0}")]
    Setup(#[source] SourceError),

    /// Configuration was rejected.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl SearchError {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::Locator(err) => {
                map.insert("type".to_string(), serde_json::json!("LocatorError"));
                if let LocatorError::Source { page, source } = err {
                    map.insert("page".to_string(), serde_json::json!(page));
                    map.insert("source".to_string(), serde_json::json!(source.to_dict()));
                }
            }
            Self::DetailFetch { label, source } => {
                map.insert("type".to_string(), serde_json::json!("DetailFetchError"));
                map.insert("label".to_string(), serde_json::json!(label));
                map.insert("source".to_string(), serde_json::json!(source.to_dict()));
            }
            Self::Setup(source) => {
                map.insert("type".to_string(), serde_json::json!("SetupError"));
                map.insert("source".to_string(), serde_json::json!(source.to_dict()));
            }
            Self::Config(_) => {
                map.insert("type".to_string(), serde_json::json!("ConfigError"));
            }
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration was not valid JSON for the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value was out of range or inconsistent.
    #[error("Invalid configuration: {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fatal_is_fatal() {
        assert!(SourceError::fatal("session closed").is_fatal());
        assert!(!SourceError::timeout("page 4").is_fatal());
        assert!(!SourceError::transport("page 4", "reset").is_fatal());
        assert!(!SourceError::status("page 4", 503).is_fatal());
        assert!(!SourceError::malformed("page 4", "truncated").is_fatal());
    }

    #[test]
    fn test_source_error_to_dict() {
        let dict = SourceError::status("page 8", 502).to_dict();
        assert_eq!(dict.get("kind").unwrap(), "status");
        assert_eq!(dict.get("fatal"), Some(&serde_json::json!(false)));
        assert!(dict
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("502"));
    }

    #[test]
    fn test_locator_error_display() {
        let err = LocatorError::Source {
            page: 16,
            source: SourceError::fatal("browser gone"),
        };
        assert_eq!(
            err.to_string(),
            "Page 16 could not be fetched: Non-recoverable source failure: browser gone"
        );
    }

    #[test]
    fn test_search_error_to_dict() {
        let err = SearchError::DetailFetch {
            label: "notepad.exe".to_string(),
            source: SourceError::timeout("https://example.com/notepad"),
        };
        let dict = err.to_dict();
        assert_eq!(dict.get("type").unwrap(), "DetailFetchError");
        assert_eq!(dict.get("label").unwrap(), "notepad.exe");
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::invalid("locator.max_page_exponent", "must be at most 30");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: locator.max_page_exponent: must be at most 30"
        );
    }
}

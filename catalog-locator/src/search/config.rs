//! Combined search configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::extractor::FieldSchema;
use crate::locator::LocatorConfig;
use crate::source::{CatalogConfig, FetchConfig};

/// Everything a [`CatalogSearch`](super::CatalogSearch) needs to know.
///
/// Every section may be omitted from JSON and falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTTP fetching.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Catalog addressing and entry qualification.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Probe and bisection limits.
    #[serde(default)]
    pub locator: LocatorConfig,
    /// Detail table fields.
    #[serde(default)]
    pub schema: FieldSchema,
    /// Overall deadline of one search, in seconds.
    #[serde(default)]
    pub deadline_seconds: Option<f64>,
}

impl SearchConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the catalog configuration.
    #[must_use]
    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets the locator configuration.
    #[must_use]
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    /// Sets the field schema.
    #[must_use]
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the overall deadline.
    #[must_use]
    pub fn with_deadline(mut self, seconds: f64) -> Self {
        self.deadline_seconds = Some(seconds);
        self
    }

    /// The deadline as a Duration.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first rejected value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch.validate()?;
        self.catalog.validate()?;
        self.locator.validate()?;
        self.schema.validate()?;
        if let Some(seconds) = self.deadline_seconds {
            if !(seconds.is_finite() && seconds > 0.0) {
                return Err(ConfigError::invalid(
                    "deadline_seconds",
                    "must be a positive number of seconds",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = SearchConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.locator.max_page_exponent, 12);
        assert!(config.deadline().is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = SearchConfig::from_json_str(
            r#"{
                "catalog": {"base_url": "https://catalog.test/list", "section_case": "lower"},
                "locator": {"max_page_exponent": 8, "refetch_candidate": true},
                "deadline_seconds": 30
            }"#,
        )
        .unwrap();

        assert_eq!(config.catalog.base_url, "https://catalog.test/list");
        assert_eq!(config.catalog.section_param, "start");
        assert_eq!(config.locator.max_page_exponent, 8);
        assert!(config.locator.refetch_candidate);
        assert_eq!(config.deadline(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_out_of_range_exponent_rejected() {
        let err = SearchConfig::from_json_str(r#"{"locator": {"max_page_exponent": 31}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = SearchConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }

    #[test]
    fn test_non_positive_deadline_rejected() {
        assert!(SearchConfig::new().with_deadline(0.0).validate().is_err());
    }

    #[test]
    fn test_unrepresentable_deadline_has_no_duration() {
        assert_eq!(SearchConfig::new().with_deadline(-1.0).deadline(), None);
        assert_eq!(SearchConfig::new().with_deadline(f64::NAN).deadline(), None);
        assert_eq!(SearchConfig::new().with_deadline(f64::INFINITY).deadline(), None);
        assert!(SearchConfig::new().with_deadline(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"schema": {{"absent_marker": "-"}}}}"#).unwrap();

        let config = SearchConfig::load(file.path()).unwrap();
        assert_eq!(config.schema.absent_marker, "-");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SearchConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

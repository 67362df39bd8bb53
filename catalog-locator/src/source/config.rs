//! Configuration for fetching catalog pages over HTTP.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use url::Url;

use crate::catalog::EntryFilter;
use crate::errors::{ConfigError, SourceError};

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout() -> f64 {
    20.0
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    concat!("catalog-locator/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive timeout or an invalid retry policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Err(ConfigError::invalid(
                "fetch.timeout_seconds",
                "must be a positive number of seconds",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("fetch.user_agent", "must not be blank"));
        }
        self.retry.validate()
    }
}

/// Retry configuration for failed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Whether to add up to 25% random jitter to each delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    10.0
}

fn default_jitter() -> bool {
    true
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            jitter: default_jitter(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Disables jitter.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Calculates the delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_seconds).max(0.0);
        let final_delay = if self.jitter {
            capped + capped * 0.25 * rand::random::<f64>()
        } else {
            capped
        };
        Duration::from_secs_f64(final_delay)
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Validates the retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite delays.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("fetch.retry.retry_delay_seconds", self.retry_delay_seconds),
            ("fetch.retry.max_delay_seconds", self.max_delay_seconds),
            ("fetch.retry.backoff_multiplier", self.backoff_multiplier),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

/// How the section parameter is derived from the target's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCase {
    /// Upper-cased (`notepad.exe` → `N`).
    #[default]
    Upper,
    /// Lower-cased.
    Lower,
    /// Used as typed.
    Preserve,
}

/// Where a catalog lives and how its listing pages are addressed.
///
/// Page 1 of a section is `{base_url}?{section_param}={section}`; page `n > 1`
/// appends `&{page_param}={n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Listing endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Query parameter selecting the alphabetical section.
    #[serde(default = "default_section_param")]
    pub section_param: String,
    /// Query parameter selecting the page within a section.
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// Casing applied to the section character.
    #[serde(default)]
    pub section_case: SectionCase,
    /// Which listing anchors count as catalog entries.
    #[serde(default)]
    pub entry_filter: EntryFilter,
}

fn default_base_url() -> String {
    "https://processchecker.com/file.php".to_string()
}

fn default_section_param() -> String {
    "start".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            section_param: default_section_param(),
            page_param: default_page_param(),
            section_case: SectionCase::default(),
            entry_filter: EntryFilter::default(),
        }
    }
}

impl CatalogConfig {
    /// Creates a catalog configuration for `base_url` with default parameters.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the section casing.
    #[must_use]
    pub fn with_section_case(mut self, case: SectionCase) -> Self {
        self.section_case = case;
        self
    }

    /// Sets the entry filter.
    #[must_use]
    pub fn with_entry_filter(mut self, filter: EntryFilter) -> Self {
        self.entry_filter = filter;
        self
    }

    /// The section a target is listed under, from its first character.
    #[must_use]
    pub fn section_for(&self, target: &str) -> Option<String> {
        let first = target.trim().chars().next()?;
        Some(match self.section_case {
            SectionCase::Upper => first.to_uppercase().collect(),
            SectionCase::Lower => first.to_lowercase().collect(),
            SectionCase::Preserve => first.to_string(),
        })
    }

    /// URL of listing page `page_number` within `section`.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the base URL does not parse.
    pub fn page_url(&self, section: &str, page_number: u32) -> Result<Url, SourceError> {
        let mut url = self.base()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(&self.section_param, section);
            if page_number > 1 {
                query.append_pair(&self.page_param, &page_number.to_string());
            }
        }
        Ok(url)
    }

    /// Resolves an entry link (possibly relative) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if neither the link nor the joined URL parses.
    pub fn resolve_link(&self, link: &str) -> Result<Url, SourceError> {
        if let Ok(url) = Url::parse(link) {
            return Ok(url);
        }
        self.base()?
            .join(link)
            .map_err(|e| SourceError::fatal(format!("invalid entry link '{link}': {e}")))
    }

    fn base(&self) -> Result<Url, SourceError> {
        Url::parse(&self.base_url)
            .map_err(|e| SourceError::fatal(format!("invalid base URL '{}': {e}", self.base_url)))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or a
    /// query parameter name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::invalid("catalog.base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "catalog.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.section_param.trim().is_empty() {
            return Err(ConfigError::invalid("catalog.section_param", "must not be blank"));
        }
        if self.page_param.trim().is_empty() {
            return Err(ConfigError::invalid("catalog.page_param", "must not be blank"));
        }
        Ok(())
    }
}

//! Locator configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Largest accepted probe exponent; `2^30` is the highest probed page.
pub(crate) const MAX_PAGE_EXPONENT_LIMIT: u32 = 30;

/// Largest accepted number of extra attempts inside the bisection window.
pub(crate) const MAX_WINDOW_RETRIES: u32 = 5;

/// Configuration for [`locate`](super::locate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Highest exponent `e` for which page `2^e` is probed.
    #[serde(default = "default_max_page_exponent")]
    pub max_page_exponent: u32,
    /// Extra attempts for a failed fetch inside the bisection window.
    #[serde(default = "default_window_retries")]
    pub window_retries: u32,
    /// Fetch the candidate page again before selecting the entry.
    #[serde(default)]
    pub refetch_candidate: bool,
    /// Log a warning when a listing page is not in ascending order.
    #[serde(default = "default_true")]
    pub check_sorted: bool,
}

fn default_max_page_exponent() -> u32 {
    12
}

fn default_window_retries() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_page_exponent: default_max_page_exponent(),
            window_retries: default_window_retries(),
            refetch_candidate: false,
            check_sorted: true,
        }
    }
}

impl LocatorConfig {
    /// Creates a new locator configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum probe exponent.
    #[must_use]
    pub fn with_max_page_exponent(mut self, exponent: u32) -> Self {
        self.max_page_exponent = exponent;
        self
    }

    /// Sets the number of retries inside the bisection window.
    #[must_use]
    pub fn with_window_retries(mut self, retries: u32) -> Self {
        self.window_retries = retries;
        self
    }

    /// Enables re-fetching the candidate page before entry selection.
    #[must_use]
    pub fn with_refetch_candidate(mut self) -> Self {
        self.refetch_candidate = true;
        self
    }

    /// Highest page number the probe may reach.
    #[must_use]
    pub fn max_probe_page(&self) -> u32 {
        1u32 << self.max_page_exponent.min(MAX_PAGE_EXPONENT_LIMIT)
    }

    /// Fetch attempts for one page inside the bisection window, clamped to
    /// the accepted retry limit.
    #[must_use]
    pub fn window_attempts(&self) -> u32 {
        self.window_retries.min(MAX_WINDOW_RETRIES) + 1
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_exponent == 0 || self.max_page_exponent > MAX_PAGE_EXPONENT_LIMIT {
            return Err(ConfigError::invalid(
                "locator.max_page_exponent",
                format!("must be between 1 and {MAX_PAGE_EXPONENT_LIMIT}"),
            ));
        }
        if self.window_retries > MAX_WINDOW_RETRIES {
            return Err(ConfigError::invalid(
                "locator.window_retries",
                format!("must be at most {MAX_WINDOW_RETRIES}"),
            ));
        }
        Ok(())
    }
}

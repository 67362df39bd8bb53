//! The detail fetcher seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;

/// A fetched detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPage {
    /// URL the content was served from.
    pub url: String,
    /// Raw HTML.
    pub html: String,
}

impl DetailPage {
    /// Creates a detail page.
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Dereferences a matched entry's link into its detail page.
///
/// Implementations own any navigation fallback (for example following the
/// link in a browser session and falling back to direct navigation).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Fetches the detail page behind `link`.
    async fn fetch_detail(&self, link: &str) -> Result<DetailPage, SourceError>;
}

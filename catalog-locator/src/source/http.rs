//! HTTP implementation of both collaborators.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::config::{CatalogConfig, FetchConfig};
use super::detail::{DetailFetcher, DetailPage};
use crate::catalog::{parse_listing, PageInfo};
use crate::errors::SourceError;
use crate::locator::PageSource;

/// Fetches listing and detail pages of a catalog with `reqwest`.
///
/// The client is shared between clones; [`for_target`](Self::for_target)
/// binds a copy to the target's alphabetical section, giving each search its
/// own source.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    fetch: FetchConfig,
    catalog: CatalogConfig,
    section: Option<String>,
}

impl HttpCatalogSource {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if a configured header is invalid or the client
    /// cannot be built.
    pub fn new(fetch: FetchConfig, catalog: CatalogConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &fetch.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::fatal(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SourceError::fatal(format!("invalid value for header {name}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(fetch.timeout())
            .user_agent(fetch.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(fetch.max_redirects))
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::fatal(format!("HTTP client could not be built: {e}")))?;

        Ok(Self {
            client,
            fetch,
            catalog,
            section: None,
        })
    }

    /// A source bound to the section `target` is listed under.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the target has no first character.
    pub fn for_target(&self, target: &str) -> Result<Self, SourceError> {
        let section = self
            .catalog
            .section_for(target)
            .ok_or_else(|| SourceError::fatal("target has no section character"))?;
        Ok(Self {
            section: Some(section),
            ..self.clone()
        })
    }

    /// The bound section, if any.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// The catalog configuration.
    #[must_use]
    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    /// GETs `url`, retrying retryable statuses and transport failures.
    ///
    /// Returns `Ok(None)` for 404, otherwise the final URL and body.
    async fn get_text(&self, url: &Url) -> Result<Option<(String, String)>, SourceError> {
        let retry = &self.fetch.retry;
        let mut attempt = 0;

        loop {
            let outcome = self.get_once(url).await;
            let err = match outcome {
                Ok(page) => return Ok(page),
                Err(err) if err.is_fatal() || attempt >= retry.max_retries => return Err(err),
                Err(err) => err,
            };
            if let SourceError::Status { status, .. } = &err {
                if !retry.should_retry_status(*status) {
                    return Err(err);
                }
            }

            let delay = retry.delay_for_attempt(attempt);
            debug!(
                url = %url,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_once(&self, url: &Url) -> Result<Option<(String, String)>, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(&e, url.as_str()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Page not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&e, url.as_str()))?;
        Ok(Some((final_url, body)))
    }
}

fn classify(err: &reqwest::Error, target: &str) -> SourceError {
    if err.is_timeout() {
        SourceError::timeout(target)
    } else if err.is_builder() {
        SourceError::fatal(format!("request to {target} could not be built: {err}"))
    } else if err.is_decode() || err.is_body() {
        SourceError::malformed(target, err.to_string())
    } else {
        SourceError::transport(target, err.to_string())
    }
}

#[async_trait]
impl PageSource for HttpCatalogSource {
    async fn fetch_page(&self, page_number: u32) -> Result<PageInfo, SourceError> {
        let section = self
            .section
            .as_deref()
            .ok_or_else(|| SourceError::fatal("no catalog section bound; use for_target"))?;
        let url = self.catalog.page_url(section, page_number)?;

        match self.get_text(&url).await {
            Ok(Some((final_url, html))) => {
                let page = parse_listing(
                    &html,
                    page_number,
                    Some(final_url.as_str()),
                    &self.catalog.entry_filter,
                );
                debug!(url = %url, entries = page.entries.len(), "Listing page fetched");
                Ok(page)
            }
            Ok(None) => Ok(PageInfo::missing(page_number)),
            Err(err) => {
                warn!(url = %url, error = %err, "Listing page fetch failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl DetailFetcher for HttpCatalogSource {
    async fn fetch_detail(&self, link: &str) -> Result<DetailPage, SourceError> {
        let url = self.catalog.resolve_link(link)?;
        match self.get_text(&url).await? {
            Some((final_url, html)) => Ok(DetailPage::new(final_url, html)),
            None => Err(SourceError::status(url.as_str(), StatusCode::NOT_FOUND.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::config::RetryConfig;

    fn unreachable_catalog() -> HttpCatalogSource {
        let fetch = FetchConfig::default()
            .with_timeout(2.0)
            .with_retry(RetryConfig::none());
        HttpCatalogSource::new(fetch, CatalogConfig::new("http://127.0.0.1:9/file.php")).unwrap()
    }

    #[test]
    fn test_for_target_binds_section() {
        let source = unreachable_catalog();
        assert_eq!(source.section(), None);
        let bound = source.for_target("notepad.exe").unwrap();
        assert_eq!(bound.section(), Some("N"));
        assert!(source.for_target("   ").unwrap_err().is_fatal());
    }

    #[test]
    fn test_invalid_header_is_fatal() {
        let fetch = FetchConfig::default().with_header("bad header", "x");
        let err = HttpCatalogSource::new(fetch, CatalogConfig::default()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unbound_source_is_fatal() {
        let err = unreachable_catalog().fetch_page(1).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_connection_failure_is_recoverable() {
        let source = unreachable_catalog().for_target("a").unwrap();
        let err = source.fetch_page(1).await.unwrap_err();
        assert!(!err.is_fatal(), "{err}");
    }
}

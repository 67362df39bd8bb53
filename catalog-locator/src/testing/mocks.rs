//! In-memory page source for tests and benchmarks.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::catalog::{Entry, PageInfo};
use crate::errors::SourceError;
use crate::locator::PageSource;

/// A sorted catalog held in memory that records every fetch.
///
/// Failures can be scripted per page; each fetch of that page consumes one
/// scripted failure before the page is served normally.
#[derive(Debug, Default)]
pub struct SyntheticCatalog {
    pages: Vec<Vec<Entry>>,
    latency: Option<Duration>,
    failures: Mutex<HashMap<u32, VecDeque<SourceError>>>,
    fetch_log: Mutex<Vec<u32>>,
}

impl SyntheticCatalog {
    /// Creates a catalog from per-page labels. Page 1 is `pages[0]`.
    #[must_use]
    pub fn from_pages(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|labels| {
                    labels
                        .iter()
                        .map(|label| Entry::new(*label, format!("https://catalog.test/item/{label}")))
                        .collect()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Generates `page_count` pages of `per_page` sorted labels of the form
    /// `item-PPPPPP-EE.exe`.
    #[must_use]
    pub fn generate(page_count: u32, per_page: u32) -> Self {
        let pages = (1..=page_count)
            .map(|page| {
                (0..per_page)
                    .map(|slot| {
                        let label = Self::label_for(page, slot);
                        Entry::new(label.clone(), format!("https://catalog.test/item/{label}"))
                    })
                    .collect()
            })
            .collect();
        Self {
            pages,
            ..Default::default()
        }
    }

    /// The label [`generate`](Self::generate) puts at `slot` of `page`.
    #[must_use]
    pub fn label_for(page: u32, slot: u32) -> String {
        format!("item-{page:06}-{slot:02}.exe")
    }

    /// Adds a fixed delay to every fetch.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Scripts a failure for the next fetch of `page`.
    #[must_use]
    pub fn with_failure(self, page: u32, error: SourceError) -> Self {
        self.failures.lock().entry(page).or_default().push_back(error);
        self
    }

    /// Number of pages in the catalog.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    /// Total fetches served or failed.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().len()
    }

    /// Fetches of one page.
    #[must_use]
    pub fn fetches_of(&self, page: u32) -> usize {
        self.fetch_log.lock().iter().filter(|p| **p == page).count()
    }

    /// Page numbers in fetch order.
    #[must_use]
    pub fn fetch_log(&self) -> Vec<u32> {
        self.fetch_log.lock().clone()
    }

    /// Clears the fetch log.
    pub fn reset(&self) {
        self.fetch_log.lock().clear();
    }

    fn page(&self, page_number: u32) -> PageInfo {
        let index = page_number.checked_sub(1).map(|i| i as usize);
        match index.and_then(|i| self.pages.get(i)) {
            Some(entries) => PageInfo::new(page_number, entries.clone()),
            None => PageInfo::missing(page_number),
        }
    }
}

#[async_trait]
impl PageSource for SyntheticCatalog {
    async fn fetch_page(&self, page_number: u32) -> Result<PageInfo, SourceError> {
        self.fetch_log.lock().push(page_number);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .failures
            .lock()
            .get_mut(&page_number)
            .and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }

        Ok(self.page(page_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthetic_catalog_serves_pages() {
        let catalog = SyntheticCatalog::from_pages(&[&["a", "b"], &["c"]]);
        assert_eq!(catalog.page_count(), 2);

        let first = catalog.fetch_page(1).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(!catalog.fetch_page(3).await.unwrap().exists());
        assert!(!catalog.fetch_page(0).await.unwrap().exists());
        assert_eq!(catalog.fetch_log(), vec![1, 3, 0]);
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed() {
        let catalog = SyntheticCatalog::from_pages(&[&["a"]])
            .with_failure(1, SourceError::timeout("page 1"));

        assert!(catalog.fetch_page(1).await.is_err());
        assert!(catalog.fetch_page(1).await.is_ok());
        assert_eq!(catalog.fetches_of(1), 2);
    }

    #[test]
    fn test_reset_clears_log() {
        let catalog = SyntheticCatalog::generate(3, 2);
        tokio_test::block_on(async {
            catalog.fetch_page(2).await.unwrap();
        });
        assert_eq!(catalog.fetches_of(2), 1);
        catalog.reset();
        assert_eq!(catalog.fetch_count(), 0);
    }

    #[test]
    fn test_generated_pages_are_sorted() {
        let catalog = SyntheticCatalog::generate(20, 5);
        for page in 1..=20 {
            assert!(catalog.page(page).is_sorted());
        }
        let last_of_first = catalog.page(1).range().unwrap().last;
        let first_of_second = catalog.page(2).range().unwrap().first;
        assert!(last_of_first < first_of_second);
    }
}

//! Locate, fetch detail, extract.

use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::SearchConfig;
use super::report::{ExtractionMethod, NotFoundReport, SearchOutcome, SearchReport};
use crate::cancellation::CancellationToken;
use crate::errors::SearchError;
use crate::extractor::{body_text, extract, extract_from_text, Record, TableDocument};
use crate::locator::{locate, LocateResult, Located, PageSource};
use crate::observability::{SearchEventEmitter, SearchSummary};
use crate::source::DetailFetcher;

/// Runs complete searches against one catalog.
///
/// The detail fetcher is shared by every search; the page source is passed
/// per search so each one navigates its own listing session.
#[derive(Debug)]
pub struct CatalogSearch<D> {
    detail: D,
    config: SearchConfig,
    emitter: SearchEventEmitter,
}

impl<D: DetailFetcher> CatalogSearch<D> {
    /// Creates a search runner.
    pub fn new(detail: D, config: SearchConfig) -> Self {
        Self {
            detail,
            config,
            emitter: SearchEventEmitter::new(),
        }
    }

    /// Replaces the wide event emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: SearchEventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Locates `target` through `source`, fetches its detail page and
    /// extracts records from it.
    ///
    /// The table extractor runs first; when it yields nothing the text
    /// patterns of the schema are tried. A configured deadline stops this
    /// search only; `cancel` itself is never cancelled by it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the target is blank,
    /// the search is cancelled, the source fails fatally, or the detail page
    /// cannot be fetched.
    pub async fn run<S>(
        &self,
        target: &str,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError>
    where
        S: PageSource + ?Sized,
    {
        let search_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let mut summary = SearchSummary::new(search_id, target, started_at);

        debug!(%search_id, query = %target, "Search started");
        let result = match self.config.validate() {
            Ok(()) => {
                // The deadline cancels a child token, never the caller's.
                let search_cancel = cancel.child();
                let _timer = self
                    .config
                    .deadline()
                    .map(|deadline| search_cancel.cancel_after(deadline));
                self.execute(target, source, &search_cancel, &mut summary)
                    .await
            }
            Err(err) => Err(err.into()),
        };

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        summary.duration_ms = duration_ms;
        let outcome = match result {
            Ok(Step::Found(partial)) => {
                summary.status = "found";
                Ok(SearchOutcome::Found(SearchReport {
                    search_id,
                    started_at,
                    query: target.to_string(),
                    duration_ms,
                    ..partial
                }))
            }
            Ok(Step::NotFound(partial)) => {
                summary.status = "not_found";
                Ok(SearchOutcome::NotFound(NotFoundReport {
                    search_id,
                    query: target.to_string(),
                    duration_ms,
                    ..partial
                }))
            }
            Err(err) => {
                warn!(%search_id, query = %target, error = %err, "Search failed");
                summary.status = "error";
                summary.error = Some(err.to_dict());
                Err(err)
            }
        };

        self.emitter.emit(&summary);
        outcome
    }

    async fn execute<S>(
        &self,
        target: &str,
        source: &S,
        cancel: &CancellationToken,
        summary: &mut SearchSummary,
    ) -> Result<Step, SearchError>
    where
        S: PageSource + ?Sized,
    {
        let LocateResult {
            located,
            pages_fetched,
            uncertain_pages,
            ..
        } = locate(target, source, &self.config.locator, cancel).await?;
        summary.pages_fetched = pages_fetched;
        summary.uncertain_pages.clone_from(&uncertain_pages);

        let hit = match located {
            Located::Found(hit) => hit,
            Located::NotFound { reason } => {
                summary.not_found_reason = Some(reason.to_string());
                return Ok(Step::NotFound(NotFoundReport {
                    search_id: summary.search_id,
                    query: String::new(),
                    reason,
                    pages_fetched,
                    uncertain_pages,
                    duration_ms: 0.0,
                }));
            }
        };
        summary.page_number = Some(hit.page_number);
        summary.match_kind = Some(hit.match_kind.as_str().to_string());

        cancel.checkpoint("detail fetch")?;
        let detail = self
            .detail
            .fetch_detail(&hit.entry.link)
            .await
            .map_err(|source| SearchError::DetailFetch {
                label: hit.entry.label.clone(),
                source,
            })?;

        let (records, extraction_method) = self.extract_records(&detail.html);
        info!(
            search_id = %summary.search_id,
            label = %hit.entry.label,
            records = records.len(),
            method = extraction_method.as_str(),
            "Detail page extracted"
        );
        summary.records = Some(records.len());
        summary.extraction_method = Some(extraction_method.as_str().to_string());

        Ok(Step::Found(SearchReport {
            search_id: summary.search_id,
            started_at: summary.started_at,
            query: String::new(),
            page_number: hit.page_number,
            entry: hit.entry,
            match_kind: hit.match_kind,
            detail_url: detail.url,
            records,
            extraction_method,
            pages_fetched,
            uncertain_pages,
            duration_ms: 0.0,
        }))
    }

    fn extract_records(&self, html: &str) -> (Vec<Record>, ExtractionMethod) {
        let schema = &self.config.schema;
        let records = extract(&TableDocument::parse_html(html), schema);
        if !records.is_empty() {
            return (records, ExtractionMethod::Table);
        }

        debug!("No table records; trying text patterns");
        match extract_from_text(&body_text(html), schema) {
            Some(record) => (vec![record], ExtractionMethod::TextPattern),
            None => (Vec::new(), ExtractionMethod::None),
        }
    }
}

/// Search result before timing fields are filled in.
enum Step {
    Found(SearchReport),
    NotFound(NotFoundReport),
}

/// Searches a live catalog over HTTP with a fresh, section-bound source.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the HTTP client cannot
/// be built, or the search itself fails.
#[cfg(feature = "http")]
pub async fn search_catalog(
    target: &str,
    config: SearchConfig,
    cancel: &CancellationToken,
) -> Result<SearchOutcome, SearchError> {
    use crate::errors::LocatorError;
    use crate::source::HttpCatalogSource;

    config.validate()?;
    if target.trim().is_empty() {
        return Err(LocatorError::invalid_target("target label must not be blank").into());
    }
    let client = HttpCatalogSource::new(config.fetch.clone(), config.catalog.clone())
        .map_err(SearchError::Setup)?;
    let source = client.for_target(target).map_err(SearchError::Setup)?;
    CatalogSearch::new(client, config).run(target, &source, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{LocatorError, SourceError};
    use crate::locator::{MatchKind, NotFoundReason};
    use crate::observability::WideEventSink;
    use crate::source::{DetailPage, MockDetailFetcher};
    use crate::testing::{detail_page_html, SyntheticCatalog, DETAIL_WITHOUT_TABLE};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Default)]
    struct Capture(Mutex<Vec<serde_json::Value>>);

    impl WideEventSink for Capture {
        fn emit(&self, _event_type: &str, payload: &serde_json::Value) {
            self.0.lock().push(payload.clone());
        }
    }

    fn catalog() -> SyntheticCatalog {
        SyntheticCatalog::from_pages(&[
            &["acrord32.exe", "adobearm.exe"],
            &["ccleaner.exe", "chrome.exe"],
            &["explorer.exe", "firefox.exe"],
            &["notepad.exe", "outlook.exe"],
        ])
    }

    fn serving(html: String) -> MockDetailFetcher {
        let mut detail = MockDetailFetcher::new();
        detail
            .expect_fetch_detail()
            .times(1)
            .returning(move |link| Ok(DetailPage::new(link, html.clone())));
        detail
    }

    #[tokio::test]
    async fn test_found_with_table_records() {
        let html = detail_page_html(
            &["Path", "Product", "Company"],
            &[&["C:\\Windows\\notepad.exe", "Windows", "Microsoft"]],
        );
        let capture = Arc::new(Capture::default());
        let search = CatalogSearch::new(serving(html), SearchConfig::default())
            .with_emitter(SearchEventEmitter::new().with_sink(capture.clone()));

        let outcome = search
            .run("Notepad.exe", &catalog(), &CancellationToken::new())
            .await
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.page_number, 4);
        assert_eq!(report.entry.label, "notepad.exe");
        assert_eq!(report.match_kind, MatchKind::Exact);
        assert_eq!(report.detail_url, "https://catalog.test/item/notepad.exe");
        assert_eq!(report.extraction_method, ExtractionMethod::Table);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].get("vendor"), Some("Microsoft"));
        assert_eq!(report.query, "Notepad.exe");

        let events = capture.0.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["status"], "found");
        assert_eq!(events[0]["page_number"], 4);
        assert_eq!(events[0]["extraction_method"], "table");
    }

    #[tokio::test]
    async fn test_falls_back_to_text_patterns() {
        let search = CatalogSearch::new(
            serving(DETAIL_WITHOUT_TABLE.to_string()),
            SearchConfig::default(),
        );
        let outcome = search
            .run("notepad.exe", &catalog(), &CancellationToken::new())
            .await
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.extraction_method, ExtractionMethod::TextPattern);
        assert_eq!(
            report.records[0].get("filePath"),
            Some("C:\\Windows\\System32\\notepad.exe")
        );
        assert_eq!(
            report.to_dict("Not found")["records"][0]["product"],
            "Microsoft Windows Operating System"
        );
    }

    #[tokio::test]
    async fn test_no_records_is_still_found() {
        let search = CatalogSearch::new(
            serving("<html><body><p>Nothing here</p></body></html>".to_string()),
            SearchConfig::default(),
        );
        let outcome = search
            .run("chrome.exe", &catalog(), &CancellationToken::new())
            .await
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.page_number, 2);
        assert!(report.records.is_empty());
        assert_eq!(report.extraction_method, ExtractionMethod::None);
    }

    #[tokio::test]
    async fn test_not_found_skips_detail_fetch() {
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let capture = Arc::new(Capture::default());
        let search = CatalogSearch::new(detail, SearchConfig::default())
            .with_emitter(SearchEventEmitter::new().with_sink(capture.clone()));

        let outcome = search
            .run("aaa.exe", &catalog(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.not_found_reason(), Some(NotFoundReason::BeforeStart));
        assert!(outcome.uncertain_pages().is_empty());
        assert_eq!(capture.0.lock()[0]["not_found_reason"], "before-start");
    }

    #[tokio::test]
    async fn test_uncertain_not_found_is_reported() {
        let source = catalog().with_failure(8, SourceError::timeout("page 8"));
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let search = CatalogSearch::new(detail, SearchConfig::default());

        let outcome = search
            .run("zz.exe", &source, &CancellationToken::new())
            .await
            .unwrap();

        let SearchOutcome::NotFound(report) = outcome else {
            panic!("expected not found");
        };
        assert!(report.is_uncertain());
        assert_eq!(report.uncertain_pages, vec![8]);
    }

    #[tokio::test]
    async fn test_detail_failure_is_distinct_from_not_found() {
        let mut detail = MockDetailFetcher::new();
        detail
            .expect_fetch_detail()
            .withf(|link| link.ends_with("firefox.exe"))
            .returning(|link| Err(SourceError::timeout(link)));
        let capture = Arc::new(Capture::default());
        let search = CatalogSearch::new(detail, SearchConfig::default())
            .with_emitter(SearchEventEmitter::new().with_sink(capture.clone()));

        let err = search
            .run("firefox.exe", &catalog(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::DetailFetch { ref label, .. } if label == "firefox.exe"));
        let events = capture.0.lock();
        assert_eq!(events[0]["status"], "error");
        assert_eq!(events[0]["error"]["type"], "DetailFetchError");
    }

    #[tokio::test]
    async fn test_blank_target_is_an_error() {
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let search = CatalogSearch::new(detail, SearchConfig::default());
        let source = catalog();

        let err = search
            .run("  ", &source, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Locator(LocatorError::InvalidTarget(_))));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_search() {
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let config = SearchConfig::default().with_deadline(0.05);
        let search = CatalogSearch::new(detail, config);
        let source = SyntheticCatalog::generate(200, 3)
            .with_latency(std::time::Duration::from_millis(30));

        let err = search
            .run(&SyntheticCatalog::label_for(150, 0), &source, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Locator(LocatorError::Cancelled(_))));
        assert!(source.fetch_count() < 5);
    }

    #[tokio::test]
    async fn test_deadline_does_not_outlive_the_search() {
        let html = detail_page_html(&["Path"], &[&["C:\\Windows\\notepad.exe"]]);
        let config = SearchConfig::default().with_deadline(0.05);
        let search = CatalogSearch::new(serving(html), config);
        let cancel = CancellationToken::new();

        let outcome = search.run("notepad.exe", &catalog(), &cancel).await.unwrap();
        assert!(outcome.report().is_some());

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert!(!cancel.is_cancelled());
        assert!(cancel.reason().is_none());

        let again = CatalogSearch::new(
            serving("<html><body></body></html>".to_string()),
            SearchConfig::default(),
        )
        .run("chrome.exe", &catalog(), &cancel)
        .await
        .unwrap();
        assert_eq!(again.report().unwrap().page_number, 2);
    }

    #[tokio::test]
    async fn test_caller_cancellation_reaches_the_search() {
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let search = CatalogSearch::new(detail, SearchConfig::default().with_deadline(5.0));
        let source = catalog();
        let cancel = CancellationToken::new();
        cancel.cancel("shutdown");

        let err = search.run("notepad.exe", &source, &cancel).await.unwrap_err();

        assert!(matches!(err, SearchError::Locator(LocatorError::Cancelled(ref m)) if m.contains("shutdown")));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_deadline_is_a_config_error() {
        let mut detail = MockDetailFetcher::new();
        detail.expect_fetch_detail().never();
        let capture = Arc::new(Capture::default());
        let search = CatalogSearch::new(detail, SearchConfig::default().with_deadline(-1.0))
            .with_emitter(SearchEventEmitter::new().with_sink(capture.clone()));
        let source = catalog();

        let err = search
            .run("notepad.exe", &source, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Config(_)));
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(capture.0.lock()[0]["status"], "error");
    }
}

//! Exponential probe and bisection over listing pages.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::config::LocatorConfig;
use super::outcome::{
    FetchRecord, Hit, LocateResult, Located, MatchKind, NotFoundReason, Observation, Phase,
};
use super::source::PageSource;
use crate::cancellation::CancellationToken;
use crate::catalog::{fold_label, PageInfo, RangePosition};
use crate::errors::LocatorError;

/// Bounds carried from the probe into bisection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchState {
    /// Lower bisection bound (a page sorting at or before the target).
    pub low_page: u32,
    /// Upper bisection bound (a page sorting at or after the target, or missing).
    pub high_page: u32,
    /// Highest probed page that exists and sorts before the target.
    pub last_valid_page: u32,
    /// Exponent of the most recent probe.
    pub probe_exponent: u32,
}

impl SearchState {
    fn new() -> Self {
        Self {
            low_page: 1,
            high_page: 1,
            last_valid_page: 1,
            probe_exponent: 0,
        }
    }
}

/// What to do after looking at one page.
enum Step {
    Exact(Hit),
    /// The page's range holds the target; refine on this page.
    Candidate(PageInfo),
    Before,
    After,
    Missing,
}

/// Finds the page and entry for `target` in the catalog behind `source`.
///
/// Page 1 is fetched first; an exact match there, or a target sorting before
/// it, ends the search after one fetch. Otherwise pages `2^e` are probed for
/// `e = 1..=config.max_page_exponent` until one is missing or sorts after the
/// target, and the resulting window is bisected. A page whose range contains
/// the target is refined into an exact or containing entry.
///
/// Recoverable fetch failures count as missing pages and are listed in
/// [`LocateResult::uncertain_pages`]; inside the bisection window a failed
/// fetch is first retried `config.window_retries` times. Fatal failures and
/// cancellation abort with an error. `cancel` is checked before every fetch.
pub async fn locate<S>(
    target: &str,
    source: &S,
    config: &LocatorConfig,
    cancel: &CancellationToken,
) -> Result<LocateResult, LocatorError>
where
    S: PageSource + ?Sized,
{
    let folded = fold_label(target);
    if folded.is_empty() {
        return Err(LocatorError::invalid_target("target label must not be blank"));
    }

    let mut run = Run::new(folded, source, config, cancel);
    let located = run.search().await?;

    match located {
        Located::Found(ref hit) => info!(
            query = %run.target,
            page = hit.page_number,
            label = %hit.entry.label,
            match_kind = ?hit.match_kind,
            pages_fetched = run.pages_fetched,
            "Catalog entry located"
        ),
        Located::NotFound { reason } => info!(
            query = %run.target,
            reason = %reason,
            pages_fetched = run.pages_fetched,
            uncertain = !run.uncertain_pages.is_empty(),
            "Catalog entry not found"
        ),
    }

    Ok(LocateResult {
        located,
        pages_fetched: run.pages_fetched,
        uncertain_pages: run.uncertain_pages,
        trail: run.trail,
    })
}

struct Run<'a, S: ?Sized> {
    target: String,
    source: &'a S,
    config: &'a LocatorConfig,
    cancel: &'a CancellationToken,
    /// Successful fetches of this search, by page number.
    pages: HashMap<u32, PageInfo>,
    pages_fetched: usize,
    uncertain_pages: Vec<u32>,
    trail: Vec<FetchRecord>,
}

impl<'a, S> Run<'a, S>
where
    S: PageSource + ?Sized,
{
    fn new(
        target: String,
        source: &'a S,
        config: &'a LocatorConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            target,
            source,
            config,
            cancel,
            pages: HashMap::new(),
            pages_fetched: 0,
            uncertain_pages: Vec::new(),
            trail: Vec::new(),
        }
    }

    async fn search(&mut self) -> Result<Located, LocatorError> {
        // Anchor
        match self.visit(1, Phase::Anchor).await? {
            Step::Exact(hit) => return Ok(Located::Found(hit)),
            Step::Candidate(page) => return self.refine(page).await,
            Step::Missing => return Ok(not_found(NotFoundReason::EmptyCatalog)),
            Step::Before => return Ok(not_found(NotFoundReason::BeforeStart)),
            Step::After => {}
        }

        // Exponential probe
        let mut state = SearchState::new();
        let mut bracketed = false;
        let max_exponent = self.config.max_page_exponent.min(super::config::MAX_PAGE_EXPONENT_LIMIT);
        for exponent in 1..=max_exponent {
            state.probe_exponent = exponent;
            let page_number = 1u32 << exponent;
            match self.visit(page_number, Phase::Probe).await? {
                Step::Exact(hit) => return Ok(Located::Found(hit)),
                Step::Candidate(page) => return self.refine(page).await,
                Step::Missing | Step::Before => {
                    state.low_page = state.last_valid_page;
                    state.high_page = page_number;
                    bracketed = true;
                    break;
                }
                Step::After => state.last_valid_page = page_number,
            }
        }

        if !bracketed {
            return Ok(not_found(NotFoundReason::ExponentLimit));
        }

        debug!(
            query = %self.target,
            low = state.low_page,
            high = state.high_page,
            "Bisecting bracketed window"
        );

        // Bisection
        while state.low_page <= state.high_page {
            let mid = state.low_page + (state.high_page - state.low_page) / 2;
            match self.visit(mid, Phase::Bisect).await? {
                Step::Exact(hit) => return Ok(Located::Found(hit)),
                Step::Candidate(page) => return self.refine(page).await,
                Step::Missing | Step::Before => state.high_page = mid - 1,
                Step::After => state.low_page = mid + 1,
            }
        }

        Ok(not_found(NotFoundReason::RangeExhausted))
    }

    /// Fetches (or reuses) a page and classifies it against the target.
    async fn visit(&mut self, page_number: u32, phase: Phase) -> Result<Step, LocatorError> {
        let seen = self.pages.get(&page_number).cloned();
        let (page, cached) = match seen {
            Some(page) => (Some(page), true),
            None => (self.fetch(page_number, phase).await?, false),
        };

        let Some(page) = page else {
            self.record(page_number, phase, Observation::Failed, false);
            return Ok(Step::Missing);
        };

        let Some(range) = page.range() else {
            debug!(page = page_number, %phase, "Page does not exist");
            self.record(page_number, phase, Observation::Missing, cached);
            return Ok(Step::Missing);
        };

        debug!(page = page_number, %phase, %range, "Page range");

        if let Some(entry) = page.find_exact(&self.target) {
            let hit = Hit {
                page_number,
                entry: entry.clone(),
                match_kind: MatchKind::Exact,
            };
            self.record(page_number, phase, Observation::Exact, cached);
            return Ok(Step::Exact(hit));
        }

        let (observation, step) = match range.position_of(&self.target) {
            RangePosition::Before => (Observation::Before, Step::Before),
            RangePosition::After => (Observation::After, Step::After),
            RangePosition::Within => (Observation::Within, Step::Candidate(page)),
        };
        self.record(page_number, phase, observation, cached);
        Ok(step)
    }

    /// Fetches a page from the source.
    ///
    /// Returns `Ok(None)` when a recoverable failure persisted; the page is
    /// then marked uncertain and treated as missing.
    async fn fetch(
        &mut self,
        page_number: u32,
        phase: Phase,
    ) -> Result<Option<PageInfo>, LocatorError> {
        let attempts = match phase {
            Phase::Bisect => self.config.window_attempts(),
            _ => 1,
        };

        for attempt in 1..=attempts {
            self.cancel
                .checkpoint(&format!("{phase} fetch of page {page_number}"))?;
            self.pages_fetched += 1;

            match self.source.fetch_page(page_number).await {
                Ok(mut page) => {
                    page.page_number = page_number;
                    if self.config.check_sorted && !page.is_sorted() {
                        warn!(
                            page = page_number,
                            "Listing page is not in ascending order; search results may be wrong"
                        );
                    }
                    self.pages.insert(page_number, page.clone());
                    return Ok(Some(page));
                }
                Err(err) if err.is_fatal() => {
                    return Err(LocatorError::Source {
                        page: page_number,
                        source: err,
                    });
                }
                Err(err) if attempt < attempts => {
                    debug!(
                        page = page_number,
                        %phase,
                        attempt,
                        error = %err,
                        "Retrying page fetch inside bisection window"
                    );
                }
                Err(err) => {
                    warn!(
                        page = page_number,
                        %phase,
                        error = %err,
                        "Page fetch failed; treating page as missing"
                    );
                }
            }
        }

        if !self.uncertain_pages.contains(&page_number) {
            self.uncertain_pages.push(page_number);
        }
        Ok(None)
    }

    /// Selects the entry on a candidate page: exact label first, then a
    /// label containing the target.
    async fn refine(&mut self, candidate: PageInfo) -> Result<Located, LocatorError> {
        let page_number = candidate.page_number;
        let page = if self.config.refetch_candidate {
            match self.fetch(page_number, Phase::Refine).await? {
                Some(page) => {
                    let observation = if page.find_exact(&self.target).is_some() {
                        Observation::Exact
                    } else {
                        Observation::Within
                    };
                    self.record(page_number, Phase::Refine, observation, false);
                    page
                }
                None => {
                    self.record(page_number, Phase::Refine, Observation::Failed, false);
                    return Ok(not_found(NotFoundReason::NoMatchOnCandidatePage));
                }
            }
        } else {
            candidate
        };

        let selected = page
            .find_exact(&self.target)
            .map(|entry| (entry, MatchKind::Exact))
            .or_else(|| {
                page.find_containing(&self.target)
                    .map(|entry| (entry, MatchKind::Contains))
            });

        let Some((entry, match_kind)) = selected else {
            debug!(page = page_number, query = %self.target, "Candidate page has no matching label");
            return Ok(not_found(NotFoundReason::NoMatchOnCandidatePage));
        };

        Ok(Located::Found(Hit {
            page_number,
            entry: entry.clone(),
            match_kind,
        }))
    }

    fn record(&mut self, page_number: u32, phase: Phase, observation: Observation, cached: bool) {
        self.trail.push(FetchRecord {
            page_number,
            phase,
            observation,
            cached,
        });
    }
}

fn not_found(reason: NotFoundReason) -> Located {
    Located::NotFound { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticCatalog;

    fn catalog() -> SyntheticCatalog {
        SyntheticCatalog::from_pages(&[
            &["alpha", "bravo"],
            &["bravo", "charlie"],
            &["charlie", "delta"],
            &["delta", "echo"],
        ])
    }

    #[tokio::test]
    async fn test_blank_target_rejected_before_fetch() {
        let source = catalog();
        let err = locate("   ", &source, &LocatorConfig::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidTarget(_)));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_fetch() {
        let source = catalog();
        let cancel = CancellationToken::new();
        cancel.cancel("shutdown");
        let err = locate("delta", &source, &LocatorConfig::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::Cancelled(_)));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_range_match_without_label_is_no_match() {
        let source = SyntheticCatalog::from_pages(&[&["alpha", "bravo"], &["delta", "foxtrot"]]);
        let result = locate("echo", &source, &LocatorConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            result.not_found_reason(),
            Some(NotFoundReason::NoMatchOnCandidatePage)
        );
    }

    #[tokio::test]
    async fn test_contains_match_on_candidate_page() {
        let source = SyntheticCatalog::from_pages(&[
            &["alpha.exe", "bravo.exe"],
            &["echo.exe", "echo64.exe", "golf.exe"],
        ]);
        let result = locate("echo6", &source, &LocatorConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        let hit = result.hit().unwrap();
        assert_eq!(hit.page_number, 2);
        assert_eq!(hit.entry.label, "echo64.exe");
        assert_eq!(hit.match_kind, MatchKind::Contains);
    }

    #[tokio::test]
    async fn test_refetch_candidate_issues_extra_fetch() {
        let source = SyntheticCatalog::from_pages(&[
            &["alpha", "bravo"],
            &["charlie", "delta2"],
        ]);
        let config = LocatorConfig::default().with_refetch_candidate();
        let result = locate("delta", &source, &config, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.hit().unwrap().entry.label, "delta2");
        assert_eq!(source.fetches_of(2), 2);
        let last = result.trail.last().unwrap();
        assert_eq!(last.page_number, 2);
        assert_eq!(last.phase, Phase::Refine);
        assert_eq!(last.observation, Observation::Within);
        assert!(!last.cached);
        assert_eq!(result.trail.len(), 3);
    }

}

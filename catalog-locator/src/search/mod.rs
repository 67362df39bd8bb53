//! End-to-end catalog search.
//!
//! [`CatalogSearch`] ties the locator, the detail fetcher and the extractor
//! together and reports one tagged outcome per target.

mod config;
mod orchestrator;
mod report;

pub use config::SearchConfig;
#[cfg(feature = "http")]
pub use orchestrator::search_catalog;
pub use orchestrator::CatalogSearch;
pub use report::{ExtractionMethod, NotFoundReport, SearchOutcome, SearchReport};

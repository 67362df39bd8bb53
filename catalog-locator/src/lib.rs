//! # Catalog Locator
//!
//! Finds a named record in a remote catalog that is only reachable as an
//! alphabetically sorted, paginated listing of unknown length, then extracts
//! a structured record from the detail page the match links to.
//!
//! - **Locator**: exponential probe over pages `1, 2, 4, 8, …` followed by
//!   bisection of the bracketed window, so page `p` is found in `O(log p)`
//!   fetches
//! - **Extractor**: maps detail table columns to record fields by header
//!   keywords, with a regex fallback for pages without a table
//! - **Collaborators**: listing pages come from a [`PageSource`](locator::PageSource)
//!   and detail pages from a [`DetailFetcher`](source::DetailFetcher); the
//!   `http` feature provides `reqwest` implementations of both
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_locator::prelude::*;
//!
//! let config = SearchConfig::load("catalog.json")?;
//! let outcome = search_catalog("notepad.exe", config, &CancellationToken::new()).await?;
//!
//! match outcome {
//!     SearchOutcome::Found(report) => println!("{:?}", report.records),
//!     SearchOutcome::NotFound(report) => println!("not found: {}", report.reason),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod catalog;
pub mod errors;
pub mod extractor;
pub mod locator;
pub mod observability;
pub mod search;
pub mod source;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::catalog::{Entry, EntryFilter, PageInfo};
    pub use crate::errors::{ConfigError, LocatorError, SearchError, SourceError};
    pub use crate::extractor::{extract, extract_from_text, FieldSchema, Record, TableDocument};
    pub use crate::locator::{
        locate, FnPageSource, LocateResult, LocatorConfig, MatchKind, NotFoundReason, PageSource,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    #[cfg(feature = "http")]
    pub use crate::search::search_catalog;
    pub use crate::search::{CatalogSearch, SearchConfig, SearchOutcome, SearchReport};
    #[cfg(feature = "http")]
    pub use crate::source::HttpCatalogSource;
    pub use crate::source::{CatalogConfig, DetailFetcher, DetailPage, FetchConfig};
}

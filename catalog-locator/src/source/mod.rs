//! Collaborators that talk to a live catalog.
//!
//! [`DetailFetcher`] is the second seam of a search next to
//! [`PageSource`](crate::locator::PageSource). With the `http` feature,
//! [`HttpCatalogSource`] implements both with `reqwest`.

mod config;
mod detail;
#[cfg(feature = "http")]
mod http;

pub use config::{CatalogConfig, FetchConfig, RetryConfig, SectionCase};
#[cfg(test)]
pub use detail::MockDetailFetcher;
pub use detail::{DetailFetcher, DetailPage};
#[cfg(feature = "http")]
pub use http::HttpCatalogSource;

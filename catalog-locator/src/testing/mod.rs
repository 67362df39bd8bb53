//! Testing utilities for catalog searches.
//!
//! This module provides:
//! - An in-memory, fetch-counting page source
//! - Detail page fixtures
//! - Assertions for locate results

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_located_on, assert_not_found, assert_within_fetch_budget};
pub use fixtures::{detail_page_html, listing_page_html, DETAIL_WITHOUT_TABLE};
pub use mocks::SyntheticCatalog;

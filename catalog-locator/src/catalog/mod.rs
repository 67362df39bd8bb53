//! Catalog listing model.
//!
//! This module provides:
//! - The entry and page models the locator searches over
//! - Case-insensitive label ordering and range containment
//! - Entry qualification rules
//! - HTML listing parsing

mod filter;
mod listing;
mod models;

pub use filter::EntryFilter;
pub use listing::parse_listing;
pub use models::{fold_label, Entry, PageInfo, PageRange, RangePosition};

//! Assertions for locate results.

use crate::locator::{LocateResult, NotFoundReason};

/// Asserts the result located `label` (ignoring case) on `page_number`.
///
/// # Panics
///
/// Panics if the result is not found or located elsewhere.
pub fn assert_located_on(result: &LocateResult, page_number: u32, label: &str) {
    let Some(hit) = result.hit() else {
        panic!(
            "Expected '{label}' on page {page_number}, got not found ({:?})",
            result.not_found_reason()
        );
    };
    assert_eq!(
        hit.page_number, page_number,
        "Expected '{label}' on page {page_number}, found on page {}",
        hit.page_number
    );
    assert!(
        hit.entry.label.eq_ignore_ascii_case(label),
        "Expected label '{label}', got '{}'",
        hit.entry.label
    );
}

/// Asserts the result is not found for `reason`.
///
/// # Panics
///
/// Panics if the result was found or ended for another reason.
pub fn assert_not_found(result: &LocateResult, reason: NotFoundReason) {
    assert_eq!(
        result.not_found_reason(),
        Some(reason),
        "Expected not found ({reason}), got {:?}",
        result.located
    );
}

/// Asserts the search issued at most `budget` fetches.
///
/// # Panics
///
/// Panics if more fetches were issued.
pub fn assert_within_fetch_budget(result: &LocateResult, budget: usize) {
    assert!(
        result.pages_fetched <= budget,
        "Expected at most {budget} fetches, used {} (trail: {:?})",
        result.pages_fetched,
        result.trail
    );
}

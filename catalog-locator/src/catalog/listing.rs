//! HTML listing parsing.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::filter::EntryFilter;
use super::models::{Entry, PageInfo};

// Constant selector; parse cannot fail.
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Parses a listing page into its qualifying entries.
///
/// Every anchor with an `href` is considered, in document order. Labels are
/// the anchor's trimmed text; links are resolved against `page_url` when it
/// is given and parses as an absolute URL. Anchors rejected by `filter` are
/// dropped, so a page without qualifying anchors comes back as missing.
#[must_use]
pub fn parse_listing(
    html: &str,
    page_number: u32,
    page_url: Option<&str>,
    filter: &EntryFilter,
) -> PageInfo {
    let document = Html::parse_document(html);
    let base = page_url.and_then(|u| Url::parse(u).ok());

    let entries = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let label = anchor.text().collect::<String>().trim().to_string();
            if !filter.accepts(&label) {
                return None;
            }
            let href = anchor.value().attr("href")?;
            Some(Entry::new(label, resolve_link(base.as_ref(), href)))
        })
        .collect();

    PageInfo::new(page_number, entries)
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map_or_else(|| href.to_string(), |u| u.to_string())
}

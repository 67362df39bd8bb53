//! Locator results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::Entry;

/// Why a search ended without a match. These are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotFoundReason {
    /// Page 1 has no qualifying entries.
    EmptyCatalog,
    /// The target sorts before the first entry of page 1.
    BeforeStart,
    /// Bisection closed without a page containing the target.
    RangeExhausted,
    /// The candidate page holds neither an exact nor a containing label.
    NoMatchOnCandidatePage,
    /// The probe reached its exponent limit without bracketing the target.
    ExponentLimit,
}

impl NotFoundReason {
    /// Stable kebab-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyCatalog => "empty-catalog",
            Self::BeforeStart => "before-start",
            Self::RangeExhausted => "range-exhausted",
            Self::NoMatchOnCandidatePage => "no-match-on-candidate-page",
            Self::ExponentLimit => "exponent-limit",
        }
    }
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the selected entry's label relates to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Label equals the target, ignoring case.
    Exact,
    /// Label contains the target, ignoring case.
    Contains,
}

impl MatchKind {
    /// Stable snake-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }
}

/// A located entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    /// Page the entry is listed on.
    pub page_number: u32,
    /// The selected entry.
    pub entry: Entry,
    /// How the entry matched.
    pub match_kind: MatchKind,
}

/// Found or not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Located {
    /// The target was located.
    Found(Hit),
    /// The target was not located.
    NotFound {
        /// Why the search ended.
        reason: NotFoundReason,
    },
}

/// Search phase a fetch belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Page 1.
    Anchor,
    /// Exponential probe of page `2^e`.
    Probe,
    /// Bisection of the bracketed window.
    Bisect,
    /// Re-fetch of the candidate page.
    Refine,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Anchor => "anchor",
            Self::Probe => "probe",
            Self::Bisect => "bisect",
            Self::Refine => "refine",
        };
        f.write_str(name)
    }
}

/// What a fetched page told the locator about the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    /// The page has no qualifying entries.
    Missing,
    /// The fetch failed and the page was treated as missing.
    Failed,
    /// The page lists the target exactly.
    Exact,
    /// The target sorts before the page's first label.
    Before,
    /// The target falls inside the page's range.
    Within,
    /// The target sorts after the page's last label.
    After,
}

/// One page visit during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRecord {
    /// Page number visited.
    pub page_number: u32,
    /// Phase the visit belonged to.
    pub phase: Phase,
    /// What the page showed.
    pub observation: Observation,
    /// Whether the page came from an earlier fetch in the same search.
    #[serde(default)]
    pub cached: bool,
}

/// Result of one [`locate`](super::locate) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateResult {
    /// Found or not found.
    pub located: Located,
    /// Number of page fetches issued to the source, retries included.
    pub pages_fetched: usize,
    /// Pages whose fetch failed and were treated as missing. Non-empty means
    /// a not-found result may be a false negative.
    #[serde(default)]
    pub uncertain_pages: Vec<u32>,
    /// Page visits in order.
    #[serde(default)]
    pub trail: Vec<FetchRecord>,
}

impl LocateResult {
    /// Whether the target was located.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self.located, Located::Found(_))
    }

    /// The hit, if found.
    #[must_use]
    pub fn hit(&self) -> Option<&Hit> {
        match self.located {
            Located::Found(ref hit) => Some(hit),
            Located::NotFound { .. } => None,
        }
    }

    /// The not-found reason, if not found.
    #[must_use]
    pub fn not_found_reason(&self) -> Option<NotFoundReason> {
        match self.located {
            Located::Found(_) => None,
            Located::NotFound { reason } => Some(reason),
        }
    }

    /// Whether any fetch failure was coerced into a missing page.
    #[must_use]
    pub fn is_uncertain(&self) -> bool {
        !self.uncertain_pages.is_empty()
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("found".to_string(), serde_json::json!(self.is_found()));
        match self.located {
            Located::Found(ref hit) => {
                dict.insert("page_number".to_string(), serde_json::json!(hit.page_number));
                dict.insert("entry".to_string(), serde_json::json!(hit.entry.to_dict()));
                dict.insert("match_kind".to_string(), serde_json::json!(hit.match_kind));
            }
            Located::NotFound { reason } => {
                dict.insert("reason".to_string(), serde_json::json!(reason.as_str()));
            }
        }
        dict.insert("pages_fetched".to_string(), serde_json::json!(self.pages_fetched));
        dict.insert("uncertain_pages".to_string(), serde_json::json!(self.uncertain_pages));
        dict
    }
}

//! Locating a label in an ordered, paginated catalog.
//!
//! The locator brackets the target with an exponential probe over page
//! numbers `2, 4, 8, …` and then bisects the bracket, so a record on page `p`
//! costs `O(log p)` fetches instead of `p`.
//!
//! Pages come from a [`PageSource`]; the locator itself performs no I/O.

mod config;
mod locate;
mod outcome;
mod source;


pub use config::LocatorConfig;
pub use locate::{locate, SearchState};
pub use outcome::{
    FetchRecord, Hit, LocateResult, Located, MatchKind, NotFoundReason, Observation, Phase,
};
pub use source::{FnPageSource, PageSource};

//! Cooperative cancellation for catalog searches.
//!
//! A search checks its token before every page fetch, so cancelling stops the
//! search at the next step boundary without interrupting a fetch in flight.

mod token;

pub use token::{CancellationToken, DeadlineTimer};

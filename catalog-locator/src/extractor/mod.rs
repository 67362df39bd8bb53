//! Schema-driven record extraction from detail pages.
//!
//! [`extract`] infers the meaning of a table's columns from its header row
//! using a [`FieldSchema`] and returns one [`Record`] per data row. Pages
//! without a recognisable table can fall back to [`extract_from_text`].

mod document;
mod extract;
mod record;
mod schema;

pub use document::{body_text, Cell, Row, Table, TableDocument};
pub use extract::{extract, extract_from_text};
pub use record::Record;
pub use schema::{FieldSchema, FieldSpec};

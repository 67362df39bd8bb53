//! Header-driven table extraction and the text-pattern fallback.

use tracing::{debug, warn};

use super::document::{Row, TableDocument};
use super::record::Record;
use super::schema::FieldSchema;

/// Column position of each schema field, by field index.
type ColumnMap = Vec<Option<usize>>;

/// Extracts records from the first table that has a header row.
///
/// A header row is the first row in which some cell names a schema field.
/// Each cell names at most one field (the earliest in schema order), and each
/// field takes the first cell that names it, so column order does not matter.
/// Every later row of that table is a data row; its data cells are read by
/// position, and rows without a primary field value are skipped. Tables after
/// the first with a header row are ignored.
///
/// Returns an empty vector when no table has a header row.
#[must_use]
pub fn extract(document: &TableDocument, schema: &FieldSchema) -> Vec<Record> {
    for (table_index, table) in document.tables.iter().enumerate() {
        let Some((header_index, columns)) = find_header(&table.rows, schema) else {
            continue;
        };

        debug!(
            table = table_index,
            header_row = header_index,
            mapped = columns.iter().filter(|c| c.is_some()).count(),
            "Header row found"
        );

        let records: Vec<Record> = table.rows[header_index + 1..]
            .iter()
            .filter_map(|row| read_row(row, &columns, schema))
            .collect();

        debug!(table = table_index, records = records.len(), "Table extracted");
        return records;
    }

    debug!(tables = document.tables.len(), "No header row in any table");
    Vec::new()
}

fn find_header(rows: &[Row], schema: &FieldSchema) -> Option<(usize, ColumnMap)> {
    rows.iter().enumerate().find_map(|(index, row)| {
        let columns = map_columns(row, schema);
        columns.iter().any(Option::is_some).then_some((index, columns))
    })
}

fn map_columns(header: &Row, schema: &FieldSchema) -> ColumnMap {
    let mut columns: ColumnMap = vec![None; schema.fields.len()];
    for (position, cell) in header.cells.iter().enumerate() {
        if let Some(field) = schema.field_for_header(&cell.text) {
            columns[field].get_or_insert(position);
        }
    }
    columns
}

fn read_row(row: &Row, columns: &ColumnMap, schema: &FieldSchema) -> Option<Record> {
    let cells: Vec<&str> = row.data_cells().map(|c| c.text.as_str()).collect();
    if cells.is_empty() {
        return None;
    }

    let mut record = Record::empty(schema);
    for (field, column) in schema.fields.iter().zip(columns) {
        if let Some(text) = column.and_then(|c| cells.get(c)) {
            record.set(field.name.as_str(), text);
        }
    }

    record.has(&schema.primary_field).then_some(record)
}

/// Extracts a single record from unstructured page text.
///
/// Each field with a text pattern takes its first match. A record is
/// returned only when the primary field matched. Patterns that do not
/// compile are skipped; [`FieldSchema::validate`] reports them up front.
#[must_use]
pub fn extract_from_text(text: &str, schema: &FieldSchema) -> Option<Record> {
    let patterns = match schema.compile_text_patterns() {
        Ok(patterns) => patterns,
        Err(err) => {
            warn!(error = %err, "Skipping text extraction with invalid pattern");
            return None;
        }
    };

    let mut record = Record::empty(schema);
    for (field, regex) in &patterns {
        let Some(captures) = regex.captures(text) else {
            continue;
        };
        let matched = captures.get(1).or_else(|| captures.get(0));
        if let Some(m) = matched {
            record.set(*field, m.as_str());
        }
    }

    if record.has(&schema.primary_field) {
        Some(record)
    } else {
        debug!(field = %schema.primary_field, "Primary field not found in page text");
        None
    }
}

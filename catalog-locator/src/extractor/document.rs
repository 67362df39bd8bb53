//! Structured view of a detail page: tables of rows of cells.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid table selector"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("valid cell selector"));
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("valid body selector"));

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell text with whitespace collapsed.
    pub text: String,
    /// Whether the cell is a header cell (`<th>`).
    pub header: bool,
}

impl Cell {
    /// Creates a data cell.
    #[must_use]
    pub fn data(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: false,
        }
    }

    /// Creates a header cell.
    #[must_use]
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: true,
        }
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

impl Row {
    /// A row of header cells.
    #[must_use]
    pub fn header(texts: &[&str]) -> Self {
        Self {
            cells: texts.iter().map(|t| Cell::header(*t)).collect(),
        }
    }

    /// A row of data cells.
    #[must_use]
    pub fn data(texts: &[&str]) -> Self {
        Self {
            cells: texts.iter().map(|t| Cell::data(*t)).collect(),
        }
    }

    /// The row's data cells, in order.
    pub fn data_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.header)
    }
}

/// One table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Rows in document order.
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table from rows.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// The tables of a detail page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableDocument {
    /// Tables in document order.
    pub tables: Vec<Table>,
}

impl TableDocument {
    /// Creates a document from tables.
    #[must_use]
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Reads every `<table>` of an HTML page.
    ///
    /// Rows of a nested table are read both as part of the nested table and
    /// of its enclosing one.
    #[must_use]
    pub fn parse_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let tables = document
            .select(&TABLE_SELECTOR)
            .map(|table| Table {
                rows: table.select(&ROW_SELECTOR).map(parse_row).collect(),
            })
            .collect();
        Self { tables }
    }

    /// Whether the document has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn parse_row(row: ElementRef<'_>) -> Row {
    Row {
        cells: row
            .select(&CELL_SELECTOR)
            .map(|cell| Cell {
                text: collapse_whitespace(&cell.text().collect::<String>()),
                header: cell.value().name() == "th",
            })
            .collect(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an HTML page's body, one trimmed text node per line.
#[must_use]
pub fn body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let lines: Vec<&str> = match document.select(&BODY_SELECTOR).next() {
        Some(body) => body.text().map(str::trim).filter(|t| !t.is_empty()).collect(),
        None => document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect(),
    };
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail_page_html, DETAIL_WITHOUT_TABLE};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_html_reads_tables_in_order() {
        let html = detail_page_html(
            &["Path", "Product"],
            &[&["C:\\a.exe", "A"], &["C:\\b.exe", "B"]],
        );
        let doc = TableDocument::parse_html(&html);

        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows, vec![Row::data(&["Menu", "Search"])]);

        let files = &doc.tables[1];
        assert_eq!(files.rows.len(), 4);
        assert_eq!(files.rows[1], Row::header(&["Path", "Product"]));
        assert_eq!(files.rows[3], Row::data(&["C:\\b.exe", "B"]));
    }

    #[test]
    fn test_cell_whitespace_is_collapsed() {
        let html = "<table><tr><td>\n  Program   Files\n</td></tr></table>";
        let doc = TableDocument::parse_html(html);
        assert_eq!(doc.tables[0].rows[0].cells[0].text, "Program Files");
    }

    #[test]
    fn test_no_tables() {
        assert!(TableDocument::parse_html(DETAIL_WITHOUT_TABLE).is_empty());
    }

    #[test]
    fn test_body_text_keeps_paragraphs_on_separate_lines() {
        let text = body_text(DETAIL_WITHOUT_TABLE);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "notepad.exe");
        assert_eq!(lines[2], "Product Name: Microsoft Windows Operating System");
        assert_eq!(lines[3], "Company: Microsoft Corporation");
    }

    #[test]
    fn test_data_cells_skip_headers() {
        let row = Row {
            cells: vec![Cell::header("1"), Cell::data("C:\\x.exe")],
        };
        let texts: Vec<&str> = row.data_cells().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["C:\\x.exe"]);
    }
}

//! HTML fixtures shaped like catalog listing and detail pages.

/// A detail page with no data table, only labelled prose.
pub const DETAIL_WITHOUT_TABLE: &str = r#"<html><body>
<h1>notepad.exe</h1>
<p>The file is usually located in C:\Windows\System32\notepad.exe on most systems.</p>
<p>Product Name: Microsoft Windows Operating System</p>
<p>Company: Microsoft Corporation</p>
</body></html>"#;

/// Builds a listing page whose anchors carry `labels`, wrapped in
/// navigation links that the default entry filter rejects.
#[must_use]
pub fn listing_page_html(labels: &[&str]) -> String {
    let items: String = labels
        .iter()
        .map(|label| format!("<tr><td><a href=\"/file.php?f={label}\">{label}</a></td></tr>"))
        .collect();
    format!(
        "<html><body><nav><a href=\"/\">Home</a></nav><table>{items}</table>\
         <a href=\"/file.php?page=2\">Next</a></body></html>"
    )
}

/// Builds a detail page with a layout table followed by a data table whose
/// header row is `headers` and whose data rows are `rows`.
#[must_use]
pub fn detail_page_html(headers: &[&str], rows: &[&[&str]]) -> String {
    let header_cells: String = headers.iter().map(|h| format!("<th>{h}</th>")).collect();
    let data_rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|c| format!("<td>{c}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(
        "<html><body>\
         <table class=\"layout\"><tr><td>Menu</td><td>Search</td></tr></table>\
         <table class=\"files\"><tr><td colspan=\"3\">Known locations</td></tr>\
         <tr>{header_cells}</tr>{data_rows}</table>\
         </body></html>"
    )
}

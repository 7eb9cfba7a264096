//! Delimited-text parsing for sheet exports.
//!
//! Both the mon sheet and the per-mon move sheets arrive as CSV exports. The
//! reader is configured flexibly: rows may have differing lengths, and there
//! is no header handling inside the reader. Callers decide what row 0 means.

use csv::ReaderBuilder;
use tracing::warn;

use crate::models::GroupedListing;

/// Default field delimiter for sheet exports.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Identity of a parse configuration, e.g. `roster:0.1.0:44`.
///
/// Changes with the crate version and the delimiter, so cached snapshots
/// parsed under an older configuration are parsed again.
pub fn parser_id(kind: &str, delimiter: u8) -> String {
    format!("{}:{}:{}", kind, env!("CARGO_PKG_VERSION"), delimiter)
}

/// Parse delimited text into rows of fields.
///
/// Quoted fields may contain delimiters and newlines. Records the reader
/// cannot decode are logged and skipped.
pub fn parse_rows(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => warn!(row = row_idx, error = %e, "Skipping unreadable row"),
        }
    }
    rows
}

/// Parse a header-keyed sheet into a grouped listing.
///
/// Row 0 holds the category labels. Every later row contributes its non-blank
/// cells to the category above them. Blank header columns are ignored and
/// categories that collect nothing are left out.
pub fn parse_grouped(text: &str, delimiter: u8) -> GroupedListing {
    let rows = parse_rows(text, delimiter);
    let Some((headers, data)) = rows.split_first() else {
        return GroupedListing::default();
    };

    let mut listing = GroupedListing::default();
    for (col, header) in headers.iter().enumerate() {
        let label = header.trim();
        if label.is_empty() {
            continue;
        }
        let items = data
            .iter()
            .filter_map(|row| row.get(col))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(str::to_string);
        listing.extend(label, items);
    }
    listing
}

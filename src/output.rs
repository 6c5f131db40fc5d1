//! Rendering result rows: CSV files, terminal tables, JSON and plain text.

use comfy_table::{presets, Attribute, Cell, Table};
use std::path::Path;

use crate::models::ResultRow;
use crate::ui::truncate_with_ellipsis;

/// Errors that can occur while writing output
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write rows to `path` as CSV with the fixed header
///
/// The header is written even when there are no rows. The file is flushed
/// and closed before returning.
pub fn write_csv(rows: &[ResultRow], path: &Path) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(ResultRow::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Read rows back from a CSV file written by [`write_csv`]
pub fn read_csv(path: &Path) -> Result<Vec<ResultRow>, OutputError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
    Ok(rows)
}

/// Pretty-printed JSON array of rows, keyed by the column headers
pub fn render_json(rows: &[ResultRow]) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// One block per paper, one `Header: value` line per column
pub fn render_plain(rows: &[ResultRow]) -> String {
    let mut out = String::new();
    for row in rows {
        for (header, value) in ResultRow::HEADERS.iter().zip(row.values()) {
            out.push_str(header);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Terminal table; long titles and lists are truncated to `max_cell_width`
pub fn render_table(rows: &[ResultRow], max_cell_width: usize) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_header(ResultRow::HEADERS.to_vec());

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.pubmed_id),
            Cell::new(truncate_with_ellipsis(&row.title, max_cell_width))
                .add_attribute(Attribute::Bold),
            Cell::new(&row.publication_date),
            Cell::new(truncate_with_ellipsis(&row.non_academic_authors, max_cell_width)),
            Cell::new(truncate_with_ellipsis(&row.company_affiliations, max_cell_width)),
            Cell::new(&row.corresponding_author_email),
        ]);
    }

    table.to_string()
}

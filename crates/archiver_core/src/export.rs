use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use crate::ExportView;

/// URL, Title, Selection, Folder, Timestamp.
pub const EXPORT_COLUMNS: usize = 5;
const HEADER_MARKER: &str = "URL";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to open export file {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("malformed export csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("export line {line}: expected at least 5 columns, found {found}")]
    ShortRow { line: u64, found: usize },
}

/// Read the export file at `path`.
pub fn read_export_file(path: &Path) -> Result<Vec<ExportView>, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_export(file)
}

/// Parse export rows. Header rows (first column literally `URL`) are skipped
/// wherever they occur; any row with fewer than five columns aborts the read.
pub fn read_export<R: Read>(reader: R) -> Result<Vec<ExportView>, ExportError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut views = Vec::new();
    for row in csv.records() {
        let row = row?;
        if row.get(0) == Some(HEADER_MARKER) {
            continue;
        }
        views.push(view_from_row(&row)?);
    }
    Ok(views)
}

fn view_from_row(row: &StringRecord) -> Result<ExportView, ExportError> {
    if row.len() < EXPORT_COLUMNS {
        return Err(ExportError::ShortRow {
            line: row.position().map(|p| p.line()).unwrap_or_default(),
            found: row.len(),
        });
    }
    let column = |idx: usize| row.get(idx).unwrap_or_default();
    Ok(ExportView::new(
        column(0),
        column(1),
        column(2),
        column(3),
        column(4),
    ))
}

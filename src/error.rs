use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by loading, reading and exporting survey tables.
///
/// Malformed cell data never produces an error: a value that fails numeric
/// parsing is simply counted as non-numeric.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// Fewer than two non-blank rows (nothing beyond a possible header).
    #[error("the table looks empty or only contains headers ({usable_rows} usable row(s))")]
    EmptyInput { usable_rows: usize },

    /// A header row was found but no data row survived below it.
    #[error("no data found below the header row (row {})", .header_row + 1)]
    NoDataRows { header_row: usize },

    #[error("unknown column: {0:?}")]
    UnknownColumn(String),

    #[error("unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

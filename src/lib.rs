#![forbid(unsafe_code)]
//! # Survey Insight
//!
//! Turns a loosely typed survey export (rows of free-form spreadsheet cells)
//! into an analyzable dataset without a schema:
//!
//! - [`loader`] finds the real header row and builds uniquely named records.
//! - [`profile`] classifies each column as numeric, categorical, multi-select or free text.
//! - [`questions`] separates survey questions from administrative columns.
//! - [`grouping`] merges near-duplicate answers (case, spacing, small typos).
//! - [`aggregate`] builds frequency tables, numeric histograms and cross-tabulations.
//!
//! The analytical modules are pure functions over in-memory data. File
//! reading ([`input`], [`office`]) and export ([`export`]) sit around them,
//! and [`report`] ties everything together.
//!
//! ## Example
//! ```
//! use survey_insight::{CellValue, analyze_column, load_rows, profile_dataset};
//! use survey_insight::aggregate::AnalysisResult;
//!
//! let rows: Vec<Vec<CellValue>> = [["1. Sesso", "2. Età"], ["M", "25"], ["F", "30"], ["M", "25"]]
//!     .iter()
//!     .map(|r| r.iter().map(|c| CellValue::from_field(c)).collect())
//!     .collect();
//! let dataset = load_rows(rows).unwrap();
//! let profile = profile_dataset(&dataset);
//! let analysis = analyze_column(&dataset, &profile, "1. Sesso", None).unwrap();
//! if let AnalysisResult::Frequency(table) = analysis.result {
//!     assert_eq!(table.labels(), vec!["M", "F"]);
//!     assert_eq!(table.rows[0].percent, 66.7);
//! }
//! ```

pub mod aggregate;
pub mod cell;
pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod input;
pub mod loader;
mod office;
pub mod profile;
pub mod questions;
pub mod report;

pub use aggregate::{
    AnalysisResult, ChartKind, ColumnAnalysis, CrossTabulation, FrequencyTable, analyze_column,
    cross_tabulate, frequency_table,
};
pub use cell::CellValue;
pub use config::DashboardConfig;
pub use error::SurveyError;
pub use export::{ExportFormat, csv_safe_cell, render_text, write_report};
pub use grouping::{AnswerGrouper, group_answers, normalize_answer, similarity};
pub use input::{collect_files, read_rows};
pub use loader::{Dataset, Record, load_rows};
pub use office::extract_rows_from_xlsx;
pub use profile::{
    ColumnKind, ColumnProfile, DatasetProfile, DatasetSummary, cross_candidates, profile_dataset,
};
pub use questions::{filter_questions, search_questions, truncate_questions};
pub use report::{AnalysisOptions, AnalysisOutcome, SurveyReport, analyze_path, analyze_rows};

/// Prints files that could not be analyzed, one per line, on stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("Failed to analyze {} file(s):", failed.len());
    for (file, reason) in failed {
        eprintln!("  {file}: {reason}");
    }
}

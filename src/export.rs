//! Report rendering and file export.

use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use csv::WriterBuilder;

use crate::aggregate::{AnalysisResult, ColumnAnalysis, CrossTabulation, FrequencyTable};
use crate::cell::parse_finite;
use crate::error::SurveyError;
use crate::report::SurveyReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

/// Neutralizes spreadsheet formula injection by prefixing a single quote to
/// cells starting with `=`, `+`, `-` or `@`. Plain numbers and cells that
/// already start with a quote are left alone.
pub fn csv_safe_cell(s: String) -> String {
    let risky = s.starts_with(['=', '+', '-', '@', '\t', '\r']);
    if risky && parse_finite(s.trim()).is_none() {
        format!("'{s}")
    } else {
        s
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Creates `<stem>_<ts>_<suffix>.<ext>`, or the first free `_<n>` variant
/// when that name is taken. Creation is atomic, so concurrent runs sharing a
/// stem never overwrite each other.
fn create_output(
    out_dir: &Path,
    stem: &str,
    ts: &str,
    suffix: &str,
    ext: &str,
) -> Result<(PathBuf, File), SurveyError> {
    let mut n = 1usize;
    loop {
        let name = if n == 1 {
            format!("{stem}_{ts}_{suffix}.{ext}")
        } else {
            format!("{stem}_{ts}_{suffix}_{n}.{ext}")
        };
        let path = out_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Human-readable report, as printed on stdout.
pub fn render_text(report: &SurveyReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let _ = writeln!(out, "=== {} ===", report.source);
    let _ = writeln!(
        out,
        "Rows: {} | Questions: {} | Completion: {:.1}% | Header row: {}",
        s.total_rows,
        s.question_columns,
        s.completion_percent,
        report.header_row + 1
    );

    let _ = writeln!(out, "\nColumns:");
    for c in &report.columns {
        let _ = writeln!(
            out,
            "  {}{} [{}] {} filled, {} unique",
            if c.question { "* " } else { "  " },
            c.name,
            c.kind.as_str(),
            c.filled,
            c.unique_count
        );
    }
    if !report.cross_candidates.is_empty() {
        let _ = writeln!(out, "\nCross-tab candidates: {}", report.cross_candidates.join(", "));
    }

    for analysis in &report.analyses {
        let _ = writeln!(out);
        render_analysis(&mut out, analysis);
    }
    out
}

fn render_analysis(out: &mut String, analysis: &ColumnAnalysis) {
    match &analysis.result {
        AnalysisResult::Frequency(freq) => {
            let _ = writeln!(
                out,
                "--- {} ({}) ---",
                analysis.column, analysis.kind_label
            );
            render_frequencies(out, freq);
        }
        AnalysisResult::CrossTab(ct) => {
            let _ = writeln!(out, "--- {} x {} ---", ct.primary, ct.secondary);
            render_crosstab(out, ct);
        }
    }
}

fn render_frequencies(out: &mut String, freq: &FrequencyTable) {
    let width = freq.rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    for row in &freq.rows {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>6}  {:>5.1}%",
            row.label, row.count, row.percent
        );
    }
    let _ = writeln!(out, "  {:<width$}  {:>6}", "Total", freq.total);
}

fn render_crosstab(out: &mut String, ct: &CrossTabulation) {
    let width = ct
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .chain(std::iter::once(ct.primary.chars().count().min(30)))
        .max()
        .unwrap_or(0);
    let mut header = format!("  {:<width$}", "");
    for c in &ct.categories {
        let _ = write!(header, "  {c:>8}");
    }
    let _ = writeln!(out, "{header}");
    for row in &ct.rows {
        let _ = write!(out, "  {:<width$}", row.label);
        for n in &row.counts {
            let _ = write!(out, "  {n:>8}");
        }
        let _ = writeln!(out);
    }
}

fn write_delimited(
    file: File,
    delimiter: u8,
    header: &[&str],
    rows: Vec<Vec<String>>,
) -> Result<(), SurveyError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(file);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row.into_iter().map(csv_safe_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

fn column_rows(report: &SurveyReport) -> Vec<Vec<String>> {
    report
        .columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.kind.as_str().to_string(),
                c.filled.to_string(),
                c.unique_count.to_string(),
                c.question.to_string(),
            ]
        })
        .collect()
}

fn frequency_rows(report: &SurveyReport) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for analysis in &report.analyses {
        if let AnalysisResult::Frequency(freq) = &analysis.result {
            for r in &freq.rows {
                rows.push(vec![
                    analysis.column.clone(),
                    r.label.clone(),
                    r.count.to_string(),
                    format!("{:.1}", r.percent),
                ]);
            }
        }
    }
    rows
}

fn crosstab_rows(report: &SurveyReport) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for analysis in &report.analyses {
        if let AnalysisResult::CrossTab(ct) = &analysis.result {
            for row in &ct.rows {
                for (category, n) in ct.categories.iter().zip(&row.counts) {
                    rows.push(vec![
                        ct.primary.clone(),
                        ct.secondary.clone(),
                        row.label.clone(),
                        category.clone(),
                        n.to_string(),
                    ]);
                }
            }
        }
    }
    rows
}

/// Writes the report in the requested format into `out_dir` and returns the
/// written paths. Files are named `<stem>_<YYYYMMDD>_<HHMMSS>_<part>.<ext>`.
pub fn write_report(
    report: &SurveyReport,
    format: ExportFormat,
    out_dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>, SurveyError> {
    fs::create_dir_all(out_dir)?;
    let ts = timestamp();
    let mut written = Vec::new();

    match format {
        ExportFormat::Txt => {
            let (path, mut file) = create_output(out_dir, stem, &ts, "report", "txt")?;
            file.write_all(render_text(report).as_bytes())?;
            written.push(path);
        }
        ExportFormat::Json => {
            let (path, mut file) = create_output(out_dir, stem, &ts, "analysis", "json")?;
            file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;
            written.push(path);
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            let (delimiter, ext) = if format == ExportFormat::Csv {
                (b',', "csv")
            } else {
                (b'\t', "tsv")
            };

            let (path, file) = create_output(out_dir, stem, &ts, "columns", ext)?;
            write_delimited(
                file,
                delimiter,
                &["column", "type", "filled", "unique", "question"],
                column_rows(report),
            )?;
            written.push(path);

            let freq = frequency_rows(report);
            if !freq.is_empty() {
                let (path, file) = create_output(out_dir, stem, &ts, "frequencies", ext)?;
                write_delimited(file, delimiter, &["column", "value", "count", "percent"], freq)?;
                written.push(path);
            }

            let cross = crosstab_rows(report);
            if !cross.is_empty() {
                let (path, file) = create_output(out_dir, stem, &ts, "crosstab", ext)?;
                write_delimited(
                    file,
                    delimiter,
                    &["primary", "secondary", "primary_value", "secondary_value", "count"],
                    cross,
                )?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

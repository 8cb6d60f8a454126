//! End-to-end analysis of one survey file.

use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::aggregate::{ColumnAnalysis, analyze_column};
use crate::cell::CellValue;
use crate::config::DashboardConfig;
use crate::error::SurveyError;
use crate::export::{ExportFormat, render_text, write_report};
use crate::input::read_rows;
use crate::loader::load_rows;
use crate::profile::{ColumnKind, DatasetSummary, cross_candidates, profile_dataset, summarize};
use crate::questions::{filter_questions, truncate_questions};

/// What to analyze and where to put the results.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub config: DashboardConfig,
    /// Primary columns to analyze; empty means every surfaced question.
    pub columns: Vec<String>,
    /// Secondary column for cross-tabulation.
    pub cross: Option<String>,
    pub export_format: ExportFormat,
    pub out_dir: PathBuf,
    /// Root of a directory run; export names then carry the path below it.
    pub base_dir: Option<PathBuf>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            config: DashboardConfig::default(),
            columns: Vec::new(),
            cross: None,
            export_format: ExportFormat::Txt,
            out_dir: PathBuf::from("."),
            base_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOverview {
    pub name: String,
    pub kind: ColumnKind,
    pub filled: usize,
    pub unique_count: usize,
    /// Passed the question filter.
    pub question: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyReport {
    pub source: String,
    pub header_row: usize,
    pub summary: DatasetSummary,
    pub columns: Vec<ColumnOverview>,
    /// Surfaced questions, after the `maxQuestionsToShow` limit.
    pub questions: Vec<String>,
    pub cross_candidates: Vec<String>,
    pub analyses: Vec<ColumnAnalysis>,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: SurveyReport,
    /// Human-readable summary.
    pub result: String,
    pub written: Vec<PathBuf>,
}

/// Runs loader, profiler, question filter and aggregator over raw rows.
pub fn analyze_rows(
    source: &str,
    rows: Vec<Vec<CellValue>>,
    opts: &AnalysisOptions,
) -> Result<SurveyReport, SurveyError> {
    let dataset = load_rows(rows)?;
    let profile = profile_dataset(&dataset);

    let questions = filter_questions(&profile.names());
    let summary = summarize(&profile, &questions);
    let surfaced = truncate_questions(questions.clone(), opts.config.max_questions_to_show);
    let candidates = cross_candidates(&profile, &surfaced);
    debug!(
        "{source}: {} question(s), {} surfaced",
        questions.len(),
        surfaced.len()
    );

    let selected = if opts.columns.is_empty() {
        surfaced.clone()
    } else {
        opts.columns.clone()
    };
    let analyses = selected
        .iter()
        .map(|col| analyze_column(&dataset, &profile, col, opts.cross.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    let columns = profile
        .columns()
        .iter()
        .map(|c| ColumnOverview {
            name: c.name.clone(),
            kind: c.kind,
            filled: c.filled(),
            unique_count: c.unique_count,
            question: questions.contains(&c.name),
        })
        .collect();

    Ok(SurveyReport {
        source: source.to_string(),
        header_row: dataset.header_row(),
        summary,
        columns,
        questions: surfaced,
        cross_candidates: candidates,
        analyses,
    })
}

/// Reads, analyzes and exports one survey file.
pub fn analyze_path(path: &Path, opts: &AnalysisOptions) -> Result<AnalysisOutcome, SurveyError> {
    let rows = read_rows(path)?;
    let source = path.display().to_string();
    let report = analyze_rows(&source, rows, opts)?;

    let stem = export_stem(path, opts.base_dir.as_deref());
    let written = write_report(&report, opts.export_format, &opts.out_dir, &stem)?;
    info!("{source}: wrote {} file(s)", written.len());

    Ok(AnalysisOutcome {
        result: render_text(&report),
        report,
        written,
    })
}

/// File stem for exports: `a/survey.csv` below `base` becomes `a_survey`.
fn export_stem(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or_else(|| Path::new(path.file_name().unwrap_or_default()));
    let parts: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        "survey".to_string()
    } else {
        parts.join("_")
    }
}

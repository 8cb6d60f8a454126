#![forbid(unsafe_code)]
//! # Survey Insight CLI
//!
//! This is the command-line interface for the `survey_insight` crate.
//! It profiles `.csv`, `.tsv` and `.xlsx` survey exports and prints the
//! answer distributions of every detected question.
//!
//! ## Features
//! - Analyze a single file or every survey file under a directory.
//! - Cross-tabulate the selected questions against a secondary column.
//! - Limit the surfaced questions via `--max-questions` or a JSON config file.
//! - Export results as txt, csv, tsv or json.
//!
//! ## Example
//! ```bash
//! cargo run --release -- path/to/survey.xlsx --cross "1. Sesso" --export-format csv
//! ```
//!
//! See `--help` for all available options.

use clap::Parser;
use log::error;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use survey_insight::{
    AnalysisOptions, DashboardConfig, ExportFormat, analyze_path, collect_files,
    print_failed_files,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Survey file or directory to analyze
    path: String,

    /// Column to analyze (repeatable); defaults to every surfaced question
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Secondary column to cross-tabulate the selected columns against
    #[arg(long)]
    cross: Option<String>,

    /// Show only the first N questions (0 shows all)
    #[arg(long)]
    max_questions: Option<usize>,

    /// Optional JSON config file (e.g. {"maxQuestionsToShow": 6})
    #[arg(long)]
    config: Option<String>,

    /// Output format for export (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files
    #[arg(long, default_value = ".")]
    out_dir: String,

    /// Do not print the summary on stdout
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match DashboardConfig::from_path(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Error reading config {}: {}", path, e);
                process::exit(1);
            }
        },
        None => DashboardConfig::default(),
    };

    let opts = AnalysisOptions {
        config: config.with_max_questions(cli.max_questions),
        columns: cli.columns.clone(),
        cross: cli.cross.clone(),
        export_format: cli.export_format,
        out_dir: PathBuf::from(&cli.out_dir),
        base_dir: Some(PathBuf::from(&cli.path)).filter(|p| p.is_dir()),
    };

    let files = collect_files(Path::new(&cli.path));
    if files.is_empty() {
        error!("Error: no survey files found at {}", cli.path);
        process::exit(1);
    }

    // Files are independent: each one owns its dataset
    let outcomes: Vec<_> = files
        .par_iter()
        .map(|file| (file, analyze_path(file, &opts)))
        .collect();

    let mut failed = Vec::new();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(outcome) => {
                if !cli.quiet {
                    println!("{}", outcome.result);
                }
            }
            Err(e) => {
                error!("Error analyzing {}: {}", file.display(), e);
                failed.push((file.display().to_string(), e.to_string()));
            }
        }
    }

    if !failed.is_empty() {
        print_failed_files(&failed);
        process::exit(1);
    }
}

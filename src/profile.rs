//! Column profiling and type classification.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::cell::CellValue;
use crate::loader::Dataset;

/// Share of numeric values from which a column counts as numeric.
pub const NUMERIC_RATIO_THRESHOLD: f64 = 0.8;
/// Columns with at most this many distinct values are categorical.
pub const CATEGORICAL_MAX_UNIQUE: usize = 30;
/// Columns whose distinct values stay below this fraction of the row count
/// are categorical as well.
pub const CATEGORICAL_ROW_FRACTION: f64 = 0.1;
/// Largest categorical cardinality offered as a cross-tabulation axis.
pub const CROSS_MAX_UNIQUE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    MultiSelect,
    Text,
}

impl ColumnKind {
    /// Human-readable description for summary tables and chart badges.
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric (quantitative)",
            ColumnKind::Categorical => "Categorical (single choice)",
            ColumnKind::MultiSelect => "Multiple choice (separated values)",
            ColumnKind::Text => "Free text (more than 30 unique values)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::MultiSelect => "multiSelect",
            ColumnKind::Text => "text",
        }
    }
}

/// Derived, immutable metadata about one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-blank raw values in dataset row order.
    pub values: Vec<CellValue>,
    /// Distinct raw values in first-seen order.
    pub unique_values: Vec<CellValue>,
    pub unique_count: usize,
}

impl ColumnProfile {
    pub fn filled(&self) -> usize {
        self.values.len()
    }
}

/// Profiles of every non-empty column of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProfile {
    pub total_rows: usize,
    columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Dashboard headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub question_columns: usize,
    /// Filled share of the question cells, in percent with one decimal.
    pub completion_percent: f64,
}

/// Classifies a column from its non-blank values.
///
/// Checks run in priority order: numeric ratio, low cardinality, separators
/// in a text column, and free text as the fallback.
pub fn classify(values: &[CellValue], unique_count: usize, total_rows: usize) -> ColumnKind {
    if values.is_empty() {
        return ColumnKind::Text;
    }

    let numeric = values.iter().filter(|v| v.as_number().is_some()).count();
    let numeric_ratio = numeric as f64 / values.len() as f64;
    if numeric_ratio >= NUMERIC_RATIO_THRESHOLD {
        return ColumnKind::Numeric;
    }

    if unique_count <= CATEGORICAL_MAX_UNIQUE
        || (unique_count as f64) < total_rows as f64 * CATEGORICAL_ROW_FRACTION
    {
        return ColumnKind::Categorical;
    }

    let has_separators = values.iter().any(|v| match v {
        CellValue::Text(s) => s.contains(',') || s.contains(';'),
        _ => false,
    });
    if has_separators && values[0].is_text() {
        return ColumnKind::MultiSelect;
    }

    ColumnKind::Text
}

/// Profiles a single column by index.
pub fn profile_column(dataset: &Dataset, index: usize) -> ColumnProfile {
    let name = dataset.columns().get(index).cloned().unwrap_or_default();
    let values: Vec<CellValue> = dataset
        .column_cells(index)
        .filter(|c| !c.is_blank())
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let unique_values: Vec<CellValue> = values
        .iter()
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect();
    let unique_count = unique_values.len();

    let kind = classify(&values, unique_count, dataset.len());
    debug!(
        "column {name:?}: {} ({} filled, {} unique)",
        kind.as_str(),
        values.len(),
        unique_count
    );

    ColumnProfile {
        name,
        kind,
        values,
        unique_values,
        unique_count,
    }
}

/// Profiles every column, dropping the ones without any value.
pub fn profile_dataset(dataset: &Dataset) -> DatasetProfile {
    let columns = (0..dataset.columns().len())
        .map(|i| profile_column(dataset, i))
        .filter(|p| !p.values.is_empty())
        .collect();
    DatasetProfile {
        total_rows: dataset.len(),
        columns,
    }
}

/// Headline figures over the question columns.
pub fn summarize(profile: &DatasetProfile, questions: &[String]) -> DatasetSummary {
    let filled: usize = questions
        .iter()
        .filter_map(|name| profile.column(name))
        .map(ColumnProfile::filled)
        .sum();
    let cells = profile.total_rows * questions.len();
    let completion_percent = if cells == 0 {
        0.0
    } else {
        round1(filled as f64 / cells as f64 * 100.0)
    };
    DatasetSummary {
        total_rows: profile.total_rows,
        question_columns: questions.len(),
        completion_percent,
    }
}

/// Surfaced columns that can serve as the secondary cross-tabulation axis.
pub fn cross_candidates(profile: &DatasetProfile, surfaced: &[String]) -> Vec<String> {
    surfaced
        .iter()
        .filter(|name| {
            profile.column(name).is_some_and(|c| {
                c.kind == ColumnKind::Categorical && c.unique_count <= CROSS_MAX_UNIQUE
            })
        })
        .cloned()
        .collect()
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

//! Frequency tables, numeric binning and cross-tabulation.
//!
//! Everything here is recomputed per selection from an immutable
//! [`DatasetProfile`]; nothing is cached or mutated in place.

use std::collections::HashMap;

use serde::Serialize;

use crate::cell::{format_fixed1, format_number};
use crate::error::SurveyError;
use crate::grouping::group_answers;
use crate::loader::Dataset;
use crate::profile::{ColumnKind, ColumnProfile, DatasetProfile, round1};

/// Labels kept before the long tail is folded into [`OTHERS_LABEL`].
pub const TOP_LABELS: usize = 25;
pub const OTHERS_LABEL: &str = "Altri";
/// Numeric columns with fewer distinct values are counted per value.
pub const DISCRETE_MAX_UNIQUE: usize = 10;
pub const CROSS_MAX_PRIMARY: usize = 20;
pub const CROSS_MAX_SECONDARY: usize = 10;

const LAST_BIN_NUDGE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub label: String,
    pub count: usize,
    /// Share of the table total in percent, one decimal.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FrequencyTable {
    pub rows: Vec<FrequencyRow>,
    pub total: usize,
}

impl FrequencyTable {
    /// Builds the table and its percentages from ordered `(label, count)` pairs.
    pub fn from_counts(counts: Vec<(String, usize)>) -> Self {
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let rows = counts
            .into_iter()
            .map(|(label, count)| FrequencyRow {
                percent: percent(count, total),
                label,
                count,
            })
            .collect();
        FrequencyTable { rows, total }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&FrequencyRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

/// `count / total * 100` rounded to one decimal; 0 when `total` is 0.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

/// Sums counts of repeated labels into their first position.
fn merge_labels(counts: impl IntoIterator<Item = (String, usize)>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (label, count) in counts {
        match positions.get(&label) {
            Some(&i) => out[i].1 += count,
            None => {
                positions.insert(label.clone(), out.len());
                out.push((label, count));
            }
        }
    }
    out
}

/// One bucket per distinct value, ascending.
pub fn discrete_counts(nums: &[f64]) -> Vec<(String, usize)> {
    let mut buckets: Vec<(f64, String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for &n in nums {
        let label = format_number(n);
        match positions.get(&label) {
            Some(&i) => buckets[i].2 += 1,
            None => {
                positions.insert(label.clone(), buckets.len());
                buckets.push((n, label, 1));
            }
        }
    }
    buckets.sort_by(|a, b| a.0.total_cmp(&b.0));
    buckets.into_iter().map(|(_, l, c)| (l, c)).collect()
}

/// Fixed-width histogram: 10 bins when the range exceeds 10, else 5.
///
/// Bins are half open `[lower, upper)`; the last upper bound is nudged up by
/// 0.001 so the maximum lands inside it.
pub fn histogram(nums: &[f64]) -> Vec<(String, usize)> {
    if nums.is_empty() {
        return Vec::new();
    }
    let min = nums.iter().copied().fold(f64::INFINITY, f64::min);
    let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let bins = if range > 10.0 { 10 } else { 5 };
    let width = range / bins as f64;

    let edges = (0..bins).map(|i| {
        let lower = min + i as f64 * width;
        let mut upper = min + (i + 1) as f64 * width;
        if i == bins - 1 {
            upper += LAST_BIN_NUDGE;
        }
        let count = nums.iter().filter(|&&n| n >= lower && n < upper).count();
        (
            format!("{} - {}", format_fixed1(lower), format_fixed1(upper)),
            count,
        )
    });
    // a zero range yields identical labels
    merge_labels(edges)
}

/// Folds every label past `keep` into a trailing [`OTHERS_LABEL`] bucket.
///
/// An answer that is literally [`OTHERS_LABEL`] joins the bucket, so the
/// label appears once.
pub fn collapse_tail(counts: Vec<(String, usize)>, keep: usize) -> Vec<(String, usize)> {
    if counts.len() <= keep {
        return counts;
    }
    let (literal, mut head): (Vec<_>, Vec<_>) =
        counts.into_iter().partition(|(label, _)| label == OTHERS_LABEL);
    let cut = keep.min(head.len());
    let others: usize = head
        .drain(cut..)
        .chain(literal)
        .map(|(_, n)| n)
        .sum();
    head.push((OTHERS_LABEL.to_string(), others));
    head
}

fn sort_by_count_desc(counts: &mut [(String, usize)]) {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
}

/// Single-column distribution for a profiled column.
pub fn frequency_table(profile: &ColumnProfile) -> FrequencyTable {
    let counts = match profile.kind {
        ColumnKind::Numeric => {
            let nums: Vec<f64> = profile.values.iter().filter_map(|v| v.as_number()).collect();
            if profile.unique_count < DISCRETE_MAX_UNIQUE {
                discrete_counts(&nums)
            } else {
                histogram(&nums)
            }
        }
        ColumnKind::MultiSelect => {
            let mut counts = group_answers(&profile.values, true);
            sort_by_count_desc(&mut counts);
            counts
        }
        ColumnKind::Categorical | ColumnKind::Text => {
            let mut counts = group_answers(&profile.values, false);
            sort_by_count_desc(&mut counts);
            collapse_tail(counts, TOP_LABELS)
        }
    };
    FrequencyTable::from_counts(counts)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossRow {
    pub label: String,
    /// Counts aligned with [`CrossTabulation::categories`].
    pub counts: Vec<usize>,
}

/// Counts of primary values broken down by secondary categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabulation {
    pub primary: String,
    pub secondary: String,
    pub categories: Vec<String>,
    pub rows: Vec<CrossRow>,
}

impl CrossTabulation {
    /// Count for a pair; unobserved or capped-out pairs read as 0.
    pub fn count(&self, primary: &str, secondary: &str) -> usize {
        let Some(col) = self.categories.iter().position(|c| c == secondary) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|r| r.label == primary)
            .map_or(0, |r| r.counts[col])
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

/// Cross-tabulates `primary` against the first distinct values of `secondary`.
///
/// Rows where either trimmed cell is empty are skipped. Primary labels keep
/// first-encountered order and are capped at [`CROSS_MAX_PRIMARY`]; secondary
/// categories follow the column's distinct values and are capped at
/// [`CROSS_MAX_SECONDARY`].
pub fn cross_tabulate(
    dataset: &Dataset,
    primary: &str,
    secondary: &ColumnProfile,
) -> Result<CrossTabulation, SurveyError> {
    let p_index = dataset
        .column_index(primary)
        .ok_or_else(|| SurveyError::UnknownColumn(primary.to_string()))?;
    let s_index = dataset
        .column_index(&secondary.name)
        .ok_or_else(|| SurveyError::UnknownColumn(secondary.name.clone()))?;

    let mut categories: Vec<String> = Vec::new();
    for value in &secondary.unique_values {
        if categories.len() == CROSS_MAX_SECONDARY {
            break;
        }
        let label = value.trimmed();
        if !categories.contains(&label) {
            categories.push(label);
        }
    }

    let mut order: Vec<String> = Vec::new();
    let mut table: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for record in dataset.records() {
        let p = record.cell(p_index).trimmed();
        let s = record.cell(s_index).trimmed();
        if p.is_empty() || s.is_empty() {
            continue;
        }
        if !table.contains_key(&p) {
            order.push(p.clone());
        }
        *table.entry(p).or_default().entry(s).or_insert(0) += 1;
    }

    let rows = order
        .into_iter()
        .take(CROSS_MAX_PRIMARY)
        .map(|label| {
            let counts = categories
                .iter()
                .map(|c| table.get(&label).and_then(|m| m.get(c)).copied().unwrap_or(0))
                .collect();
            CrossRow { label, counts }
        })
        .collect();

    Ok(CrossTabulation {
        primary: primary.to_string(),
        secondary: secondary.name.clone(),
        categories,
        rows,
    })
}

/// Chart hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum AnalysisResult {
    Frequency(FrequencyTable),
    CrossTab(CrossTabulation),
}

/// Everything a renderer needs to draw one selected column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnAnalysis {
    pub column: String,
    pub kind: ColumnKind,
    pub kind_label: &'static str,
    pub chart: ChartKind,
    pub result: AnalysisResult,
}

/// Analyzes a primary column, optionally against a secondary one.
///
/// A secondary column equal to the primary falls back to the single-column
/// distribution.
pub fn analyze_column(
    dataset: &Dataset,
    profile: &DatasetProfile,
    primary: &str,
    secondary: Option<&str>,
) -> Result<ColumnAnalysis, SurveyError> {
    let primary_profile = profile
        .column(primary)
        .ok_or_else(|| SurveyError::UnknownColumn(primary.to_string()))?;
    let secondary = secondary.filter(|s| !s.is_empty() && *s != primary);

    let (chart, result) = match secondary {
        Some(name) => {
            let secondary_profile = profile
                .column(name)
                .ok_or_else(|| SurveyError::UnknownColumn(name.to_string()))?;
            let crosstab = cross_tabulate(dataset, primary, secondary_profile)?;
            (ChartKind::Bar, AnalysisResult::CrossTab(crosstab))
        }
        None => {
            let chart = if primary_profile.kind == ColumnKind::Categorical {
                ChartKind::Pie
            } else {
                ChartKind::Bar
            };
            (chart, AnalysisResult::Frequency(frequency_table(primary_profile)))
        }
    };

    Ok(ColumnAnalysis {
        column: primary.to_string(),
        kind: primary_profile.kind,
        kind_label: primary_profile.kind.label(),
        chart,
        result,
    })
}

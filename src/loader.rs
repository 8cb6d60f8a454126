//! Table loading: turns rows of raw cells into a header-keyed [`Dataset`].
//!
//! Survey exports often carry title rows, blank spacer rows or a row of
//! question numbers above the real header. The header is therefore chosen by
//! scoring the leading rows instead of assuming row 0.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::cell::{CellValue, parse_finite};
use crate::error::SurveyError;

/// How many leading rows are considered when looking for the header.
pub const HEADER_SCAN_ROWS: usize = 10;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One data row, with one cell per dataset column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    cells: Vec<CellValue>,
}

impl Record {
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Cell at a column index; positions past the row are empty.
    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }
}

/// Ordered records sharing one set of uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    header_row: usize,
}

impl Dataset {
    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Index of the header row among the non-blank input rows.
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column in row order.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.records.iter().map(move |r| r.cell(index))
    }

    /// Cell lookup by column name. Unknown columns read as empty.
    pub fn value(&self, row: usize, column: &str) -> &CellValue {
        match (self.records.get(row), self.column_index(column)) {
            (Some(record), Some(index)) => record.cell(index),
            _ => &EMPTY_CELL,
        }
    }
}

/// Header score of a row: one point per filled cell, three more for each
/// filled cell that is descriptive text (not a number, longer than 3 chars).
pub fn header_score(row: &[CellValue]) -> usize {
    row.iter()
        .map(|cell| {
            let text = cell.trimmed();
            if text.is_empty() {
                0
            } else if parse_finite(&text).is_none() && text.chars().count() > 3 {
                4
            } else {
                1
            }
        })
        .sum()
}

/// Picks the best scoring row among the first [`HEADER_SCAN_ROWS`];
/// ties go to the earliest row.
pub fn detect_header_row(rows: &[Vec<CellValue>]) -> usize {
    let mut best = 0;
    let mut best_score = None;
    for (i, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = header_score(row);
        if best_score.is_none_or(|s| score > s) {
            best = i;
            best_score = Some(score);
        }
    }
    debug!("header row {} selected (score {})", best, best_score.unwrap_or(0));
    best
}

/// Resolves `width` unique column names from the header row.
///
/// Empty header cells become `Column N` (1-based). Repeated names keep the
/// first occurrence as is and suffix later ones with ` (k)`, where `k` is the
/// occurrence count.
pub fn resolve_headers(header: &[CellValue], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(width);

    for index in 0..width {
        let mut base = header.get(index).map(CellValue::trimmed).unwrap_or_default();
        if base.is_empty() {
            base = format!("Column {}", index + 1);
            debug!("synthesized header {base:?}");
        }

        let occurrence = seen.entry(base.clone()).or_insert(0);
        *occurrence += 1;
        let mut name = if *occurrence == 1 {
            base.clone()
        } else {
            format!("{base} ({occurrence})")
        };
        // a literal "Q (2)" header can collide with a generated suffix
        while used.contains(&name) {
            *occurrence += 1;
            name = format!("{base} ({occurrence})");
        }
        if name != base {
            debug!("duplicate header {base:?} renamed to {name:?}");
        }
        used.insert(name.clone());
        names.push(name);
    }
    names
}

/// Builds a [`Dataset`] from raw rows.
///
/// Fully blank rows are discarded first; at least two rows must remain. Data
/// rows are the rows after the detected header, padded to the widest row.
pub fn load_rows(rows: Vec<Vec<CellValue>>) -> Result<Dataset, SurveyError> {
    let rows: Vec<Vec<CellValue>> = rows
        .into_iter()
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .collect();

    if rows.len() < 2 {
        return Err(SurveyError::EmptyInput {
            usable_rows: rows.len(),
        });
    }

    let header_row = detect_header_row(&rows);
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let columns = resolve_headers(&rows[header_row], width);

    let records: Vec<Record> = rows
        .into_iter()
        .skip(header_row + 1)
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .map(|mut cells| {
            cells.resize(width, CellValue::Empty);
            Record { cells }
        })
        .collect();

    if records.is_empty() {
        return Err(SurveyError::NoDataRows { header_row });
    }

    debug!(
        "loaded {} record(s) with {} column(s)",
        records.len(),
        columns.len()
    );
    Ok(Dataset {
        columns,
        records,
        header_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from_field(c)).collect()
    }

    #[test]
    fn picks_descriptive_row_over_numeric_ids() {
        let rows = vec![
            row(&["1", "3", "5"]),
            row(&["1. Sesso", "2. Età", "3. Quale scuola?"]),
            row(&["M", "25", "Liceo"]),
        ];
        assert_eq!(header_score(&rows[0]), 3);
        assert_eq!(header_score(&rows[1]), 12);
        assert_eq!(detect_header_row(&rows), 1);

        let ds = load_rows(rows).unwrap();
        assert_eq!(ds.header_row(), 1);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.columns()[2], "3. Quale scuola?");
    }

    #[test]
    fn ties_go_to_earliest_row() {
        let rows = vec![row(&["abcd", "x"]), row(&["wxyz", "y"]), row(&["a", "b"])];
        assert_eq!(detect_header_row(&rows), 0);
    }

    #[test]
    fn header_scan_is_limited_to_leading_rows() {
        let mut rows: Vec<Vec<CellValue>> = (0..12).map(|_| row(&["x"])).collect();
        rows.push(row(&["A long question", "Another long one"]));
        assert_eq!(detect_header_row(&rows), 0);
    }

    #[test]
    fn chosen_header_is_never_outscored() {
        let rows = vec![
            row(&["Survey 2025"]),
            row(&["Name", "Age", "Favourite colour"]),
            row(&["Anna", "31", "Blue"]),
        ];
        let chosen = detect_header_row(&rows);
        let best = header_score(&rows[chosen]);
        assert!(rows.iter().take(HEADER_SCAN_ROWS).all(|r| header_score(r) <= best));
    }

    #[test]
    fn headers_are_synthesized_and_disambiguated() {
        let header = row(&["Q", "", "Q", "Q", " Q "]);
        let names = resolve_headers(&header, 6);
        assert_eq!(
            names,
            vec!["Q", "Column 2", "Q (2)", "Q (3)", "Q (4)", "Column 6"]
        );
    }

    #[test]
    fn generated_suffix_does_not_clash_with_literal_header() {
        let header = row(&["Q (2)", "Q", "Q"]);
        let names = resolve_headers(&header, 3);
        assert_eq!(names, vec!["Q (2)", "Q", "Q (3)"]);
    }

    #[test]
    fn ragged_rows_are_padded_and_blank_rows_dropped() {
        let rows = vec![
            row(&["Long header one", "Long header two", "Long header three"]),
            row(&["", " ", ""]),
            row(&["a"]),
            vec![],
            row(&["b", "c", "d"]),
        ];
        let ds = load_rows(rows).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].cells().len(), 3);
        assert_eq!(ds.value(0, "Long header three"), &CellValue::Empty);
        assert_eq!(ds.value(1, "Long header two"), &CellValue::Text("c".into()));
        assert_eq!(ds.value(1, "missing"), &CellValue::Empty);
    }

    #[test]
    fn too_few_rows_is_empty_input() {
        let err = load_rows(vec![row(&["only header"]), row(&["", ""])]).unwrap_err();
        assert!(matches!(err, SurveyError::EmptyInput { usable_rows: 1 }));
    }

    #[test]
    fn header_in_last_row_leaves_no_data() {
        let rows = vec![row(&["1"]), row(&["A proper header"])];
        let err = load_rows(rows).unwrap_err();
        assert!(matches!(err, SurveyError::NoDataRows { header_row: 1 }));
    }

    #[test]
    fn loads_end_to_end_sample() {
        let rows = vec![
            row(&["1. Sesso", "2. Età"]),
            row(&["M", "25"]),
            row(&["F", "30"]),
            row(&["M", "25"]),
        ];
        let ds = load_rows(rows).unwrap();
        assert_eq!(ds.header_row(), 0);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.columns(), &["1. Sesso".to_string(), "2. Età".to_string()]);
    }
}

//! Survey file discovery and reading.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use walkdir::WalkDir;

use crate::cell::CellValue;
use crate::error::SurveyError;
use crate::office::extract_rows_from_xlsx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Tsv,
    Xlsx,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(InputFormat::Csv),
            "tsv" => Some(InputFormat::Tsv),
            "xlsx" => Some(InputFormat::Xlsx),
            _ => None,
        }
    }
}

/// Collects the survey files under `path`.
///
/// A file path is returned as is (unsupported formats fail later, when
/// read); directories are walked recursively and filtered by extension.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| InputFormat::from_path(p).is_some())
        .collect();
    files.sort();
    files
}

/// Reads rows of typed cells from a `.csv`, `.tsv` or `.xlsx` file.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<CellValue>>, SurveyError> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Csv) => parse_delimited(File::open(path)?, b','),
        Some(InputFormat::Tsv) => parse_delimited(File::open(path)?, b'\t'),
        Some(InputFormat::Xlsx) => extract_rows_from_xlsx(path),
        None => Err(SurveyError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Parses delimited text without header handling; rows may be ragged.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Vec<CellValue>>, SurveyError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| CellValue::from_field(&String::from_utf8_lossy(field)))
            .collect();
        rows.push(row);
    }
    if let Some(cell) = rows.first_mut().and_then(|r| r.first_mut()) {
        if let CellValue::Text(text) = cell {
            if let Some(stripped) = text.strip_prefix('\u{feff}') {
                let retyped = CellValue::from_field(stripped);
                *cell = retyped;
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_rows_are_ragged_and_typed() {
        let data = "\u{feff}Sesso,Età,Note\nM,25\nF,30,\"a, b\"\n";
        let rows = parse_delimited(data.as_bytes(), b',').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], CellValue::Text("Sesso".into()));
        assert_eq!(rows[1], vec![CellValue::Text("M".into()), CellValue::Number(25.0)]);
        assert_eq!(rows[2][2], CellValue::Text("a, b".into()));
    }

    #[test]
    fn tab_delimiter() {
        let rows = parse_delimited("a\tb\n1\t\n".as_bytes(), b'\t').unwrap();
        assert_eq!(rows[1], vec![CellValue::Number(1.0), CellValue::Empty]);
    }

    #[test]
    fn formats_by_extension() {
        assert_eq!(InputFormat::from_path(Path::new("x.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("x.xlsx")), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_path(Path::new("x.pdf")), None);
        assert!(matches!(
            read_rows(Path::new("survey.ods")),
            Err(SurveyError::UnsupportedFormat(_))
        ));
    }
}

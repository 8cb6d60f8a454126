use calamine::{DataRef, Reader, Xlsx, open_workbook_from_rs};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::cell::CellValue;
use crate::error::SurveyError;

/// Column count of a worksheet (`A` to `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Row count of a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Reads the first worksheet of an `.xlsx` workbook as rows of cells.
///
/// Cells keep their sheet position: leading empty columns and gaps inside a
/// row come back as [`CellValue::Empty`].
pub fn extract_rows_from_xlsx(p: &Path) -> Result<Vec<Vec<CellValue>>, SurveyError> {
    let file = File::open(p)?;
    let mut workbook: Xlsx<_> = open_workbook_from_rs(BufReader::new(file))
        .map_err(|e| SurveyError::Workbook(format!("Open .xlsx failed: {e}")))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SurveyError::Workbook("No worksheet found".to_string()))?;
    debug!("{}: reading worksheet {sheet:?}", p.display());

    // calamine can panic on cell references that overflow its counters
    panic::catch_unwind(AssertUnwindSafe(|| read_sheet(&mut workbook, &sheet))).unwrap_or_else(
        |_| {
            Err(SurveyError::Workbook(format!(
                "Malformed cell reference in worksheet {sheet:?}"
            )))
        },
    )
}

// ---- Internal helpers ----

fn read_sheet<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    sheet: &str,
) -> Result<Vec<Vec<CellValue>>, SurveyError> {
    let mut cells = workbook
        .worksheet_cells_reader(sheet)
        .map_err(|e| SurveyError::Workbook(format!("Read worksheet {sheet:?} failed: {e}")))?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    while let Some(cell) = cells
        .next_cell()
        .map_err(|e| SurveyError::Workbook(format!("Read worksheet {sheet:?} failed: {e}")))?
    {
        let (row, col) = cell.get_position();
        place(&mut rows, row, col, cell_value(cell.get_value()))?;
    }
    Ok(rows)
}

/// Stores `value` at its sheet position, growing rows on demand.
fn place(
    rows: &mut Vec<Vec<CellValue>>,
    row: u32,
    col: u32,
    value: CellValue,
) -> Result<(), SurveyError> {
    if row >= MAX_ROWS || col >= MAX_COLUMNS {
        return Err(SurveyError::Workbook(format!(
            "Cell reference out of range (row {}, column {})",
            u64::from(row) + 1,
            u64::from(col) + 1
        )));
    }
    if value == CellValue::Empty {
        return Ok(());
    }
    let (row, col) = (row as usize, col as usize);
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, CellValue::Empty);
    }
    cells[col] = value;
    Ok(())
}

fn cell_value(data: &DataRef<'_>) -> CellValue {
    match data {
        DataRef::Int(n) => CellValue::Number(*n as f64),
        DataRef::Float(n) => CellValue::from(*n),
        DataRef::String(s) => CellValue::from(s.as_str()),
        DataRef::SharedString(s) => CellValue::from(*s),
        DataRef::Bool(b) => CellValue::Text(b.to_string()),
        DataRef::DateTime(dt) => match dt.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                CellValue::Text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::from(dt.as_f64()),
        },
        DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => CellValue::from(s.as_str()),
        DataRef::Error(e) => CellValue::Text(e.to_string()),
        _ => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn values_map_to_cells() {
        assert_eq!(cell_value(&DataRef::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_value(&DataRef::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(cell_value(&DataRef::SharedString("Sesso")), CellValue::Text("Sesso".into()));
        assert_eq!(cell_value(&DataRef::String("".into())), CellValue::Empty);
        assert_eq!(cell_value(&DataRef::Bool(false)), CellValue::Text("false".into()));
        assert_eq!(
            cell_value(&DataRef::Error(CellErrorType::Div0)),
            CellValue::Text("#DIV/0!".into())
        );
        assert_eq!(cell_value(&DataRef::Empty), CellValue::Empty);
    }

    #[test]
    fn dates_render_as_iso_text() {
        let day = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_value(&DataRef::DateTime(day)), CellValue::Text("2024-01-01".into()));
        let noon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            cell_value(&DataRef::DateTime(noon)),
            CellValue::Text("2024-01-01 12:00:00".into())
        );
    }

    #[test]
    fn cells_land_in_their_columns() {
        let mut rows = Vec::new();
        place(&mut rows, 0, 2, CellValue::Text("Note".into())).unwrap();
        place(&mut rows, 2, 1, CellValue::Number(25.0)).unwrap();
        place(&mut rows, 2, 3, CellValue::Empty).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![CellValue::Empty, CellValue::Empty, CellValue::Text("Note".into())],
                vec![],
                vec![CellValue::Empty, CellValue::Number(25.0)],
            ]
        );
    }

    #[test]
    fn positions_past_the_sheet_limits_are_rejected() {
        let mut rows = Vec::new();
        let err = place(&mut rows, 0, MAX_COLUMNS, CellValue::Number(1.0)).unwrap_err();
        assert!(matches!(&err, SurveyError::Workbook(msg) if msg.contains("column 16385")));
        assert!(place(&mut rows, MAX_ROWS, 0, CellValue::Number(1.0)).is_err());
        assert!(place(&mut rows, u32::MAX, u32::MAX, CellValue::Number(1.0)).is_err());
        assert!(rows.is_empty());
    }
}

//! Raw export reading.
//!
//! Loads Excel workbooks sheet by sheet, or CSV exports as a single sheet
//! named after the file stem, into in-memory `RawTable`s.

use crate::error::{Result, RidershipError};
use crate::models::{Cell, RawTable};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::debug;

/// Load every sheet of a raw export
pub fn load_workbook(path: &Path) -> Result<Vec<RawTable>> {
    if !path.is_file() {
        return Err(RidershipError::FileUnavailable {
            path: path.to_path_buf(),
        });
    }

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let sheets = if is_csv {
        vec![read_csv_sheet(path)?]
    } else {
        read_excel_sheets(path)?
    };

    debug!(
        "Loaded {} sheet(s) from {}: {:?}",
        sheets.len(),
        path.display(),
        sheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
    );
    Ok(sheets)
}

fn read_excel_sheets(path: &Path) -> Result<Vec<RawTable>> {
    let workbook_error = |reason: String| RidershipError::Workbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| workbook_error(format!("sheet '{}': {}", name, e)))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect());
        sheets.push(table_from_rows(name, rows));
    }

    Ok(sheets)
}

fn read_csv_sheet(path: &Path) -> Result<RawTable> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::text).collect());
    }

    Ok(table_from_rows(name, rows.into_iter()))
}

/// Split the first row off as headers and drop fully blank rows
fn table_from_rows(name: String, mut rows: impl Iterator<Item = Vec<Cell>>) -> RawTable {
    let headers = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|cell| cell.as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    RawTable::new(name, headers, rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Cell::text(value)
        }
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Text(value.to_string()),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => Cell::Number(value.as_f64()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_csv_export_loads_as_single_sheet() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("station-hourly-2025-08.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "BUSINESS DATE,STATION, 00:00 Hrs To 01:00 Hrs ,TOTAL").unwrap();
        writeln!(file, "2025-08-01,BLUE-Majestic,,0").unwrap();
        writeln!(file, ",,,").unwrap();
        writeln!(file, "2025-08-02,BLUE-Majestic,14").unwrap();

        let sheets = load_workbook(&path).unwrap();
        assert_eq!(sheets.len(), 1);

        let sheet = &sheets[0];
        assert_eq!(sheet.name, "station-hourly-2025-08");
        assert_eq!(sheet.headers[2], "00:00 Hrs To 01:00 Hrs");
        // Blank row dropped, short row kept
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][2], Cell::Empty);
        assert_eq!(RawTable::cell(&sheet.rows[1], 3), &Cell::Empty);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = load_workbook(Path::new("/nonexistent/station-hourly.xlsx"));
        assert!(matches!(
            result,
            Err(RidershipError::FileUnavailable { .. })
        ));
    }

    #[test]
    fn test_corrupt_workbook_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("station-hourly.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let result = load_workbook(&path);
        assert!(matches!(result, Err(RidershipError::Workbook { .. })));
    }

    #[test]
    fn test_workbook_loads_every_sheet() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("station-hourly-2025-09.xlsx");

        let mut workbook = Workbook::new();
        let entry = workbook.add_worksheet();
        entry.set_name("Entry").unwrap();
        entry.write_string(0, 0, "BUSINESS DATE").unwrap();
        entry.write_string(0, 1, "STATION").unwrap();
        entry.write_string(0, 2, "H08").unwrap();
        let business_date = ExcelDateTime::from_ymd(2025, 9, 1).unwrap();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        entry
            .write_datetime_with_format(1, 0, &business_date, &date_format)
            .unwrap();
        entry.write_string(1, 1, "BLUE-Majestic").unwrap();
        entry.write_number(1, 2, 42).unwrap();
        // Blank row between data rows
        entry.write_string(3, 1, "PURPLE-Indiranagar").unwrap();

        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "Remarks").unwrap();
        workbook.save(&path).unwrap();

        let sheets = load_workbook(&path).unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Entry", "Notes"]);

        let entry = &sheets[0];
        assert_eq!(entry.headers, vec!["BUSINESS DATE", "STATION", "H08"]);
        assert_eq!(entry.rows.len(), 2);
        assert_eq!(
            entry.rows[0][0],
            Cell::Date(chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        );
        assert_eq!(entry.rows[0][2], Cell::Number(42.0));
        assert_eq!(entry.rows[1][1], Cell::Text("PURPLE-Indiranagar".to_string()));

        assert_eq!(sheets[1].headers, vec!["Remarks"]);
        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Int(5)), Cell::Number(5.0));
        assert_eq!(
            cell_from_data(&Data::String(" MJ ".to_string())),
            Cell::Text("MJ".to_string())
        );
    }
}

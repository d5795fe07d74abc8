//! Integration tests for the processor module
//!
//! Tests the complete pipeline against small raw directories built in
//! temporary folders.

pub mod workbook_processing;

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const STATION_CODES: &str = "code;name\nMJ;Majestic\nBN;Baiyappanahalli\nIN;Indiranagar\n";

pub const STATION_NAMES: &str = "alt_name;name\nKempegowda;Majestic\n";

pub const AUGUST_STATIONS: &str = "\
BUSINESS DATE,STATION,00:00 Hrs To 01:00 Hrs,08:00 Hrs To 09:00 Hrs,TOTAL
2025-08-01,BLUE-Kempegowda,,120,120
2025-08-01,PURPLE-Indiranagar,3,40,43
";

pub const AUGUST_PAIRS: &str = "\
BUSINESS DATE,STATION,BN,MJ
2025-08-01 08Hrs-09hrs,MJ,12,
2025-08-01 08Hrs-09hrs,IN,5,7
";

pub const SEPTEMBER_STATIONS: &str = "\
BUSINESS DATE,STATION,00:00 Hrs To 01:00 Hrs,08:00 Hrs To 09:00 Hrs,TOTAL
2025-09-01,BLUE-Majestic,1,2,3
";

/// Raw directory with an August station/pair pair, a September station
/// file and both mapping tables
pub fn create_raw_dir(temp_dir: &TempDir) -> PathBuf {
    let raw = temp_dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    write(&raw, "station-codes.csv", STATION_CODES);
    write(&raw, "station-names.csv", STATION_NAMES);
    write(&raw, "station-hourly-2025-08.csv", AUGUST_STATIONS);
    write(&raw, "stationpair-hourly-2025-08.csv", AUGUST_PAIRS);
    write(&raw, "station-hourly-2025-09.csv", SEPTEMBER_STATIONS);
    raw
}

pub fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Cell contents of a generated workbook
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
    Date(NaiveDate),
}

/// Write an xlsx workbook with one worksheet per (name, rows) entry.
///
/// Dates are stored as date-formatted serials, the way exports carry them.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Value>>)]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();

        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);
                match value {
                    Value::Text(text) => {
                        worksheet.write_string(row, col, *text).unwrap();
                    }
                    Value::Number(number) => {
                        worksheet.write_number(row, col, *number).unwrap();
                    }
                    Value::Date(date) => {
                        let datetime = ExcelDateTime::from_ymd(
                            date.year() as u16,
                            date.month() as u8,
                            date.day() as u8,
                        )
                        .unwrap();
                        worksheet
                            .write_datetime_with_format(row, col, &datetime, &date_format)
                            .unwrap();
                    }
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

//! Station pair normalization: origin by destination matrices to long records.
//!
//! Pair sheets carry one row per (date-hour, origin station) and one column
//! per destination station code. The date-hour label is a composite string
//! such as "2025-08-01 08Hrs-09hrs".

use crate::config::SheetLayout;
use crate::error::{Result, RidershipError};
use crate::models::{Cell, HOURS_PER_DAY, PairRecord, RawTable};
use crate::names::NameResolver;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("Invalid date prefix regex"));

static HOUR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)Hrs-(\d+)hrs").expect("Invalid hour range regex"));

/// Split a composite date-hour label into its date and starting hour
pub fn parse_date_hour(text: &str) -> Option<(NaiveDate, u8)> {
    let text = text.trim();
    let date_caps = DATE_PREFIX.captures(text)?;
    let date = NaiveDate::parse_from_str(&date_caps[1], "%Y-%m-%d").ok()?;

    let hour_caps = HOUR_RANGE.captures(text)?;
    let hour = hour_caps[1].parse::<u8>().ok()?;

    (hour < HOURS_PER_DAY).then_some((date, hour))
}

/// A pair matrix sheet with its identity and destination columns located
pub(crate) struct PairMatrix<'a> {
    table: &'a RawTable,
    date_index: usize,
    origin_index: usize,
    destinations: Vec<(usize, &'a str)>,
}

/// One usable matrix row: parsed date-hour and origin code
pub(crate) struct PairRow<'a> {
    pub date: NaiveDate,
    pub hour: u8,
    pub origin: String,
    cells: &'a [Cell],
}

impl PairRow<'_> {
    pub fn cell(&self, index: usize) -> &Cell {
        RawTable::cell(self.cells, index)
    }
}

impl<'a> PairMatrix<'a> {
    pub fn new(table: &'a RawTable, layout: &SheetLayout) -> Result<Self> {
        let locate = |label: &str| {
            table
                .column_index(label)
                .ok_or_else(|| RidershipError::MissingColumn {
                    sheet: table.name.clone(),
                    column: label.to_string(),
                })
        };
        let date_index = locate(&layout.date_column)?;
        let origin_index = locate(&layout.station_column)?;

        let destinations = table
            .headers
            .iter()
            .enumerate()
            .filter(|(index, label)| {
                *index != date_index && *index != origin_index && !label.is_empty()
            })
            .map(|(index, label)| (index, label.as_str()))
            .collect();

        Ok(Self {
            table,
            date_index,
            origin_index,
            destinations,
        })
    }

    /// Destination columns as (position, station code)
    pub fn destinations(&self) -> &[(usize, &'a str)] {
        &self.destinations
    }

    /// Rows with an origin station and a parseable date-hour label.
    ///
    /// Rows without an origin are summary rows; rows whose label fails to
    /// parse are dropped silently.
    pub fn rows(&self) -> impl Iterator<Item = PairRow<'a>> + use<'a> {
        let table = self.table;
        let date_index = self.date_index;
        let origin_index = self.origin_index;

        table.rows.iter().filter_map(move |cells| {
            let origin = RawTable::cell(cells, origin_index).as_text()?;
            let label = RawTable::cell(cells, date_index).as_text()?;
            let (date, hour) = parse_date_hour(&label)?;
            Some(PairRow {
                date,
                hour,
                origin,
                cells: cells.as_slice(),
            })
        })
    }
}

/// Pair matrices of a workbook.
///
/// Sheets without the date and origin columns (cover pages, notes) are
/// skipped. The workbook fails only when none of its sheets is a matrix.
pub(crate) fn pair_matrices<'a>(
    tables: &'a [RawTable],
    layout: &SheetLayout,
) -> Result<Vec<PairMatrix<'a>>> {
    let mut matrices = Vec::with_capacity(tables.len());
    let mut first_error = None;

    for table in tables {
        match PairMatrix::new(table, layout) {
            Ok(matrix) => matrices.push(matrix),
            Err(e) => {
                warn!("Skipping sheet '{}' of pair workbook: {}", table.name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if matrices.is_empty() => Err(e),
        _ => Ok(matrices),
    }
}

/// Reshape every pair matrix of a workbook into sparse directed records
pub fn normalize_pair_workbook(
    tables: &[RawTable],
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Vec<PairRecord>> {
    let mut records = Vec::new();
    for matrix in pair_matrices(tables, layout)? {
        records.extend(matrix_pairs(&matrix, names));
    }
    Ok(records)
}

/// Reshape one pair matrix into sparse directed records
pub fn normalize_pairs(
    table: &RawTable,
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Vec<PairRecord>> {
    let matrix = PairMatrix::new(table, layout)?;
    Ok(matrix_pairs(&matrix, names))
}

fn matrix_pairs(matrix: &PairMatrix<'_>, names: &NameResolver) -> Vec<PairRecord> {
    let table = matrix.table;
    let mut records = Vec::new();
    let mut usable_rows = 0usize;

    for row in matrix.rows() {
        usable_rows += 1;
        let origin_station = names.station_for_code(&row.origin);

        for &(index, code) in matrix.destinations() {
            let cell = row.cell(index);
            if cell.is_empty() {
                continue;
            }
            let ridership = cell.as_count();
            if ridership == 0 {
                continue;
            }
            records.push(PairRecord {
                date: row.date,
                hour: row.hour,
                origin_station: origin_station.to_string(),
                destination_station: names.station_for_code(code).to_string(),
                ridership,
            });
        }
    }

    debug!(
        "Sheet '{}': {} pair records, {} of {} rows skipped",
        table.name,
        records.len(),
        table.rows.len() - usable_rows,
        table.rows.len()
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn matrix(rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable::new(
            "Sheet1",
            ["BUSINESS DATE", "STATION", "BN", "MJ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows,
        )
    }

    fn resolver() -> NameResolver {
        NameResolver::new(
            NameMap::from_pairs([("MJ", "Majestic"), ("BN", "Baiyappanahalli")]),
            NameMap::new(),
        )
    }

    #[test]
    fn test_parse_date_hour() {
        assert_eq!(parse_date_hour("2025-08-01 08Hrs-09hrs"), Some((date(2025, 8, 1), 8)));
        assert_eq!(
            parse_date_hour("2025-08-01 (Fri) 23Hrs-24hrs total"),
            Some((date(2025, 8, 1), 23))
        );
        assert_eq!(parse_date_hour("2025-08-01 5Hrs-6hrs"), Some((date(2025, 8, 1), 5)));
    }

    #[test]
    fn test_parse_date_hour_rejects_malformed_labels() {
        assert_eq!(parse_date_hour(""), None);
        assert_eq!(parse_date_hour("2025-08-01"), None);
        assert_eq!(parse_date_hour("08Hrs-09hrs 2025-08-01"), None);
        assert_eq!(parse_date_hour("2025-13-01 08Hrs-09hrs"), None);
        assert_eq!(parse_date_hour("2025-08-01 24Hrs-25hrs"), None);
        assert_eq!(parse_date_hour("Grand Total"), None);
    }

    #[test]
    fn test_pair_row_maps_codes() {
        let table = matrix(vec![vec![
            Cell::text("2025-08-01 08Hrs-09hrs"),
            Cell::text("MJ"),
            Cell::Number(12.0),
            Cell::Empty,
        ]]);

        let records = normalize_pairs(&table, &SheetLayout::default(), &resolver()).unwrap();

        assert_eq!(
            records,
            vec![PairRecord {
                date: date(2025, 8, 1),
                hour: 8,
                origin_station: "Majestic".to_string(),
                destination_station: "Baiyappanahalli".to_string(),
                ridership: 12,
            }]
        );
    }

    #[test]
    fn test_zero_and_summary_rows_are_dropped() {
        let table = matrix(vec![
            vec![
                Cell::text("2025-08-01 08Hrs-09hrs"),
                Cell::text("BN"),
                Cell::Number(0.0),
                Cell::text("0"),
            ],
            vec![
                Cell::text("2025-08-01 08Hrs-09hrs"),
                Cell::Empty,
                Cell::Number(40.0),
                Cell::Number(40.0),
            ],
            vec![
                Cell::text("malformed"),
                Cell::text("MJ"),
                Cell::Number(3.0),
                Cell::Number(3.0),
            ],
            vec![Cell::Empty, Cell::text("MJ"), Cell::Number(3.0), Cell::Number(3.0)],
        ]);

        let records = normalize_pairs(&table, &SheetLayout::default(), &resolver()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_pair_ridership_is_always_positive() {
        let table = matrix(vec![
            vec![
                Cell::text("2025-08-01 08Hrs-09hrs"),
                Cell::text("MJ"),
                Cell::Number(0.4),
                Cell::Number(-2.0),
            ],
            vec![
                Cell::text("2025-08-01 09Hrs-10hrs"),
                Cell::text("BN"),
                Cell::Number(7.0),
                Cell::Number(1.0),
            ],
        ]);

        let records = normalize_pairs(&table, &SheetLayout::default(), &resolver()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.ridership > 0));
    }

    #[test]
    fn test_missing_origin_column() {
        let table = RawTable::new(
            "Sheet1",
            vec!["BUSINESS DATE".to_string(), "BN".to_string()],
            Vec::new(),
        );
        assert!(normalize_pairs(&table, &SheetLayout::default(), &resolver()).is_err());
    }

    fn notes_sheet() -> RawTable {
        RawTable::new(
            "Notes",
            vec!["Remarks".to_string()],
            vec![vec![Cell::text("Provisional figures")]],
        )
    }

    #[test]
    fn test_workbook_skips_non_matrix_sheets() {
        let tables = vec![
            matrix(vec![vec![
                Cell::text("2025-08-01 08Hrs-09hrs"),
                Cell::text("MJ"),
                Cell::Number(12.0),
                Cell::Empty,
            ]]),
            notes_sheet(),
        ];

        let records =
            normalize_pair_workbook(&tables, &SheetLayout::default(), &resolver()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin_station, "Majestic");
        assert_eq!(records[0].destination_station, "Baiyappanahalli");
        assert_eq!(records[0].ridership, 12);
    }

    #[test]
    fn test_workbook_without_matrix_fails() {
        let tables = vec![notes_sheet()];
        let result = normalize_pair_workbook(&tables, &SheetLayout::default(), &resolver());
        assert!(matches!(result, Err(RidershipError::MissingColumn { .. })));
    }
}

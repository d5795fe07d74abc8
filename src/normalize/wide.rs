//! Shared reading of wide per-station sheets.
//!
//! Entry normalization and direct exit extraction both walk a sheet with one
//! date column, one station label column and a set of hour columns.

use crate::config::SheetLayout;
use crate::error::{Result, RidershipError};
use crate::models::{Cell, FormatVersion, RawTable};
use crate::names::NameResolver;
use crate::schema::{HourColumn, hour_columns};
use chrono::{Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static LEADING_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("Invalid ISO date regex"));

/// Day-first layouts seen in hand-edited exports
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y", "%d-%b-%y", "%d.%m.%Y"];

/// Largest serial Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parse the business date of a station row
pub(crate) fn parse_business_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(date) => Some(*date),
        Cell::Number(serial) => from_excel_serial(*serial),
        Cell::Text(text) => {
            let text = text.trim();
            if let Some(caps) = LEADING_ISO_DATE.captures(text) {
                return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
            }
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        }
        Cell::Empty => None,
    }
}

fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// A wide station sheet with its identity and hour columns located
pub(crate) struct WideSheet<'a> {
    table: &'a RawTable,
    date_index: usize,
    station_index: usize,
    hour_columns: Vec<HourColumn>,
}

/// One usable row of a wide sheet
pub(crate) struct WideRow<'a> {
    pub date: NaiveDate,
    pub station: String,
    cells: &'a [Cell],
}

impl WideRow<'_> {
    /// Ridership in the given column, coerced to a non-negative count
    pub fn count(&self, index: usize) -> u64 {
        RawTable::cell(self.cells, index).as_count()
    }
}

impl<'a> WideSheet<'a> {
    /// Locate the identity columns and the hour columns of `version`.
    ///
    /// A sheet without a single recognisable hour column is rejected rather
    /// than producing an empty result.
    pub fn new(table: &'a RawTable, version: FormatVersion, layout: &SheetLayout) -> Result<Self> {
        let locate = |label: &str| {
            table
                .column_index(label)
                .ok_or_else(|| RidershipError::MissingColumn {
                    sheet: table.name.clone(),
                    column: label.to_string(),
                })
        };
        let date_index = locate(&layout.date_column)?;
        let station_index = locate(&layout.station_column)?;

        let hour_columns = hour_columns(table, version, &[date_index, station_index]);
        if hour_columns.is_empty() {
            return Err(RidershipError::UnrecognizedFormat {
                sheet: table.name.clone(),
            });
        }

        debug!(
            "Sheet '{}': {} hour columns ({:?})",
            table.name,
            hour_columns.len(),
            version
        );

        Ok(Self {
            table,
            date_index,
            station_index,
            hour_columns,
        })
    }

    pub fn hour_columns(&self) -> &[HourColumn] {
        &self.hour_columns
    }

    /// Rows with a parseable date and a station label, canonicalized
    pub fn rows<'n>(&self, names: &'n NameResolver) -> impl Iterator<Item = WideRow<'a>> + use<'a, 'n> {
        let table = self.table;
        let date_index = self.date_index;
        let station_index = self.station_index;

        table.rows.iter().filter_map(move |cells| {
            let station_label = RawTable::cell(cells, station_index).as_text()?;
            let Some(date) = parse_business_date(RawTable::cell(cells, date_index)) else {
                debug!(
                    "Skipping row for '{}' in sheet '{}': unparseable date",
                    station_label, table.name
                );
                return None;
            };
            Some(WideRow {
                date,
                station: names.canonical_station(&station_label),
                cells: cells.as_slice(),
            })
        })
    }
}

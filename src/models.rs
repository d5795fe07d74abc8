//! Core data structures for ridership normalization.
//!
//! Defines the raw tabular input model (cells, sheets), the schema revision
//! and output dataset enumerations, the canonical long-format records and
//! run statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of hourly buckets in a service day
pub const HOURS_PER_DAY: u8 = 24;

static EMPTY_CELL: Cell = Cell::Empty;

/// Schema revisions of the raw ridership exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Single sheet, hour columns labelled "00:00 Hrs To 01:00 Hrs"
    V1,
    /// Role-tagged sheets, hour columns labelled H00..H23
    V2,
}

/// Output datasets produced by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dataset {
    Entry,
    Exit,
    Pair,
}

impl Dataset {
    /// Base file name used for this dataset's outputs
    pub fn output_name(&self) -> &'static str {
        match self {
            Dataset::Entry => "station-hourly",
            Dataset::Exit => "station-exit-hourly",
            Dataset::Pair => "stationpair-hourly",
        }
    }

    /// Output column labels, in contract order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Entry | Dataset::Exit => &["Date", "Hour", "Station", "Ridership"],
            Dataset::Pair => &[
                "Date",
                "Hour",
                "Origin Station",
                "Destination Station",
                "Ridership",
            ],
        }
    }
}

/// A single cell value of a raw sheet
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    /// Build a text cell, collapsing blank strings to `Cell::Empty`
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(value) => value.is_nan(),
            Cell::Text(value) => value.trim().is_empty(),
            Cell::Date(_) => false,
        }
    }

    /// Render the cell as trimmed text, `None` when empty
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(value) if value.is_nan() => None,
            Cell::Number(value) if value.is_finite() && value.fract() == 0.0 => {
                Some(format!("{}", *value as i64))
            }
            Cell::Number(value) => Some(value.to_string()),
            Cell::Text(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    /// Coerce the cell to a non-negative ridership count.
    ///
    /// Missing, non-numeric and negative values become 0. Fractional values
    /// are truncated.
    pub fn as_count(&self) -> u64 {
        let value = match self {
            Cell::Number(value) => *value,
            Cell::Text(text) => match text.trim().replace(',', "").parse::<f64>() {
                Ok(value) => value,
                Err(_) => return 0,
            },
            Cell::Empty | Cell::Date(_) => return 0,
        };

        if value.is_finite() && value > 0.0 {
            value.trunc() as u64
        } else {
            0
        }
    }
}

/// One sheet of a raw export: a header row plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Position of the column with exactly this label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == label)
    }

    /// Cell at `index` of `row`, treating short rows as empty-padded
    pub fn cell(row: &[Cell], index: usize) -> &Cell {
        row.get(index).unwrap_or(&EMPTY_CELL)
    }

    /// Whether the sheet name carries the given role tag ("Entry", "Exit")
    pub fn has_role(&self, tag: &str) -> bool {
        self.name.contains(tag)
    }
}

/// Per-station hourly ridership in long format
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationHourRecord {
    pub date: NaiveDate,
    pub hour: u8,
    pub station: String,
    pub ridership: u64,
}

pub type EntryRecord = StationHourRecord;
pub type ExitRecord = StationHourRecord;

/// Directed origin to destination hourly ridership
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairRecord {
    pub date: NaiveDate,
    pub hour: u8,
    pub origin_station: String,
    pub destination_station: String,
    pub ridership: u64,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub periods: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub entry_rows: usize,
    pub exit_rows: usize,
    pub pair_rows: usize,
    pub output_paths: Vec<PathBuf>,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn total_rows(&self) -> usize {
        self.entry_rows + self.exit_rows + self.pair_rows
    }
}

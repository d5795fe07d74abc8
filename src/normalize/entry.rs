//! Station entry normalization: wide per-station sheets to long records.

use super::wide::WideSheet;
use crate::config::SheetLayout;
use crate::error::Result;
use crate::models::{EntryRecord, FormatVersion, RawTable};
use crate::names::NameResolver;
use tracing::debug;

/// Reshape one wide entry sheet into one record per (row, hour column)
pub fn normalize_entries(
    table: &RawTable,
    version: FormatVersion,
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Vec<EntryRecord>> {
    let sheet = WideSheet::new(table, version, layout)?;
    let mut records = Vec::with_capacity(table.rows.len() * sheet.hour_columns().len());

    for row in sheet.rows(names) {
        for column in sheet.hour_columns() {
            records.push(EntryRecord {
                date: row.date,
                hour: column.hour,
                station: row.station.clone(),
                ridership: row.count(column.index),
            });
        }
    }

    debug!(
        "Sheet '{}': {} entry records from {} rows",
        table.name,
        records.len(),
        table.rows.len()
    );
    Ok(records)
}

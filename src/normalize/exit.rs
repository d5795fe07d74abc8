//! Exit derivation.
//!
//! Legacy exports carry no exit sheets, so exits are rebuilt by summing pair
//! ridership per destination. Current exports carry dedicated exit sheets
//! which are read directly. Either way every observed (date, station) gets
//! all 24 hours.

use super::pair::pair_matrices;
use super::wide::WideSheet;
use crate::config::SheetLayout;
use crate::error::Result;
use crate::models::{ExitRecord, FormatVersion, HOURS_PER_DAY, RawTable};
use crate::names::NameResolver;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sum pair ridership by destination over every pair matrix of one file.
///
/// Coverage is taken from destination columns regardless of their value, so
/// a station seen only with zero traffic still gets 24 zero-valued hours.
pub fn aggregate_exits(
    tables: &[RawTable],
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Vec<ExitRecord>> {
    let mut totals: BTreeMap<(NaiveDate, String, u8), u64> = BTreeMap::new();
    let mut coverage: BTreeSet<(NaiveDate, String)> = BTreeSet::new();

    let matrices = pair_matrices(tables, layout)?;
    for matrix in &matrices {
        let stations: Vec<(usize, String)> = matrix
            .destinations()
            .iter()
            .map(|&(index, code)| (index, names.canonical_station(names.station_for_code(code))))
            .collect();

        for row in matrix.rows() {
            for (index, station) in &stations {
                coverage.insert((row.date, station.clone()));

                let ridership = row.cell(*index).as_count();
                if ridership > 0 {
                    *totals
                        .entry((row.date, station.clone(), row.hour))
                        .or_insert(0) += ridership;
                }
            }
        }
    }

    let mut records = Vec::with_capacity(coverage.len() * HOURS_PER_DAY as usize);
    for (date, station) in coverage {
        for hour in 0..HOURS_PER_DAY {
            let ridership = totals
                .get(&(date, station.clone(), hour))
                .copied()
                .unwrap_or(0);
            records.push(ExitRecord {
                date,
                hour,
                station: station.clone(),
                ridership,
            });
        }
    }

    debug!(
        "Aggregated {} exit records from {} pair sheet(s)",
        records.len(),
        matrices.len()
    );
    Ok(records)
}

/// Read the dedicated exit sheets of one workbook.
///
/// Hours absent from a sheet count as 0. Rows that canonicalize to the same
/// station on the same date (an interchange listed once per line) are summed,
/// so each station-day still carries exactly 24 records.
pub fn extract_exits<'t>(
    tables: impl IntoIterator<Item = &'t RawTable>,
    version: FormatVersion,
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Vec<ExitRecord>> {
    let mut totals: BTreeMap<(NaiveDate, String), [u64; HOURS_PER_DAY as usize]> =
        BTreeMap::new();
    let mut sheet_count = 0usize;

    for table in tables {
        let sheet = WideSheet::new(table, version, layout)?;
        sheet_count += 1;

        let mut column_for_hour = [None; HOURS_PER_DAY as usize];
        for column in sheet.hour_columns() {
            let slot = &mut column_for_hour[column.hour as usize];
            if slot.is_none() {
                *slot = Some(column.index);
            }
        }

        for row in sheet.rows(names) {
            let counts: Vec<u64> = column_for_hour
                .iter()
                .map(|column| column.map(|index| row.count(index)).unwrap_or(0))
                .collect();
            let hours = totals
                .entry((row.date, row.station))
                .or_insert([0; HOURS_PER_DAY as usize]);
            for (total, count) in hours.iter_mut().zip(counts) {
                *total += count;
            }
        }
    }

    let mut records = Vec::with_capacity(totals.len() * HOURS_PER_DAY as usize);
    for ((date, station), hours) in totals {
        for (hour, ridership) in (0..HOURS_PER_DAY).zip(hours) {
            records.push(ExitRecord {
                date,
                hour,
                station: station.clone(),
                ridership,
            });
        }
    }

    debug!(
        "Extracted {} exit records from {} exit sheet(s)",
        records.len(),
        sheet_count
    );
    Ok(records)
}

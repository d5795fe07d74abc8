//! Normalization engine.
//!
//! Maps each (format version, dataset) combination to the normalizer that
//! handles it. All normalizers are pure functions of the sheets and the
//! name resolver they are given.

pub mod entry;
pub mod exit;
pub mod pair;
mod wide;

pub use entry::normalize_entries;
pub use exit::{aggregate_exits, extract_exits};
pub use pair::{normalize_pair_workbook, normalize_pairs, parse_date_hour};

use crate::config::SheetLayout;
use crate::error::Result;
use crate::models::{Dataset, EntryRecord, ExitRecord, FormatVersion, PairRecord, RawTable};
use crate::names::NameResolver;
use tracing::{debug, warn};

/// Records produced by one normalizer call
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Entries(Vec<EntryRecord>),
    Exits(Vec<ExitRecord>),
    Pairs(Vec<PairRecord>),
}

impl Normalized {
    pub fn dataset(&self) -> Dataset {
        match self {
            Normalized::Entries(_) => Dataset::Entry,
            Normalized::Exits(_) => Dataset::Exit,
            Normalized::Pairs(_) => Dataset::Pair,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Normalized::Entries(records) | Normalized::Exits(records) => records.len(),
            Normalized::Pairs(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sheets whose name carries the role tag
pub fn role_sheets<'a>(sheets: &'a [RawTable], tag: &'a str) -> impl Iterator<Item = &'a RawTable> {
    sheets.iter().filter(move |sheet| sheet.has_role(tag))
}

/// Run the normalizer for `dataset` under `version`.
///
/// For `Dataset::Exit`, V1 means the sheets are pair matrices to aggregate
/// and V2 means the sheets are a station workbook with exit sheets.
pub fn normalize(
    version: FormatVersion,
    dataset: Dataset,
    sheets: &[RawTable],
    layout: &SheetLayout,
    names: &NameResolver,
) -> Result<Normalized> {
    let normalized = match (version, dataset) {
        (FormatVersion::V1, Dataset::Entry) => {
            let records = match sheets.first() {
                Some(sheet) => normalize_entries(sheet, version, layout, names)?,
                None => Vec::new(),
            };
            Normalized::Entries(records)
        }
        (FormatVersion::V2, Dataset::Entry) => {
            let mut records = Vec::new();
            for sheet in role_sheets(sheets, &layout.entry_sheet_tag) {
                records.extend(normalize_entries(sheet, version, layout, names)?);
            }
            Normalized::Entries(records)
        }
        (FormatVersion::V1, Dataset::Exit) => {
            Normalized::Exits(aggregate_exits(sheets, layout, names)?)
        }
        (FormatVersion::V2, Dataset::Exit) => Normalized::Exits(extract_exits(
            role_sheets(sheets, &layout.exit_sheet_tag),
            version,
            layout,
            names,
        )?),
        (_, Dataset::Pair) => {
            Normalized::Pairs(normalize_pair_workbook(sheets, layout, names)?)
        }
    };

    if normalized.is_empty() {
        warn!(
            "No {:?} records produced from {} sheet(s) ({:?})",
            dataset,
            sheets.len(),
            version
        );
    } else {
        debug!("{:?} {:?}: {} records", version, dataset, normalized.len());
    }

    Ok(normalized)
}

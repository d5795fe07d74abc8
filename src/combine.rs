//! Cross-period combination.
//!
//! Concatenates the per-file outputs of each dataset and applies the
//! canonical sort order. Duplicates across periods are kept as they are.

use crate::models::{Dataset, EntryRecord, ExitRecord, PairRecord, StationHourRecord};
use crate::normalize::Normalized;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Canonical ordering of a long-format record
pub trait CanonicalOrder {
    fn canonical_cmp(&self, other: &Self) -> Ordering;
}

impl CanonicalOrder for StationHourRecord {
    /// (Date, Station, Hour)
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        (self.date, self.station.as_str(), self.hour).cmp(&(
            other.date,
            other.station.as_str(),
            other.hour,
        ))
    }
}

impl CanonicalOrder for PairRecord {
    /// (Date, Hour, Origin Station, Destination Station)
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        (
            self.date,
            self.hour,
            self.origin_station.as_str(),
            self.destination_station.as_str(),
        )
            .cmp(&(
                other.date,
                other.hour,
                other.origin_station.as_str(),
                other.destination_station.as_str(),
            ))
    }
}

/// Concatenate per-period sequences and sort them by the canonical key
pub fn combine<R: CanonicalOrder>(dataset: Dataset, parts: Vec<Vec<R>>) -> Vec<R> {
    let part_count = parts.len();
    let mut records: Vec<R> = parts.into_iter().flatten().collect();
    records.sort_by(|a, b| a.canonical_cmp(b));

    let duplicates = records
        .windows(2)
        .filter(|pair| pair[0].canonical_cmp(&pair[1]) == Ordering::Equal)
        .count();
    if duplicates > 0 {
        warn!(
            "{:?}: {} records share a key with their predecessor (kept as-is)",
            dataset, duplicates
        );
    }

    debug!(
        "{:?}: combined {} part(s) into {} records",
        dataset,
        part_count,
        records.len()
    );
    records
}

/// Collects normalizer outputs until every file has been processed
#[derive(Debug, Default)]
pub struct Combiner {
    entries: Vec<Vec<EntryRecord>>,
    exits: Vec<Vec<ExitRecord>>,
    pairs: Vec<Vec<PairRecord>>,
}

/// Final sorted datasets
#[derive(Debug, Default)]
pub struct CombinedOutput {
    pub entries: Vec<EntryRecord>,
    pub exits: Vec<ExitRecord>,
    pub pairs: Vec<PairRecord>,
}

impl Combiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, normalized: Normalized) {
        match normalized {
            Normalized::Entries(records) => self.entries.push(records),
            Normalized::Exits(records) => self.exits.push(records),
            Normalized::Pairs(records) => self.pairs.push(records),
        }
    }

    pub fn finish(self) -> CombinedOutput {
        CombinedOutput {
            entries: combine(Dataset::Entry, self.entries),
            exits: combine(Dataset::Exit, self.exits),
            pairs: combine(Dataset::Pair, self.pairs),
        }
    }
}

//! Raw file discovery.
//!
//! Finds station and pair exports in the raw directory and groups them into
//! periods by the label that follows their file name prefix:
//!
//! ```text
//! raw/
//!   station-codes.csv
//!   station-names.csv
//!   station-hourly-2025-08.xlsx       period "2025-08"
//!   stationpair-hourly-2025-08.xlsx   period "2025-08"
//!   station-hourly-2025-09.xlsx       period "2025-09"
//!   station-hourly.xlsx               period "all"
//! ```

use crate::config::PipelineConfig;
use crate::error::{Result, RidershipError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Label of a file whose stem is exactly the prefix
pub const DEFAULT_PERIOD: &str = "all";

/// Raw exports belonging to one reporting period
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Period {
    pub label: String,
    pub station_file: Option<PathBuf>,
    pub pair_file: Option<PathBuf>,
}

impl Period {
    pub fn file_count(&self) -> usize {
        usize::from(self.station_file.is_some()) + usize::from(self.pair_file.is_some())
    }
}

/// Period label of a file: its stem minus the prefix and separators
pub fn period_label(path: &Path, prefix: &str) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix(prefix)?;
    let label = rest.trim_start_matches(['-', '_', ' ']);
    Some(if label.is_empty() {
        DEFAULT_PERIOD.to_string()
    } else {
        label.to_string()
    })
}

/// File discovery component for the raw directory
#[derive(Debug)]
pub struct FileDiscovery {
    raw_dir: PathBuf,
    station_prefix: String,
    pair_prefix: String,
    extensions: Vec<String>,
}

impl FileDiscovery {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            raw_dir: config.raw_dir.clone(),
            station_prefix: config.station_file_prefix.clone(),
            pair_prefix: config.pair_file_prefix.clone(),
            extensions: config.extensions.clone(),
        }
    }

    /// Discover all periods, ordered by label
    pub fn discover_periods(&self) -> Result<Vec<Period>> {
        if !self.raw_dir.is_dir() {
            return Err(RidershipError::RawDirectoryNotFound {
                path: self.raw_dir.clone(),
            });
        }

        let mut periods: BTreeMap<String, Period> = BTreeMap::new();

        for path in self.matching_files(&self.station_prefix)? {
            let Some(label) = period_label(&path, &self.station_prefix) else {
                continue;
            };
            let period = periods.entry(label.clone()).or_insert_with(|| Period {
                label,
                ..Default::default()
            });
            if let Some(existing) = &period.station_file {
                warn!(
                    "Period '{}' has several station files, ignoring {} (keeping {})",
                    period.label,
                    path.display(),
                    existing.display()
                );
                continue;
            }
            period.station_file = Some(path);
        }

        for path in self.matching_files(&self.pair_prefix)? {
            let Some(label) = period_label(&path, &self.pair_prefix) else {
                continue;
            };
            let period = periods.entry(label.clone()).or_insert_with(|| Period {
                label,
                ..Default::default()
            });
            if let Some(existing) = &period.pair_file {
                warn!(
                    "Period '{}' has several pair files, ignoring {} (keeping {})",
                    period.label,
                    path.display(),
                    existing.display()
                );
                continue;
            }
            period.pair_file = Some(path);
        }

        let periods: Vec<Period> = periods.into_values().collect();
        debug!(
            "Discovered {} period(s) in {}",
            periods.len(),
            self.raw_dir.display()
        );
        Ok(periods)
    }

    /// Files named `<prefix>*.<ext>` for every accepted extension, sorted
    fn matching_files(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for extension in &self.extensions {
            let pattern = self.raw_dir.join(format!("{}*.{}", prefix, extension));
            let pattern_str = pattern.to_string_lossy();
            debug!("Searching for raw files with pattern: {}", pattern_str);

            let entries = glob::glob(&pattern_str).map_err(|e| RidershipError::Configuration {
                message: format!("Invalid file pattern '{}': {}", pattern_str, e),
            })?;

            for entry in entries {
                match entry {
                    // Office lock files ("~$station-hourly.xlsx") never match the prefix
                    Ok(path) if path.is_file() => files.push(path),
                    Ok(_) => {}
                    Err(e) => warn!("Unreadable path while scanning raw directory: {}", e),
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

//! Station name resolution.
//!
//! Loads the two independent mapping tables (station code to name and
//! alternate name to name) and canonicalizes the station labels found in
//! raw sheets. Missing or malformed tables degrade to identity lookups.

use crate::config::PipelineConfig;
use crate::error::{Result, RidershipError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Header of the value column shared by both mapping tables
const NAME_COLUMN: &str = "name";

/// Key column of the station code table
pub const CODE_COLUMN: &str = "code";

/// Key column of the alternate name table
pub const ALT_NAME_COLUMN: &str = "alt_name";

/// Immutable string lookup with identity fallback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMap {
    entries: HashMap<String, String>,
}

/// Station code to canonical name
pub type StationCodeMap = NameMap;

/// Alternate or legacy label to canonical name
pub type OldNameMap = NameMap;

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Mapped value for `key`, or `key` itself when unmapped
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a delimited two-column table keyed by `key_column`
    pub fn from_reader<R: Read>(reader: R, key_column: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let key_index = headers
            .iter()
            .position(|h| h == key_column)
            .ok_or_else(|| RidershipError::MissingColumn {
                sheet: "mapping table".to_string(),
                column: key_column.to_string(),
            })?;
        let name_index = headers
            .iter()
            .position(|h| h == NAME_COLUMN)
            .ok_or_else(|| RidershipError::MissingColumn {
                sheet: "mapping table".to_string(),
                column: NAME_COLUMN.to_string(),
            })?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let (Some(key), Some(name)) = (record.get(key_index), record.get(name_index)) else {
                continue;
            };
            if key.is_empty() || name.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), name.to_string());
        }

        Ok(Self { entries })
    }

    /// Load a mapping table, substituting an empty map on any failure
    pub fn load_or_empty(path: &Path, key_column: &str, delimiter: u8) -> Self {
        let loaded = File::open(path)
            .map_err(|_| RidershipError::FileUnavailable {
                path: path.to_path_buf(),
            })
            .and_then(|file| Self::from_reader(file, key_column, delimiter));

        match loaded {
            Ok(map) => {
                info!(
                    "Loaded {} '{}' mappings from {}",
                    map.len(),
                    key_column,
                    path.display()
                );
                map
            }
            Err(e) => {
                warn!(
                    "Could not load station mapping from {}: {}; falling back to identity",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }
}

/// Both station mappings, constructed once per run and shared by reference
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    station_codes: StationCodeMap,
    old_names: OldNameMap,
}

impl NameResolver {
    pub fn new(station_codes: StationCodeMap, old_names: OldNameMap) -> Self {
        Self {
            station_codes,
            old_names,
        }
    }

    /// Load both mapping tables named by the configuration
    pub fn load(config: &PipelineConfig) -> Self {
        let station_codes = NameMap::load_or_empty(
            &config.station_codes_path(),
            CODE_COLUMN,
            config.mapping_delimiter,
        );
        let old_names = NameMap::load_or_empty(
            &config.station_names_path(),
            ALT_NAME_COLUMN,
            config.mapping_delimiter,
        );
        Self::new(station_codes, old_names)
    }

    /// Station name for a station code
    pub fn station_for_code<'a>(&'a self, code: &'a str) -> &'a str {
        self.station_codes.resolve(code)
    }

    /// Canonical station name for a raw station label.
    ///
    /// "LINE-Name" labels keep only the part after the first hyphen, then the
    /// alternate name table is applied. Idempotent only for canonical names
    /// without a hyphen.
    pub fn canonical_station(&self, label: &str) -> String {
        let working = match label.split_once('-') {
            Some((_, rest)) => rest.trim(),
            None => label.trim(),
        };
        self.old_names.resolve(working).to_string()
    }
}

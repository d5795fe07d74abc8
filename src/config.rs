//! Configuration management.
//!
//! Provides the pipeline configuration: input discovery patterns, mapping
//! table locations, raw sheet layout labels and output settings.

use crate::error::{Result, RidershipError};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = RidershipError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(RidershipError::Configuration {
                message: format!(
                    "Unknown compression '{}', expected snappy, zstd, lz4 or none",
                    other
                ),
            }),
        }
    }
}

/// Column and sheet labels used to read the wide raw sheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Date column of station sheets, date-hour column of pair sheets
    pub date_column: String,

    /// Station label column (origin station on pair sheets)
    pub station_column: String,

    /// Sheet name substring marking entry sheets in V2 workbooks
    pub entry_sheet_tag: String,

    /// Sheet name substring marking exit sheets in V2 workbooks
    pub exit_sheet_tag: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            date_column: "BUSINESS DATE".to_string(),
            station_column: "STATION".to_string(),
            entry_sheet_tag: "Entry".to_string(),
            exit_sheet_tag: "Exit".to_string(),
        }
    }
}

/// Global configuration for a normalization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the raw exports and mapping tables
    pub raw_dir: PathBuf,

    /// Directory receiving the normalized outputs
    pub output_dir: PathBuf,

    /// File name prefix of per-station workbooks
    pub station_file_prefix: String,

    /// File name prefix of station-pair workbooks
    pub pair_file_prefix: String,

    /// Accepted raw file extensions
    pub extensions: Vec<String>,

    /// Station code to name mapping, relative to `raw_dir`
    pub station_codes_file: PathBuf,

    /// Alternate name to name mapping, relative to `raw_dir`
    pub station_names_file: PathBuf,

    /// Field delimiter of both mapping tables
    pub mapping_delimiter: u8,

    /// Raw sheet labels
    pub layout: SheetLayout,

    /// Parquet compression
    pub compression: CompressionAlgorithm,

    /// Field separator of the zipped CSV outputs
    pub csv_separator: u8,

    /// Normalize and report without writing outputs
    pub dry_run: bool,

    /// Show a progress bar while processing files
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw"),
            output_dir: PathBuf::from("data"),
            station_file_prefix: "station-hourly".to_string(),
            pair_file_prefix: "stationpair-hourly".to_string(),
            extensions: vec![
                "xlsx".to_string(),
                "xlsm".to_string(),
                "xls".to_string(),
                "csv".to_string(),
            ],
            station_codes_file: PathBuf::from("station-codes.csv"),
            station_names_file: PathBuf::from("station-names.csv"),
            mapping_delimiter: b';',
            layout: SheetLayout::default(),
            compression: CompressionAlgorithm::Snappy,
            csv_separator: b';',
            dry_run: false,
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    /// Set the raw input directory
    pub fn with_raw_dir(mut self, raw_dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = raw_dir.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Enable dry run mode
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Full path of the station code mapping table
    pub fn station_codes_path(&self) -> PathBuf {
        self.raw_dir.join(&self.station_codes_file)
    }

    /// Full path of the alternate name mapping table
    pub fn station_names_path(&self) -> PathBuf {
        self.raw_dir.join(&self.station_names_file)
    }

    /// Check settings that would make every file fail
    pub fn validate(&self) -> Result<()> {
        if self.station_file_prefix.is_empty() || self.pair_file_prefix.is_empty() {
            return Err(RidershipError::Configuration {
                message: "Station and pair file prefixes must not be empty".to_string(),
            });
        }
        if self.station_file_prefix == self.pair_file_prefix {
            return Err(RidershipError::Configuration {
                message: format!(
                    "Station and pair file prefixes must differ (both '{}')",
                    self.station_file_prefix
                ),
            });
        }
        if self.extensions.is_empty() {
            return Err(RidershipError::Configuration {
                message: "At least one raw file extension is required".to_string(),
            });
        }
        if self.layout.date_column == self.layout.station_column {
            return Err(RidershipError::Configuration {
                message: "Date and station columns must differ".to_string(),
            });
        }
        Ok(())
    }
}

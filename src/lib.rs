//! Ridership Normalizer Library
//!
//! Converts wide-format hourly metro ridership exports (Excel workbooks or
//! CSV) into sorted long-format datasets written as zipped CSV and Apache
//! Parquet.
//!
//! This library provides tools for:
//! - Detecting the legacy and current export layouts from their headers
//! - Reshaping station entry, station exit and station pair sheets
//! - Deriving hourly exits from pair matrices when no exit sheet exists
//! - Resolving station codes and retired station names
//! - Combining reporting periods into one canonical ordering

pub mod cli;
pub mod combine;
pub mod config;
pub mod error;
pub mod models;
pub mod names;
pub mod normalize;
pub mod processor;
pub mod reader;
pub mod schema;

// Re-export commonly used types
pub use config::{CompressionAlgorithm, PipelineConfig, SheetLayout};
pub use error::{Result, RidershipError};
pub use models::{
    Dataset, EntryRecord, ExitRecord, FormatVersion, PairRecord, ProcessingStats,
    StationHourRecord,
};
pub use names::NameResolver;
pub use processor::Pipeline;

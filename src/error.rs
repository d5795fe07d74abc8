//! Error handling for ridership normalization.
//!
//! Provides error types with context for workbook reading, mapping table
//! loading, normalization and output persistence failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RidershipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to read workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    #[error("Input file not found: {path}")]
    FileUnavailable { path: PathBuf },

    #[error("Raw directory not found: {path}")]
    RawDirectoryNotFound { path: PathBuf },

    #[error("No recognizable hour columns in sheet '{sheet}'")]
    UnrecognizedFormat { sheet: String },

    #[error("Missing required column '{column}' in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, RidershipError>;

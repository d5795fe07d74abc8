//! Output writing for normalized datasets.
//!
//! Each dataset is written twice into the output directory: a zipped,
//! semicolon-separated CSV (`<name>.csv.zip` holding `<name>.csv`) and a
//! Parquet file (`<name>.parquet`).

use crate::config::{CompressionAlgorithm, PipelineConfig};
use crate::error::{Result, RidershipError};
use crate::models::{Dataset, PairRecord, StationHourRecord};

use chrono::{Datelike, NaiveDate};
use polars::prelude::{
    Column, CsvWriter, DataFrame, DataType, ParquetWriter as PolarsParquetWriter, SerWriter,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Column> {
    let days: Vec<i32> = dates.map(epoch_days).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

fn hour_column(name: &str, hours: impl Iterator<Item = u8>) -> Column {
    let hours: Vec<i32> = hours.map(i32::from).collect();
    Column::new(name.into(), hours)
}

/// Build the output frame of a station-hour dataset (entries or exits)
pub fn station_frame(dataset: Dataset, records: &[StationHourRecord]) -> Result<DataFrame> {
    let [date, hour, station, ridership] = dataset.columns() else {
        return Err(RidershipError::Configuration {
            message: format!("{:?} is not a station-hour dataset", dataset),
        });
    };

    let stations: Vec<&str> = records.iter().map(|r| r.station.as_str()).collect();
    let ridership_values: Vec<u64> = records.iter().map(|r| r.ridership).collect();

    let df = DataFrame::new(vec![
        date_column(date, records.iter().map(|r| r.date))?,
        hour_column(hour, records.iter().map(|r| r.hour)),
        Column::new((*station).into(), stations),
        Column::new((*ridership).into(), ridership_values),
    ])?;
    Ok(df)
}

/// Build the output frame of the pair dataset
pub fn pair_frame(records: &[PairRecord]) -> Result<DataFrame> {
    let [date, hour, origin, destination, ridership] = Dataset::Pair.columns() else {
        return Err(RidershipError::Configuration {
            message: "Unexpected pair column layout".to_string(),
        });
    };

    let origins: Vec<&str> = records.iter().map(|r| r.origin_station.as_str()).collect();
    let destinations: Vec<&str> = records
        .iter()
        .map(|r| r.destination_station.as_str())
        .collect();
    let ridership_values: Vec<u64> = records.iter().map(|r| r.ridership).collect();

    let df = DataFrame::new(vec![
        date_column(date, records.iter().map(|r| r.date))?,
        hour_column(hour, records.iter().map(|r| r.hour)),
        Column::new((*origin).into(), origins),
        Column::new((*destination).into(), destinations),
        Column::new((*ridership).into(), ridership_values),
    ])?;
    Ok(df)
}

/// Writes dataset frames as zipped CSV and Parquet
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    compression: CompressionAlgorithm,
    separator: u8,
}

impl OutputWriter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            compression: config.compression,
            separator: config.csv_separator,
        }
    }

    pub fn csv_zip_path(&self, dataset: Dataset) -> PathBuf {
        self.output_dir
            .join(format!("{}.csv.zip", dataset.output_name()))
    }

    pub fn parquet_path(&self, dataset: Dataset) -> PathBuf {
        self.output_dir
            .join(format!("{}.parquet", dataset.output_name()))
    }

    /// Write both artifacts of a dataset and return their paths.
    ///
    /// Empty datasets are skipped and produce no files.
    pub fn write(&self, dataset: Dataset, mut df: DataFrame) -> Result<Vec<PathBuf>> {
        if df.height() == 0 {
            warn!("{:?} dataset is empty, skipping output", dataset);
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.output_dir)?;

        let csv_path = self.csv_zip_path(dataset);
        self.write_csv_zip(dataset, &mut df, &csv_path)?;

        let parquet_path = self.parquet_path(dataset);
        self.write_parquet(&mut df, &parquet_path)?;

        info!(
            "Wrote {} {:?} rows to {} and {}",
            df.height(),
            dataset,
            csv_path.display(),
            parquet_path.display()
        );
        Ok(vec![csv_path, parquet_path])
    }

    fn write_csv_zip(&self, dataset: Dataset, df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .with_separator(self.separator)
            .finish(df)
            .map_err(|e| RidershipError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to serialize CSV: {}", e),
            })?;

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(format!("{}.csv", dataset.output_name()), options)?;
        zip.write_all(&buffer)?;
        zip.finish()?;

        debug!("CSV archive written: {} ({} bytes raw)", path.display(), buffer.len());
        Ok(())
    }

    fn write_parquet(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .finish(df)
            .map_err(|e| RidershipError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write parquet: {}", e),
            })?;

        debug!("Parquet written: {}", path.display());
        Ok(())
    }
}

//! Main processing engine.
//!
//! Orchestrates the ridership pipeline: mapping table loading, period
//! discovery, per-file normalization, cross-period combination and output
//! writing.

pub mod discovery;
pub mod writer;

#[cfg(test)]
mod tests;

use self::discovery::{FileDiscovery, Period};
use self::writer::{OutputWriter, pair_frame, station_frame};

use crate::combine::{CombinedOutput, Combiner};
use crate::config::PipelineConfig;
use crate::error::{Result, RidershipError};
use crate::models::{Dataset, FormatVersion, ProcessingStats};
use crate::names::NameResolver;
use crate::normalize::{Normalized, normalize, role_sheets};
use crate::reader::load_workbook;
use crate::schema::detect_workbook_format;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs the complete normalization workflow for one raw directory
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    discovery: FileDiscovery,
    writer: OutputWriter,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration and raw directory
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        if !config.raw_dir.is_dir() {
            return Err(RidershipError::RawDirectoryNotFound {
                path: config.raw_dir.clone(),
            });
        }

        Ok(Self {
            discovery: FileDiscovery::new(&config),
            writer: OutputWriter::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Main processing entry point
    pub fn run(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        let names = NameResolver::load(&self.config);
        let periods = self.discovery.discover_periods()?;
        stats.periods = periods.len();
        info!(
            "Found {} period(s) in {}",
            periods.len(),
            self.config.raw_dir.display()
        );

        let total_files: usize = periods.iter().map(Period::file_count).sum();
        let progress = self.progress_bar(total_files as u64);

        let mut combiner = Combiner::new();
        for period in &periods {
            self.process_period(period, &names, &mut combiner, &mut stats, &progress);
        }
        progress.finish_and_clear();

        let combined = combiner.finish();
        stats.entry_rows = combined.entries.len();
        stats.exit_rows = combined.exits.len();
        stats.pair_rows = combined.pairs.len();

        if self.config.dry_run {
            info!(
                "Dry run: skipping output for {} rows",
                stats.total_rows()
            );
        } else {
            stats.output_paths = self.write_outputs(&combined)?;
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        Ok(stats)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Process the station and pair files of one period.
    ///
    /// A failing file is counted and skipped; it never aborts the run.
    fn process_period(
        &self,
        period: &Period,
        names: &NameResolver,
        combiner: &mut Combiner,
        stats: &mut ProcessingStats,
        progress: &ProgressBar,
    ) {
        let mut has_exits = false;

        match &period.station_file {
            Some(path) => {
                progress.set_message(format!("{} (stations)", period.label));
                match self.process_station_file(path, names) {
                    Ok(outputs) => {
                        for normalized in outputs {
                            has_exits |= normalized.dataset() == Dataset::Exit;
                            combiner.push(normalized);
                        }
                        stats.files_processed += 1;
                    }
                    Err(e) => {
                        error!("Failed to process {}: {}", path.display(), e);
                        stats.files_failed += 1;
                    }
                }
                progress.inc(1);
            }
            None => info!("Period '{}' has no station file", period.label),
        }

        match &period.pair_file {
            Some(path) => {
                progress.set_message(format!("{} (pairs)", period.label));
                match self.process_pair_file(path, names, !has_exits) {
                    Ok(outputs) => {
                        for normalized in outputs {
                            combiner.push(normalized);
                        }
                        stats.files_processed += 1;
                    }
                    Err(e) => {
                        error!("Failed to process {}: {}", path.display(), e);
                        stats.files_failed += 1;
                    }
                }
                progress.inc(1);
            }
            None => {
                info!("Period '{}' has no pair file", period.label);
                if !has_exits {
                    info!("Period '{}' has no exit data", period.label);
                }
            }
        }
    }

    /// Entries, plus exits when the workbook carries exit sheets
    fn process_station_file(&self, path: &Path, names: &NameResolver) -> Result<Vec<Normalized>> {
        let layout = &self.config.layout;
        let sheets = load_workbook(path)?;
        let version = detect_workbook_format(&sheets);
        debug!("{}: {:?} layout, {} sheet(s)", path.display(), version, sheets.len());

        let mut outputs = vec![normalize(version, Dataset::Entry, &sheets, layout, names)?];

        if version == FormatVersion::V2
            && role_sheets(&sheets, &layout.exit_sheet_tag).next().is_some()
        {
            outputs.push(normalize(version, Dataset::Exit, &sheets, layout, names)?);
        }

        Ok(outputs)
    }

    /// Pairs, plus exits aggregated from them when requested
    fn process_pair_file(
        &self,
        path: &Path,
        names: &NameResolver,
        derive_exits: bool,
    ) -> Result<Vec<Normalized>> {
        let layout = &self.config.layout;
        let sheets = load_workbook(path)?;
        let version = detect_workbook_format(&sheets);

        let mut outputs = vec![normalize(version, Dataset::Pair, &sheets, layout, names)?];

        if derive_exits {
            debug!("{}: deriving exits from pair data", path.display());
            outputs.push(normalize(
                FormatVersion::V1,
                Dataset::Exit,
                &sheets,
                layout,
                names,
            )?);
        }

        Ok(outputs)
    }

    fn write_outputs(&self, combined: &CombinedOutput) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        let entries = station_frame(Dataset::Entry, &combined.entries)?;
        paths.extend(self.writer.write(Dataset::Entry, entries)?);

        let exits = station_frame(Dataset::Exit, &combined.exits)?;
        paths.extend(self.writer.write(Dataset::Exit, exits)?);

        let pairs = pair_frame(&combined.pairs)?;
        paths.extend(self.writer.write(Dataset::Pair, pairs)?);

        Ok(paths)
    }
}

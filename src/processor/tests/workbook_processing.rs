//! Pipeline tests over generated Excel workbooks

use super::Value::{Date, Number, Text};
use super::{STATION_CODES, STATION_NAMES, Value, write, write_workbook};
use crate::config::PipelineConfig;
use crate::processor::Pipeline;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn read_zipped_csv(path: &Path) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive.by_index(0).unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    contents
}

fn config_for(temp_dir: &TempDir) -> PipelineConfig {
    PipelineConfig::default()
        .with_raw_dir(temp_dir.path().join("raw"))
        .with_output_dir(temp_dir.path().join("data"))
        .without_progress()
}

fn raw_dir_with_mappings(temp_dir: &TempDir) -> PathBuf {
    let raw = temp_dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    write(&raw, "station-codes.csv", STATION_CODES);
    write(&raw, "station-names.csv", STATION_NAMES);
    raw
}

fn day(y: i32, m: u32, d: u32) -> Value<'static> {
    Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn notes_sheet() -> (&'static str, Vec<Vec<Value<'static>>>) {
    (
        "Notes",
        vec![vec![Text("Remarks")], vec![Text("Provisional figures")]],
    )
}

/// Pair workbook with one matrix sheet (MJ to BN, 12 riders) and a notes sheet
fn write_pair_workbook(path: &Path, label: &str) {
    write_workbook(
        path,
        &[
            (
                "Sheet1",
                vec![
                    vec![Text("BUSINESS DATE"), Text("STATION"), Text("BN")],
                    vec![Text(label), Text("MJ"), Number(12.0)],
                ],
            ),
            notes_sheet(),
        ],
    );
}

#[test]
fn test_current_workbook_extracts_exits_directly() {
    let temp_dir = TempDir::new().unwrap();
    let raw = raw_dir_with_mappings(&temp_dir);

    write_workbook(
        &raw.join("station-hourly-2025-09.xlsx"),
        &[
            (
                "Entry",
                vec![
                    vec![
                        Text("BUSINESS DATE"),
                        Text("STATION"),
                        Text("H00"),
                        Text("H08"),
                        Text("TOTAL"),
                    ],
                    vec![
                        day(2025, 9, 1),
                        Text("BLUE-Majestic"),
                        Number(1.0),
                        Number(2.0),
                        Number(3.0),
                    ],
                ],
            ),
            (
                "Exit",
                vec![
                    vec![Text("BUSINESS DATE"), Text("STATION"), Text("H08"), Text("TOTAL")],
                    vec![day(2025, 9, 1), Text("PURPLE-Majestic"), Number(4.0), Number(4.0)],
                    vec![day(2025, 9, 1), Text("GREEN-Majestic"), Number(6.0), Number(6.0)],
                ],
            ),
            notes_sheet(),
        ],
    );
    write_pair_workbook(
        &raw.join("stationpair-hourly-2025-09.xlsx"),
        "2025-09-01 08Hrs-09hrs",
    );

    let stats = Pipeline::new(config_for(&temp_dir)).unwrap().run().unwrap();

    assert_eq!(stats.periods, 1);
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.entry_rows, 2);
    assert_eq!(stats.pair_rows, 1);
    // One interchange station, 24 hours
    assert_eq!(stats.exit_rows, 24);

    let data = temp_dir.path().join("data");
    let entries = read_zipped_csv(&data.join("station-hourly.csv.zip"));
    assert!(entries.contains("2025-09-01;0;Majestic;1"));
    assert!(entries.contains("2025-09-01;8;Majestic;2"));

    // Exit sheets win over aggregation from the pair workbook
    let exits = read_zipped_csv(&data.join("station-exit-hourly.csv.zip"));
    assert!(exits.contains("2025-09-01;8;Majestic;10"));
    assert!(!exits.contains("Baiyappanahalli"));
}

#[test]
fn test_legacy_workbook_aggregates_exits_from_pairs() {
    let temp_dir = TempDir::new().unwrap();
    let raw = raw_dir_with_mappings(&temp_dir);

    write_workbook(
        &raw.join("station-hourly-2025-08.xlsx"),
        &[(
            "Sheet1",
            vec![
                vec![
                    Text("BUSINESS DATE"),
                    Text("STATION"),
                    Text("08:00 Hrs To 09:00 Hrs"),
                ],
                vec![day(2025, 8, 1), Text("BLUE-Kempegowda"), Number(5.0)],
            ],
        )],
    );
    write_pair_workbook(
        &raw.join("stationpair-hourly-2025-08.xlsx"),
        "2025-08-01 08Hrs-09hrs",
    );

    let stats = Pipeline::new(config_for(&temp_dir)).unwrap().run().unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.entry_rows, 1);
    assert_eq!(stats.pair_rows, 1);
    assert_eq!(stats.exit_rows, 24);

    let data = temp_dir.path().join("data");
    let entries = read_zipped_csv(&data.join("station-hourly.csv.zip"));
    assert!(entries.contains("2025-08-01;8;Majestic;5"));

    let exits = read_zipped_csv(&data.join("station-exit-hourly.csv.zip"));
    assert!(exits.contains("2025-08-01;8;Baiyappanahalli;12"));
    assert!(!exits.contains("Majestic"));
}

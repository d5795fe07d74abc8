//! Schema revision detection and hour column recognition.
//!
//! The two export revisions differ only in how the hour columns are labelled,
//! so both detection and hour extraction live here.

use crate::models::{FormatVersion, HOURS_PER_DAY, RawTable};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// "00:00 Hrs To 01:00 Hrs", "23:00 Hrs To Last train"
static RANGE_LABEL_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}):00 Hrs").expect("Invalid hour range regex"));

static HOUR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^H\d{2}$").expect("Invalid hour token regex"));

/// A recognised hour column of a wide sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourColumn {
    pub index: usize,
    pub hour: u8,
}

/// Classify a header row. Any H-token column means V2, anything else is V1.
pub fn detect_format<S: AsRef<str>>(headers: &[S]) -> FormatVersion {
    if headers
        .iter()
        .any(|header| HOUR_TOKEN.is_match(header.as_ref().trim()))
    {
        FormatVersion::V2
    } else {
        FormatVersion::V1
    }
}

/// Classify a workbook from its first sheet's header row
pub fn detect_workbook_format(sheets: &[RawTable]) -> FormatVersion {
    let version = sheets
        .first()
        .map(|sheet| detect_format(&sheet.headers))
        .unwrap_or(FormatVersion::V1);
    debug!("Detected format {:?} from {} sheet(s)", version, sheets.len());
    version
}

impl FormatVersion {
    /// Hour encoded by a column label under this revision, if any
    pub fn hour_from_column(self, label: &str) -> Option<u8> {
        let hour = match self {
            FormatVersion::V1 => RANGE_LABEL_HOUR
                .captures(label)
                .and_then(|caps| caps[1].parse::<u8>().ok())?,
            FormatVersion::V2 => {
                let digits = label.strip_prefix('H')?;
                if label.chars().count() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                digits.parse::<u8>().ok()?
            }
        };

        (hour < HOURS_PER_DAY).then_some(hour)
    }
}

/// Recognised hour columns of a sheet, skipping the excluded positions
pub fn hour_columns(table: &RawTable, version: FormatVersion, exclude: &[usize]) -> Vec<HourColumn> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(index, _)| !exclude.contains(index))
        .filter_map(|(index, label)| match version.hour_from_column(label) {
            Some(hour) => Some(HourColumn { index, hour }),
            None => {
                debug!("Ignoring column '{}' in sheet '{}'", label, table.name);
                None
            }
        })
        .collect()
}

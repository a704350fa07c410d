//! Core data structures for Leica export processing.
//!
//! Defines the typed measurement records produced by the parsers, the merged
//! output record, the per-station batch that forms the unit of concurrent
//! work, and run statistics.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{LeicaError, Result};

/// Timestamp layout used by Leica exports: date and time columns joined
/// with a single space.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One repetition-round observation from an angle-type export (`.TPT`
/// horizontal variant or `.TZT` zenith variant; both share the row format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleMeasurement {
    /// Station identifier from the export header.
    pub station_id: String,
    /// Instrument height, kept verbatim so join keys compare exactly as
    /// written in the files.
    pub instrument_height: String,
    /// 1-based repetition round number.
    pub round: u32,
    pub target_name: String,
    /// Face-left reading.
    pub face_left: String,
    /// Face-right reading.
    pub face_right: String,
    /// Fields after the two readings. The zenith variant carries the target
    /// height as the first of these.
    pub extra: Vec<String>,
    pub date: String,
    pub time: String,
}

impl AngleMeasurement {
    /// Round number rendered the way distance exports write it: unpadded
    /// decimal. Used for join-key comparison against [`DistanceMeasurement`].
    pub fn round_label(&self) -> String {
        self.round.to_string()
    }
}

/// One slope-distance observation from a distance-type export (`.TXT`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceMeasurement {
    pub station_id: String,
    pub instrument_height: String,
    /// Round label kept verbatim from the file.
    pub round: String,
    pub target_name: String,
    /// `None` when the source row has no distance field; surfaces as a merge
    /// gap rather than an error.
    pub slope_distance: Option<String>,
    pub date: String,
    pub time: String,
}

/// The canonical 12-column output row: one angle observation joined with its
/// zenith and distance counterparts.
///
/// `Option` fields are merge gaps: a key with no zenith or distance match
/// degrades per-field instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub station_id: String,
    pub instrument_height: String,
    pub round: u32,
    pub target_name: String,
    pub target_height: Option<String>,
    pub hz_left: String,
    pub hz_right: String,
    pub zenith_left: Option<String>,
    pub zenith_right: Option<String>,
    pub slope_distance: Option<String>,
    pub date: String,
    pub time: String,
}

impl MergedRecord {
    /// Parse the record's date and time into a sortable timestamp.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        let combined = format!("{} {}", self.date, self.time);
        NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT).map_err(|e| {
            LeicaError::data_integrity(
                &self.station_id,
                format!("unparsable timestamp '{}': {}", combined, e),
            )
        })
    }
}

/// Ordered merged records for one station triple.
///
/// Created by one worker, never mutated after the concurrent phase; the
/// runner orders batches globally by the timestamp of their first record.
#[derive(Debug, Clone)]
pub struct StationBatch {
    /// Station directory name the triple was discovered under.
    pub station: String,
    pub records: Vec<MergedRecord>,
}

impl StationBatch {
    /// Timestamp of the first merged record, used for global batch ordering.
    ///
    /// An empty batch or an unparsable timestamp is fatal to the run.
    pub fn first_timestamp(&self) -> Result<NaiveDateTime> {
        let first = self.records.first().ok_or_else(|| {
            LeicaError::data_integrity(&self.station, "batch has no records to order by")
        })?;
        first.timestamp()
    }
}

/// Statistics for one extraction run.
#[derive(Debug, Default)]
pub struct ExtractionStats {
    /// Station directories found during discovery, complete or not.
    pub stations_discovered: usize,
    /// Stations with a complete file triple that were processed.
    pub stations_processed: usize,
    /// Stations skipped because one of the three files was missing.
    pub stations_skipped: usize,
    /// Total merged records across all batches.
    pub records_merged: usize,
    /// Peak number of workers holding an admission slot at once.
    pub max_in_flight: usize,
    pub processing_time: std::time::Duration,
    pub output_path: PathBuf,
}

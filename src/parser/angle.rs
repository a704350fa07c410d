//! Angle-type export parsing (`.TPT` horizontal and `.TZT` zenith files).
//!
//! The export declares its own shape in the station row: field 1 is the
//! total number of repetition rounds, field 2 the declared per-round row
//! count. Each round block in the body is preceded by a single-field
//! separator row carrying the round number; separators are positional
//! markers, not data.

use std::path::Path;

use tracing::debug;

use super::{parse_header, read_rows};
use crate::error::{LeicaError, Result};
use crate::models::AngleMeasurement;

/// Token index of the time entry in the angle-layout date/time row.
const TIME_TOKEN_INDEX: usize = 2;

/// Parse one angle-type export into an ordered sequence of measurements.
///
/// The output holds exactly `min(total_rounds * rows_per_round, body_len)`
/// records, each tagged with its 1-based round number; body rows beyond the
/// declared capacity are silently dropped. Re-parsing the same file yields an
/// identical sequence.
pub fn parse_angle_file(path: &Path) -> Result<Vec<AngleMeasurement>> {
    let rows = read_rows(path)?;
    let header = parse_header(path, &rows, TIME_TOKEN_INDEX)?;

    let total_rounds = numeric_header_field(path, &rows[0], 1, "total rounds")?;
    let declared_rows = numeric_header_field(path, &rows[0], 2, "row count")?;
    // The declared count is one short of the actual block size in Leica
    // round exports.
    let rows_per_round = declared_rows as usize + 1;

    // Trim the two header rows and the trailing summary row, then drop the
    // single-field round separators from the body.
    let body: Vec<&Vec<String>> = rows[2..rows.len() - 1]
        .iter()
        .filter(|row| row.len() != 1)
        .collect();
    let limit = body.len();

    let mut measurements = Vec::with_capacity(limit.min(total_rounds as usize * rows_per_round));
    'rounds: for round_index in 0..total_rounds {
        for offset in 0..rows_per_round {
            let position = round_index as usize * rows_per_round + offset;
            if position >= limit {
                break 'rounds;
            }
            measurements.push(measurement_from_row(
                &header,
                round_index + 1,
                body[position],
            ));
        }
    }

    debug!(
        "Parsed {} angle measurements from {} ({} rounds x {} rows, {} body rows)",
        measurements.len(),
        path.display(),
        total_rounds,
        rows_per_round,
        limit
    );

    Ok(measurements)
}

/// Build one measurement from a body row. Missing trailing readings degrade
/// to empty strings so the parser stays total over ragged rows.
fn measurement_from_row(
    header: &super::ExportHeader,
    round: u32,
    row: &[String],
) -> AngleMeasurement {
    AngleMeasurement {
        station_id: header.station_id.clone(),
        instrument_height: header.instrument_height.clone(),
        round,
        target_name: row.first().cloned().unwrap_or_default(),
        face_left: row.get(1).cloned().unwrap_or_default(),
        face_right: row.get(2).cloned().unwrap_or_default(),
        extra: row.get(3..).map(<[String]>::to_vec).unwrap_or_default(),
        date: header.date.clone(),
        time: header.time.clone(),
    }
}

fn numeric_header_field(path: &Path, row: &[String], index: usize, what: &str) -> Result<u32> {
    let field = row.get(index).ok_or_else(|| {
        LeicaError::invalid_format(path, format!("station row has no {} field", what))
    })?;
    field.trim().parse().map_err(|_| {
        LeicaError::invalid_format(path, format!("{} field '{}' is not numeric", what, field))
    })
}

//! Distance-type export parsing (`.TXT` files).
//!
//! Distance bodies are bracketed by `Dist Start` / `Dist End` marker rows;
//! markers delimit measurement sections and are never data. Data rows carry
//! the round label, target name, and slope distance.

use std::path::Path;

use tracing::{debug, warn};

use super::{parse_header, read_rows};
use crate::error::Result;
use crate::models::DistanceMeasurement;

/// Token index of the time entry in the distance-layout date/time row.
const TIME_TOKEN_INDEX: usize = 3;

const SECTION_MARKERS: [&str; 2] = ["Dist Start", "Dist End"];

/// Parse one distance-type export into an ordered sequence of measurements.
pub fn parse_distance_file(path: &Path) -> Result<Vec<DistanceMeasurement>> {
    let rows = read_rows(path)?;
    let header = parse_header(path, &rows, TIME_TOKEN_INDEX)?;

    let mut measurements = Vec::new();
    for row in &rows[2..rows.len() - 1] {
        if row
            .iter()
            .any(|field| SECTION_MARKERS.contains(&field.as_str()))
        {
            continue;
        }
        // A row without a round label and target name can never satisfy a
        // join key; downstream it would only ever be dead weight.
        let (Some(round), Some(target_name)) = (row.first(), row.get(1)) else {
            warn!(
                "Skipping distance row with {} fields in {}",
                row.len(),
                path.display()
            );
            continue;
        };

        measurements.push(DistanceMeasurement {
            station_id: header.station_id.clone(),
            instrument_height: header.instrument_height.clone(),
            round: round.clone(),
            target_name: target_name.clone(),
            slope_distance: row.get(2).cloned(),
            date: header.date.clone(),
            time: header.time.clone(),
        });
    }

    debug!(
        "Parsed {} distance measurements from {}",
        measurements.len(),
        path.display()
    );

    Ok(measurements)
}

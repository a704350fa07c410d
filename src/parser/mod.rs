//! Parsers for Leica total-station export files.
//!
//! All three export variants share the same framing: a station line, a
//! `key=value` date/time line, a data body, and a trailing summary row. The
//! angle parser handles `.TPT` and `.TZT` files (identical row format), the
//! distance parser handles `.TXT` files.

pub mod angle;
pub mod distance;

pub use angle::parse_angle_file;
pub use distance::parse_distance_file;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{LeicaError, Result};

/// Station identity and observation date/time shared by the three export
/// variants, taken from the first two rows of a file.
#[derive(Debug, Clone)]
pub(crate) struct ExportHeader {
    pub station_id: String,
    pub instrument_height: String,
    pub date: String,
    pub time: String,
}

/// Read every row of an export into owned string fields.
///
/// Leica rows are ragged, so the reader runs in flexible mode with no header
/// row. Fields are kept verbatim; join keys compare exactly as written.
pub(crate) fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Parse the two header rows of an export.
///
/// Row 0 carries the station id in the first field and the instrument height
/// in the last. Row 1 carries `key=value` tokens; the date sits at token
/// index 1 in every variant, the time token index differs between the angle
/// and distance layouts and is passed in by the caller.
pub(crate) fn parse_header(
    path: &Path,
    rows: &[Vec<String>],
    time_token_index: usize,
) -> Result<ExportHeader> {
    if rows.len() < 3 {
        return Err(LeicaError::invalid_format(
            path,
            format!(
                "expected two header rows, a data body and a summary row, found {} rows",
                rows.len()
            ),
        ));
    }

    let station_row = &rows[0];
    let station_id = station_row
        .first()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| LeicaError::invalid_format(path, "station row has no station id"))?
        .clone();
    let instrument_height = station_row
        .last()
        .ok_or_else(|| LeicaError::invalid_format(path, "station row has no instrument height"))?
        .clone();

    let date = key_value(path, &rows[1], 1, "date")?;
    let time = key_value(path, &rows[1], time_token_index, "time")?;

    Ok(ExportHeader {
        station_id,
        instrument_height,
        date,
        time,
    })
}

/// Extract the value of the `key=value` token at `index` in the date/time
/// row.
fn key_value(path: &Path, row: &[String], index: usize, what: &str) -> Result<String> {
    let token = row.get(index).ok_or_else(|| {
        LeicaError::invalid_format(
            path,
            format!("date/time row has no {} token at index {}", what, index),
        )
    })?;

    token
        .splitn(2, '=')
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| {
            LeicaError::invalid_format(
                path,
                format!("{} token '{}' is not in key=value form", what, token),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_header_angle_layout() {
        let rows = vec![
            vec!["ST01".into(), "2".into(), "1".into(), "X".into(), "1.5500".into()],
            vec!["HDR".into(), "Date=2024-01-02".into(), "Time=10:00:00".into()],
            vec!["T1".into(), "120.1111".into(), "300.1111".into()],
            vec!["END".into()],
        ];
        let header = parse_header(Path::new("test.TPT"), &rows, 2).unwrap();
        assert_eq!(header.station_id, "ST01");
        assert_eq!(header.instrument_height, "1.5500");
        assert_eq!(header.date, "2024-01-02");
        assert_eq!(header.time, "10:00:00");
    }

    #[test]
    fn test_parse_header_too_few_rows() {
        let rows = vec![vec!["ST01".into()], vec!["HDR".into()]];
        let err = parse_header(Path::new("short.TPT"), &rows, 2).unwrap_err();
        assert!(matches!(err, LeicaError::InvalidFormat { .. }));
    }

    #[test]
    fn test_parse_header_malformed_token() {
        let rows = vec![
            vec!["ST01".into(), "1.5500".into()],
            vec!["HDR".into(), "2024-01-02".into(), "Time=10:00:00".into()],
            vec!["T1".into()],
            vec!["END".into()],
        ];
        let err = parse_header(Path::new("bad.TPT"), &rows, 2).unwrap_err();
        match err {
            LeicaError::InvalidFormat { reason, .. } => {
                assert!(reason.contains("key=value"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_read_rows_ragged() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "ST01,2,1,X,1.5500").unwrap();
        writeln!(temp, "1").unwrap();
        writeln!(temp, "T1,120.1111,300.1111,1.200").unwrap();
        temp.flush().unwrap();

        let rows = read_rows(temp.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 5);
        assert_eq!(rows[1], vec!["1".to_string()]);
        assert_eq!(rows[2].len(), 4);
    }
}

//! Spreadsheet report output.
//!
//! Serializes globally ordered station batches into one xlsx file with the
//! fixed two-row header: spanned `Horizontal Angle` and `Zenith Distance`
//! groups carry `Left-face` / `Right-face` sub-labels, single columns merge
//! vertically across both header rows. An existing file at the output path
//! is overwritten.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::error::Result;
use crate::models::StationBatch;

/// Row index of the first data row, below the two header rows.
const DATA_ROW_OFFSET: u32 = 2;

const SUB_LABELS: [&str; 2] = ["Left-face", "Right-face"];

/// Single-column headers and the spanned groups, in column order.
/// `(label, first_col, last_col)`; a group spanning one column merges
/// vertically instead.
const HEADER_LAYOUT: [(&str, u16, u16); 10] = [
    ("Station", 0, 0),
    ("Instrument Height", 1, 1),
    ("Round", 2, 2),
    ("Target Name", 3, 3),
    ("Target Height", 4, 4),
    ("Horizontal Angle", 5, 6),
    ("Zenith Distance", 7, 8),
    ("Slope Distance", 9, 9),
    ("Date", 10, 10),
    ("Time", 11, 11),
];

/// Write the report for all batches to `path`, overwriting any existing
/// file.
pub fn write_report(path: &Path, batches: &[StationBatch]) -> Result<()> {
    let mut workbook = build_workbook(batches)?;
    workbook.save(path)?;

    let rows: usize = batches.iter().map(|b| b.records.len()).sum();
    debug!("Wrote report with {} data rows to {}", rows, path.display());
    Ok(())
}

/// Assemble the workbook without saving it; split out for buffer-backed
/// tests.
pub(crate) fn build_workbook(batches: &[StationBatch]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let cell_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let header_format = cell_format.clone().set_bold();

    write_header(worksheet, &header_format)?;

    let mut row = DATA_ROW_OFFSET;
    for batch in batches {
        for record in &batch.records {
            let round = record.round.to_string();
            let cells: [&str; 12] = [
                &record.station_id,
                &record.instrument_height,
                &round,
                &record.target_name,
                record.target_height.as_deref().unwrap_or(""),
                &record.hz_left,
                &record.hz_right,
                record.zenith_left.as_deref().unwrap_or(""),
                record.zenith_right.as_deref().unwrap_or(""),
                record.slope_distance.as_deref().unwrap_or(""),
                &record.date,
                &record.time,
            ];
            for (col, value) in cells.iter().enumerate() {
                worksheet.write_string_with_format(row, col as u16, *value, &cell_format)?;
            }
            row += 1;
        }
    }

    worksheet.autofit();
    Ok(workbook)
}

fn write_header(worksheet: &mut Worksheet, format: &Format) -> Result<()> {
    for (label, first_col, last_col) in HEADER_LAYOUT {
        if first_col == last_col {
            worksheet.merge_range(0, first_col, 1, first_col, label, format)?;
        } else {
            worksheet.merge_range(0, first_col, 0, last_col, label, format)?;
            for (offset, sub_label) in SUB_LABELS.iter().enumerate() {
                worksheet.write_string_with_format(
                    1,
                    first_col + offset as u16,
                    *sub_label,
                    format,
                )?;
            }
        }
    }
    Ok(())
}

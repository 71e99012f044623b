//! Spreadsheet reading via `calamine`, covering both the legacy binary `.xls`
//! format and the zipped-XML `.xlsx` format behind one `CellTextSource` +
//! `MergeAware` implementation.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Dimensions, Reader, Sheets};

use crate::domain::error::{EngineError, SourceLocation};
use crate::domain::profile::FormatKind;
use crate::ports::cell_source::{CellTextSource, MergeAware};

pub struct SpreadsheetSource {
    rows: Vec<Vec<Data>>,
    /// (row_start, col_start, row_end, col_end), all zero-based, inclusive.
    merges: Vec<(usize, usize, usize, usize)>,
}

impl SpreadsheetSource {
    pub fn read(bytes: &[u8], sheet_index: usize, parser_key: &str) -> Result<Self, EngineError> {
        let format_kind = FormatKind::XlsxZipped;
        let io_err = |e: calamine::Error| EngineError::IoFailure {
            parser_key: parser_key.to_string(),
            format_kind: format_kind.as_str().to_string(),
            location: SourceLocation::Unknown,
            source: Box::new(e),
        };

        let cursor = Cursor::new(bytes);
        let mut workbook: Sheets<_> =
            open_workbook_auto_from_rs(cursor).map_err(io_err)?;

        let sheet_name = workbook
            .sheet_names()
            .get(sheet_index)
            .cloned()
            .ok_or_else(|| EngineError::MalformedProfile {
                parser_key: parser_key.to_string(),
                format_kind: format_kind.as_str().to_string(),
                reason: format!("sheet index {sheet_index} does not exist"),
            })?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| EngineError::IoFailure {
                parser_key: parser_key.to_string(),
                format_kind: format_kind.as_str().to_string(),
                location: SourceLocation::Unknown,
                source: Box::new(e),
            })?;

        let merges = merged_regions(&mut workbook, &sheet_name);

        let rows = range.rows().map(|row| row.to_vec()).collect();

        Ok(Self { rows, merges })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Data> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Merged regions are only exposed by `calamine`'s concrete `Xlsx` reader;
/// other container formats (binary `.xls`, `.xlsb`, `.ods`) report none,
/// which degrades gracefully to treating every cell as unmerged.
fn merged_regions(workbook: &mut Sheets<Cursor<&[u8]>>, sheet_name: &str) -> Vec<(usize, usize, usize, usize)> {
    let dims: Option<Vec<Dimensions>> = match workbook {
        Sheets::Xlsx(xlsx) => xlsx.worksheet_merge_cells(sheet_name),
        _ => None,
    };

    dims.unwrap_or_default()
        .into_iter()
        .map(|(start, end)| {
            (
                start.0 as usize,
                start.1 as usize,
                end.0 as usize,
                end.1 as usize,
            )
        })
        .collect()
}

impl CellTextSource for SpreadsheetSource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self, row: usize) -> usize {
        self.rows.get(row).map(|r| r.len()).unwrap_or(0)
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).map(cell_to_string)
    }
}

impl MergeAware for SpreadsheetSource {
    fn merge_anchor(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        self.merges
            .iter()
            .find(|(r0, c0, r1, c1)| row >= *r0 && row <= *r1 && col >= *c0 && col <= *c1)
            .map(|(r0, c0, _, _)| (*r0, *c0))
    }

    fn merge_col_span(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        self.merges
            .iter()
            .find(|(r0, c0, r1, c1)| row >= *r0 && row <= *r1 && col >= *c0 && col <= *c1)
            .map(|(_, c0, _, c1)| (*c0, *c1))
    }
}

/// Lossless string conversion for a native cell value: date-formatted cells
/// yield ISO local date-time, other numeric cells yield the shortest exact
/// decimal representation (no exponent notation).
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_else(|| format_float(dt.as_f64())),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        let s = format!("{f}");
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_numbers_without_decimal_point() {
        assert_eq!(format_float(45748.0), "45748");
    }

    #[test]
    fn formats_fractional_numbers() {
        assert_eq!(format_float(45748.5), "45748.5");
    }

    #[test]
    fn cell_to_string_handles_empty_and_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("Date".to_string())), "Date");
    }

    #[test]
    fn merge_col_span_covers_the_whole_region_not_just_the_anchor() {
        let source = SpreadsheetSource {
            rows: vec![vec![Data::String("Transaction Details".to_string()), Data::Empty, Data::Empty]],
            // one row, columns 0..=2 merged
            merges: vec![(0, 0, 0, 2)],
        };
        assert_eq!(source.merge_anchor(0, 2), Some((0, 0)));
        assert_eq!(source.merge_col_span(0, 2), Some((0, 2)));
        assert_eq!(source.merge_col_span(0, 1), Some((0, 2)));
        assert_eq!(source.merge_col_span(1, 0), None);
    }
}

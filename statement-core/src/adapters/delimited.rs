//! CSV reading: the whole file is buffered into a row array up front, since
//! the header resolver may need to scan or back-scan across rows before data
//! rows can be read.

use std::io::Read;

use crate::domain::error::{EngineError, SourceLocation};
use crate::domain::profile::FormatKind;
use crate::ports::cell_source::{CellTextSource, NeverMerged};

/// A fully-buffered delimited document: one `Vec<String>` per row.
pub struct DelimitedSource {
    rows: Vec<Vec<String>>,
}

impl NeverMerged for DelimitedSource {}

impl DelimitedSource {
    /// Read an entire delimited document, auto-detecting the delimiter among
    /// `,`, `;`, and tab when one isn't supplied by probing the first line.
    /// `skip_rows` leading rows are discarded before the header resolver
    /// ever sees row 0 - junk preamble lines outside the header band itself.
    pub fn read(
        mut input: impl Read,
        delimiter: Option<char>,
        charset: &str,
        skip_rows: usize,
        parser_key: &str,
    ) -> Result<Self, EngineError> {
        let io_err = |e: std::io::Error| EngineError::IoFailure {
            parser_key: parser_key.to_string(),
            format_kind: FormatKind::Csv.as_str().to_string(),
            location: SourceLocation::Unknown,
            source: Box::new(e),
        };

        let mut raw = Vec::new();
        input.read_to_end(&mut raw).map_err(io_err)?;

        let text = decode_charset(&raw, charset);

        let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&text));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter as u8)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| EngineError::IoFailure {
                parser_key: parser_key.to_string(),
                format_kind: FormatKind::Csv.as_str().to_string(),
                location: SourceLocation::Row(idx),
                source: Box::new(e),
            })?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        if skip_rows > 0 {
            rows.drain(0..skip_rows.min(rows.len()));
        }

        Ok(Self { rows })
    }
}

/// Decode raw bytes per the profile's configured `charset` label
/// (default UTF-8), honoring §6's charset-override contract. Falls back to
/// lossy UTF-8 for a label `encoding_rs` doesn't recognize, rather than
/// failing the whole invocation over a bad label.
fn decode_charset(raw: &[u8], charset: &str) -> String {
    if charset.eq_ignore_ascii_case("UTF-8") {
        return String::from_utf8_lossy(raw).into_owned();
    }
    match encoding_rs::Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => encoding.decode(raw).0.into_owned(),
        None => String::from_utf8_lossy(raw).into_owned(),
    }
}

fn detect_delimiter(text: &str) -> char {
    let first_line = text.lines().next().unwrap_or("");
    let candidates = [',', ';', '\t'];
    candidates
        .into_iter()
        .max_by_key(|c| first_line.matches(*c).count())
        .unwrap_or(',')
}

impl CellTextSource for DelimitedSource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self, row: usize) -> usize {
        self.rows.get(row).map(|r| r.len()).unwrap_or(0)
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.rows.get(row).and_then(|r| r.get(col)).cloned()
    }
}

//! Spreadsheet row materialization with a "flexible read" neighbor-probe
//! rule: when a mapped cell is empty, look at its merged-region anchor,
//! then probe a few columns either side, stopping the moment an adjacent
//! column turns out to belong to someone else.

use std::collections::{HashMap, HashSet};

use crate::adapters::spreadsheet::SpreadsheetSource;
use crate::domain::fields::SemanticField;
use crate::domain::profile::{FormatProfile, HeaderConfig, NumericConfig, RowStopConfig};
use crate::domain::row::ParsedRow;
use crate::ports::cell_source::{CellTextSource, MergeAware};
use crate::services::header_resolver::HeaderResolution;

use super::{materialize_row, RowInputs};

/// Columns either side of a mapped column that flexible-read is allowed to
/// probe before giving up. Not exposed as a profile option (DESIGN.md, Open
/// Question 2): no scenario calls for tuning it per bank.
const PROBE_RADIUS: usize = 3;

pub fn materialize(
    source: &SpreadsheetSource,
    header: &HeaderResolution,
    headers_config: &HeaderConfig,
    profile: &FormatProfile,
) -> Vec<ParsedRow> {
    let mapped_columns: HashSet<usize> = header.mapping.values().copied().collect();
    let expect = match headers_config {
        HeaderConfig::Search { expect, .. } => Some(expect),
        HeaderConfig::Fixed { .. } => None,
    };

    let numeric_fields = [
        SemanticField::Credit,
        SemanticField::Debit,
        SemanticField::Amount,
        SemanticField::Balance,
    ];

    let mut out = Vec::new();
    for row in header.data_start_row..source.row_count() {
        let width = source.column_count(row);
        let cells: Vec<String> = (0..width)
            .map(|c| source.cell_text(row, c).unwrap_or_default())
            .collect();

        if row_stop_triggered(&cells, &profile.row_stop) {
            break;
        }

        let read = |field: SemanticField| -> Option<String> {
            let col = *header.mapping.get(&field)?;
            let numeric = numeric_fields.contains(&field).then_some(&profile.numeric);
            flexible_read(source, header, &mapped_columns, expect, row, col, field, numeric)
        };

        let inputs = RowInputs {
            date: read(SemanticField::Date),
            time: read(SemanticField::Time),
            reference: read(SemanticField::Reference),
            credit: read(SemanticField::Credit),
            debit: read(SemanticField::Debit),
            amount: read(SemanticField::Amount),
            balance: read(SemanticField::Balance),
        };

        if let Some(parsed) = materialize_row(inputs, profile) {
            out.push(parsed);
        }
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn flexible_read(
    source: &SpreadsheetSource,
    header: &HeaderResolution,
    mapped_columns: &HashSet<usize>,
    expect: Option<&HashMap<SemanticField, Vec<String>>>,
    row: usize,
    col: usize,
    field: SemanticField,
    numeric: Option<&NumericConfig>,
) -> Option<String> {
    if let Some(text) = non_empty_cell(source, row, col) {
        return Some(text);
    }
    if let Some(anchor) = source.merge_anchor(row, col) {
        if anchor != (row, col) {
            if let Some(text) = non_empty_cell(source, anchor.0, anchor.1) {
                return Some(text);
            }
        }
    }

    for direction in [1i32, -1i32] {
        let mut probe = col as i32;
        for _ in 0..PROBE_RADIUS {
            probe += direction;
            if probe < 0 {
                break;
            }
            let probe_col = probe as usize;
            if is_forbidden_neighbor(source, header, mapped_columns, expect, row, probe_col, field) {
                break;
            }
            if let Some(text) = cell_or_anchor_text(source, row, probe_col) {
                if acceptable(&text, numeric) {
                    return Some(text);
                }
            }
        }
    }

    None
}

fn cell_or_anchor_text(source: &SpreadsheetSource, row: usize, col: usize) -> Option<String> {
    if let Some(text) = non_empty_cell(source, row, col) {
        return Some(text);
    }
    let anchor = source.merge_anchor(row, col)?;
    non_empty_cell(source, anchor.0, anchor.1)
}

fn non_empty_cell(source: &SpreadsheetSource, row: usize, col: usize) -> Option<String> {
    source.cell_text(row, col).filter(|s| !s.trim().is_empty())
}

fn acceptable(text: &str, numeric: Option<&NumericConfig>) -> bool {
    match numeric {
        Some(cfg) => super::parse_decimal(text, cfg).is_some(),
        None => !text.trim().is_empty(),
    }
}

fn is_forbidden_neighbor(
    source: &SpreadsheetSource,
    header: &HeaderResolution,
    mapped_columns: &HashSet<usize>,
    expect: Option<&HashMap<SemanticField, Vec<String>>>,
    row: usize,
    probe_col: usize,
    field: SemanticField,
) -> bool {
    if mapped_columns.contains(&probe_col) {
        return true;
    }
    if let Some((start_col, end_col)) = source.merge_col_span(row, probe_col) {
        if mapped_columns.iter().any(|c| (start_col..=end_col).contains(c)) {
            return true;
        }
    }
    if let Some(Some(text)) = header.header_band_text.get(probe_col) {
        if !text.trim().is_empty() {
            let matches_field = expect
                .and_then(|e| e.get(&field))
                .map(|synonyms| {
                    let lower = text.to_lowercase();
                    synonyms.iter().any(|s| lower.contains(&s.to_lowercase()))
                })
                .unwrap_or(false);
            if !matches_field {
                return true;
            }
        }
    }
    false
}

fn row_stop_triggered(cells: &[String], rule: &RowStopConfig) -> bool {
    match rule {
        RowStopConfig::None => false,
        RowStopConfig::BlankRow => cells.iter().all(|c| c.trim().is_empty()),
        RowStopConfig::UntilRegex(re) => re.is_match(&cells.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptable_requires_parseable_decimal_for_numeric_fields() {
        let numeric = NumericConfig {
            thousands_separator: ',',
            decimal_separator: '.',
        };
        assert!(acceptable("1,234.56", Some(&numeric)));
        assert!(!acceptable("Instrument Id", Some(&numeric)));
        assert!(acceptable("anything non-empty", None));
    }
}

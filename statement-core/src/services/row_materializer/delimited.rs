//! Delimited-text row materialization: plain column indexing, no merged
//! cells, no flexible-read probing.

use std::collections::HashMap;

use crate::adapters::delimited::DelimitedSource;
use crate::domain::fields::SemanticField;
use crate::domain::profile::{FormatProfile, RowStopConfig};
use crate::domain::row::ParsedRow;
use crate::ports::cell_source::CellTextSource;
use crate::services::header_resolver::HeaderResolution;

use super::{materialize_row, RowInputs};

pub fn materialize(
    source: &DelimitedSource,
    header: &HeaderResolution,
    profile: &FormatProfile,
) -> Vec<ParsedRow> {
    let mut out = Vec::new();

    for row in header.data_start_row..source.row_count() {
        let width = source.column_count(row);
        let cells: Vec<String> = (0..width)
            .map(|c| source.cell_text(row, c).unwrap_or_default())
            .collect();

        if row_stop_triggered(&cells, &profile.row_stop) {
            break;
        }

        let field = |f: SemanticField| cell_at(&header.mapping, &cells, f);

        let inputs = RowInputs {
            date: field(SemanticField::Date),
            time: field(SemanticField::Time),
            reference: field(SemanticField::Reference),
            credit: field(SemanticField::Credit),
            debit: field(SemanticField::Debit),
            amount: field(SemanticField::Amount),
            balance: field(SemanticField::Balance),
        };

        if let Some(parsed) = materialize_row(inputs, profile) {
            out.push(parsed);
        }
    }

    out
}

fn cell_at(mapping: &HashMap<SemanticField, usize>, cells: &[String], field: SemanticField) -> Option<String> {
    let idx = *mapping.get(&field)?;
    // An out-of-range declared/resolved column index is treated as an empty
    // cell, not a fatal error (see DESIGN.md, Open Question 1).
    Some(cells.get(idx).cloned().unwrap_or_default())
}

fn row_stop_triggered(cells: &[String], rule: &RowStopConfig) -> bool {
    match rule {
        RowStopConfig::None => false,
        RowStopConfig::BlankRow => cells.iter().all(|c| c.trim().is_empty()),
        RowStopConfig::UntilRegex(re) => {
            let line = cells.join(" ");
            re.is_match(&line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{
        DateParseConfig, HeaderConfig, NumericConfig, PartsCountRule, PayInRule, ReferenceConfig,
    };

    fn profile(row_stop: RowStopConfig) -> FormatProfile {
        FormatProfile {
            enabled: true,
            headers: HeaderConfig::Fixed {
                row_start: 0,
                columns: HashMap::new(),
            },
            numeric: NumericConfig {
                thousands_separator: ',',
                decimal_separator: '.',
            },
            date_parse: DateParseConfig {
                format: Some("%d/%m/%Y".to_string()),
                time_format: None,
                excel_serial: false,
            },
            reference: ReferenceConfig {
                splitter: None,
                parts_count: PartsCountRule::None,
                order_id: None,
                utr: None,
                utr_fallback: None,
            },
            pay_in_rule: PayInRule::AmountPositive,
            row_stop,
            charset: "UTF-8".to_string(),
            delimiter: ',',
            skip_rows: 0,
            sheet_index: 0,
            start_after_regex: None,
            stop_before_regex: None,
            line_pattern: None,
        }
    }

    fn mapping() -> HashMap<SemanticField, usize> {
        let mut m = HashMap::new();
        m.insert(SemanticField::Date, 0);
        m.insert(SemanticField::Reference, 1);
        m.insert(SemanticField::Credit, 2);
        m.insert(SemanticField::Debit, 3);
        m
    }

    #[test]
    fn materializes_two_rows_from_scenario_one() {
        let csv = "Date,Narration,Credit,Debit\n01/04/2025,NEFT CR,1000.00,\n02/04/2025,NEFT DR,,500.50\n";
        let source = DelimitedSource::read(csv.as_bytes(), None, "UTF-8", 0, "hdfc").unwrap();
        let header = HeaderResolution {
            mapping: mapping(),
            data_start_row: 1,
            header_band_text: Vec::new(),
        };
        let rows = materialize(&source, &header, &profile(RowStopConfig::None));
        assert_eq!(rows.len(), 2);
        assert!(rows[0].amount.is_sign_positive());
        assert!(rows[1].amount.is_sign_negative());
    }

    #[test]
    fn blank_row_stops_materialization() {
        let csv = "Date,Narration,Credit,Debit\n01/04/2025,NEFT CR,1000.00,\n,,,\n02/04/2025,NEFT DR,,500.50\n";
        let source = DelimitedSource::read(csv.as_bytes(), None, "UTF-8", 0, "hdfc").unwrap();
        let header = HeaderResolution {
            mapping: mapping(),
            data_start_row: 1,
            header_band_text: Vec::new(),
        };
        let rows = materialize(&source, &header, &profile(RowStopConfig::BlankRow));
        assert_eq!(rows.len(), 1);
    }
}

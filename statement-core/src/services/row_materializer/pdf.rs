//! PDF line materialization: no header resolution step at all - the
//! profile's `linePattern` named capture groups ARE the mapping.

use crate::domain::fields::SemanticField;
use crate::domain::profile::{FormatProfile, RowStopConfig};
use crate::domain::row::ParsedRow;

use super::{materialize_row, RowInputs};

pub fn materialize(full_text: &str, profile: &FormatProfile) -> Vec<ParsedRow> {
    let clipped = clip(full_text, profile);

    let Some(line_pattern) = &profile.line_pattern else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for line in clipped.lines() {
        if row_stop_triggered(line, &profile.row_stop) {
            break;
        }

        let Some(captures) = line_pattern.captures(line) else {
            continue;
        };

        let group = |field: SemanticField| {
            captures
                .name(field.as_str())
                .map(|m| m.as_str().to_string())
        };

        let inputs = RowInputs {
            date: group(SemanticField::Date),
            time: group(SemanticField::Time),
            reference: group(SemanticField::Reference),
            credit: group(SemanticField::Credit),
            debit: group(SemanticField::Debit),
            amount: group(SemanticField::Amount),
            balance: group(SemanticField::Balance),
        };

        if let Some(parsed) = materialize_row(inputs, profile) {
            out.push(parsed);
        }
    }

    out
}

/// Clip to the slice strictly between the first match of `startAfterRegex`
/// and the first subsequent match of `stopBeforeRegex`; an unconfigured end
/// leaves the document open at that side.
fn clip<'a>(full_text: &'a str, profile: &FormatProfile) -> &'a str {
    let mut text = full_text;

    if let Some(start) = &profile.start_after_regex {
        if let Some(m) = start.find(text) {
            text = &text[m.end()..];
        }
    }

    if let Some(stop) = &profile.stop_before_regex {
        if let Some(m) = stop.find(text) {
            text = &text[..m.start()];
        }
    }

    text
}

fn row_stop_triggered(line: &str, rule: &RowStopConfig) -> bool {
    match rule {
        RowStopConfig::None => false,
        RowStopConfig::BlankRow => line.trim().is_empty(),
        RowStopConfig::UntilRegex(re) => re.is_match(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{
        DateParseConfig, HeaderConfig, NumericConfig, PartsCountRule, PayInRule, ReferenceConfig,
    };
    use regex::Regex;
    use std::collections::HashMap;

    fn profile() -> FormatProfile {
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
            row_stop: RowStopConfig::None,
            charset: "UTF-8".to_string(),
            delimiter: ',',
            skip_rows: 0,
            sheet_index: 0,
            start_after_regex: Some(Regex::new(r"^Date\s+Narration").unwrap()),
            stop_before_regex: Some(Regex::new(r"(?m)^Opening Balance").unwrap()),
            line_pattern: Some(
                Regex::new(
                    r"(?m)^(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<reference>.+?)\s+(?P<credit>[\d,.]+)?\s*(?P<debit>[\d,.]+)?\s+(?P<balance>[\d,.]+)$",
                )
                .unwrap(),
            ),
        }
    }

    #[test]
    fn extracts_rows_between_start_and_stop_markers() {
        let text = "Date Narration Credit Debit Balance\n\
                     01/04/2025 NEFT CR 1000.00 15000.00\n\
                     Opening Balance 14000.00\n";
        let rows = materialize(text, &profile());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].amount.is_sign_positive());
    }
}

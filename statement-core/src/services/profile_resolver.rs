//! Parser-key / format-kind lookup against the compiled profile tree.

use crate::domain::error::EngineError;
use crate::domain::profile::{FormatKind, FormatProfile, ProfileBook};

pub struct ProfileResolver;

impl ProfileResolver {
    pub fn resolve<'a>(
        book: &'a ProfileBook,
        parser_key: &str,
        format_kind: FormatKind,
    ) -> Result<&'a FormatProfile, EngineError> {
        let key = parser_key.trim().to_ascii_lowercase();

        let (_, bank) = book
            .banks
            .iter()
            .find(|(k, _)| k.trim().to_ascii_lowercase() == key)
            .ok_or_else(|| EngineError::UnknownParserKey {
                parser_key: parser_key.to_string(),
            })?;

        if !bank.enabled {
            return Err(EngineError::UnknownParserKey {
                parser_key: parser_key.to_string(),
            });
        }

        let format = bank.formats.get(&format_kind).ok_or_else(|| {
            EngineError::FormatNotConfigured {
                parser_key: parser_key.to_string(),
                format_kind: format_kind.as_str().to_string(),
            }
        })?;

        if !format.enabled {
            return Err(EngineError::FormatNotConfigured {
                parser_key: parser_key.to_string(),
                format_kind: format_kind.as_str().to_string(),
            });
        }

        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::BankProfile;
    use std::collections::HashMap;

    fn minimal_format() -> FormatProfile {
        // Built directly rather than via YAML, since this test only
        // exercises key lookup, not profile compilation.
        use crate::domain::profile::{
            DateParseConfig, HeaderConfig, NumericConfig, PartsCountRule, PayInRule,
            ReferenceConfig, RowStopConfig,
        };
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
                format: None,
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
            start_after_regex: None,
            stop_before_regex: None,
            line_pattern: None,
        }
    }

    fn book_with(parser_key: &str, enabled: bool) -> ProfileBook {
        let mut formats = HashMap::new();
        formats.insert(FormatKind::Csv, minimal_format());
        let mut banks = HashMap::new();
        banks.insert(parser_key.to_string(), BankProfile { enabled, formats });
        ProfileBook { banks }
    }

    #[test]
    fn resolves_case_insensitively_and_trimmed() {
        let book = book_with("HDFC", true);
        assert!(ProfileResolver::resolve(&book, " hdfc ", FormatKind::Csv).is_ok());
    }

    #[test]
    fn unknown_key_errors() {
        let book = book_with("hdfc", true);
        assert!(matches!(
            ProfileResolver::resolve(&book, "icici", FormatKind::Csv),
            Err(EngineError::UnknownParserKey { .. })
        ));
    }

    #[test]
    fn disabled_bank_is_unknown() {
        let book = book_with("hdfc", false);
        assert!(matches!(
            ProfileResolver::resolve(&book, "hdfc", FormatKind::Csv),
            Err(EngineError::UnknownParserKey { .. })
        ));
    }

    #[test]
    fn missing_format_is_not_configured() {
        let book = book_with("hdfc", true);
        assert!(matches!(
            ProfileResolver::resolve(&book, "hdfc", FormatKind::Pdf),
            Err(EngineError::FormatNotConfigured { .. })
        ));
    }
}

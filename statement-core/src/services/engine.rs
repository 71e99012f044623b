//! The engine facade: selects the format pipeline, drives the input stream
//! once, and translates stage failures into the engine's typed error
//! taxonomy. One entry point dispatching across four format kinds.

use std::io::Read;

use log::{debug, info, warn};

use crate::adapters::delimited::DelimitedSource;
use crate::adapters::pdf;
use crate::adapters::spreadsheet::SpreadsheetSource;
use crate::domain::error::EngineError;
use crate::domain::profile::{FormatKind, FormatProfile, ProfileBook};
use crate::domain::row::ParsedRow;
use crate::services::format_detector::FormatDetector;
use crate::services::header_resolver::{HeaderResolver, HeaderStyle};
use crate::services::profile_resolver::ProfileResolver;
use crate::services::row_materializer::{delimited as mat_delimited, pdf as mat_pdf, spreadsheet as mat_spreadsheet};

pub struct EngineService;

impl EngineService {
    /// Parse one input stream end-to-end.
    ///
    /// `account_no_override` is accepted and otherwise ignored by this core:
    /// account-number parsing and the downstream collaborators that consume
    /// the override are out of scope here, but the parameter is still part
    /// of the facade's contract so callers can forward it unchanged.
    pub fn parse(
        mut stream: impl Read,
        filename: Option<&str>,
        content_type: Option<&str>,
        profiles: &ProfileBook,
        parser_key: &str,
        account_no_override: Option<&str>,
    ) -> Result<Vec<ParsedRow>, EngineError> {
        let _ = account_no_override;

        let format_kind = FormatDetector::detect(filename, content_type)?;
        debug!("detected format {format_kind} for parser key '{parser_key}'");

        let profile = ProfileResolver::resolve(profiles, parser_key, format_kind)?;

        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| EngineError::IoFailure {
                parser_key: parser_key.to_string(),
                format_kind: format_kind.as_str().to_string(),
                location: crate::domain::error::SourceLocation::Unknown,
                source: Box::new(e),
            })?;

        let rows = match format_kind {
            FormatKind::Csv => Self::parse_delimited(&bytes, profile, parser_key)?,
            FormatKind::XlsBinary | FormatKind::XlsxZipped => {
                Self::parse_spreadsheet(&bytes, profile, parser_key, format_kind)?
            }
            FormatKind::Pdf => Self::parse_pdf(&bytes, profile, parser_key)?,
        };

        info!(
            "parsed {} row(s) for parser key '{parser_key}' ({format_kind})",
            rows.len()
        );
        Ok(rows)
    }

    fn parse_delimited(
        bytes: &[u8],
        profile: &FormatProfile,
        parser_key: &str,
    ) -> Result<Vec<ParsedRow>, EngineError> {
        let source = DelimitedSource::read(
            bytes,
            Some(profile.delimiter),
            &profile.charset,
            profile.skip_rows,
            parser_key,
        )?;
        let header = HeaderResolver::resolve(
            &source,
            &profile.headers,
            HeaderStyle::Delimited,
            parser_key,
            FormatKind::Csv,
        )?;
        Ok(mat_delimited::materialize(&source, &header, profile))
    }

    fn parse_spreadsheet(
        bytes: &[u8],
        profile: &FormatProfile,
        parser_key: &str,
        format_kind: FormatKind,
    ) -> Result<Vec<ParsedRow>, EngineError> {
        let source = SpreadsheetSource::read(bytes, profile.sheet_index, parser_key)?;
        let header = HeaderResolver::resolve(
            &source,
            &profile.headers,
            HeaderStyle::Spreadsheet,
            parser_key,
            format_kind,
        )?;
        Ok(mat_spreadsheet::materialize(
            &source,
            &header,
            &profile.headers,
            profile,
        ))
    }

    fn parse_pdf(
        bytes: &[u8],
        profile: &FormatProfile,
        parser_key: &str,
    ) -> Result<Vec<ParsedRow>, EngineError> {
        if profile.line_pattern.is_none() {
            warn!("pdf profile for '{parser_key}' has no linePattern; this should have been rejected at load time");
        }
        let text = pdf::extract_text(bytes, parser_key)?;
        Ok(mat_pdf::materialize(&text, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::RawProfileBook;
    use std::collections::HashMap;

    fn book_from_yaml(yaml: &str) -> ProfileBook {
        let raw: RawProfileBook = serde_yaml::from_str(yaml).unwrap();
        raw.compile().unwrap()
    }

    #[test]
    fn end_to_end_scenario_one_delimited_single_row_header() {
        let yaml = r#"
banks:
  hdfc:
    csv:
      headers:
        mode: SEARCH
        scanRange: [0, 0]
        multiRowCount: 1
        expect:
          date: ["Date"]
          reference: ["Narration"]
          credit: ["Credit"]
          debit: ["Debit"]
          balance: ["Balance"]
      dateParse:
        format: "dd/MM/yyyy"
      reference:
        splitter: "/"
        partsCount:
          mode: ONE_OF
          values: [3]
        orderId:
          index: 2
        utr:
          index: 1
"#;
        let book = book_from_yaml(yaml);
        let csv = "Date,Narration,Credit,Debit,Balance\n\
                    01/04/2025,NEFT CR/UTR123456789012/ORD77,1000.00,,15000.00\n\
                    02/04/2025,NEFT DR,,500.50,14499.50\n";

        let rows = EngineService::parse(
            csv.as_bytes(),
            Some("statement.csv"),
            None,
            &book,
            "HDFC",
            None,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order_id.as_deref(), Some("ORD77"));
        assert_eq!(rows[0].utr.as_deref(), Some("UTR123456789012"));
        assert!(rows[0].pay_in);
        assert!(!rows[1].pay_in);
    }

    #[test]
    fn unknown_parser_key_is_an_error_not_empty_result() {
        let book = ProfileBook {
            banks: HashMap::new(),
        };
        let err = EngineService::parse("a,b\n1,2\n".as_bytes(), Some("x.csv"), None, &book, "nope", None);
        assert!(matches!(err, Err(EngineError::UnknownParserKey { .. })));
    }

    #[test]
    fn disabled_format_is_not_configured() {
        let yaml = r#"
banks:
  hdfc:
    csv:
      enabled: false
      headers:
        mode: SEARCH
        scanRange: [0, 0]
        expect:
          date: ["Date"]
          reference: ["Narration"]
          amount: ["Amount"]
"#;
        let book = book_from_yaml(yaml);

        let err = EngineService::parse("a,b\n1,2\n".as_bytes(), Some("x.csv"), None, &book, "hdfc", None);
        assert!(matches!(err, Err(EngineError::FormatNotConfigured { .. })));
    }
}

//! Format detection from filename/MIME hints only; the detector never reads
//! the document stream itself.

use crate::domain::error::EngineError;
use crate::domain::profile::FormatKind;

pub struct FormatDetector;

impl FormatDetector {
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Result<FormatKind, EngineError> {
        if let Some(name) = filename {
            if let Some(ext) = name.rsplit('.').next() {
                match ext.to_ascii_lowercase().as_str() {
                    "csv" => return Ok(FormatKind::Csv),
                    "xls" => return Ok(FormatKind::XlsBinary),
                    "xlsx" => return Ok(FormatKind::XlsxZipped),
                    "pdf" => return Ok(FormatKind::Pdf),
                    _ => {}
                }
            }
        }

        if let Some(ct) = content_type {
            let ct = ct.to_ascii_lowercase();
            if ct.contains("csv") {
                return Ok(FormatKind::Csv);
            }
            if ct.contains("spreadsheetml") {
                return Ok(FormatKind::XlsxZipped);
            }
            if ct.contains("excel") {
                return Ok(FormatKind::XlsBinary);
            }
            if ct.contains("pdf") {
                return Ok(FormatKind::Pdf);
            }
        }

        Err(EngineError::UnsupportedFormat {
            filename: filename.unwrap_or("").to_string(),
            content_type: content_type.map(|s| s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension_case_insensitively() {
        assert!(matches!(
            FormatDetector::detect(Some("STATEMENT.CSV"), None),
            Ok(FormatKind::Csv)
        ));
        assert!(matches!(
            FormatDetector::detect(Some("statement.xlsx"), None),
            Ok(FormatKind::XlsxZipped)
        ));
    }

    #[test]
    fn falls_back_to_content_type() {
        assert!(matches!(
            FormatDetector::detect(None, Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")),
            Ok(FormatKind::XlsxZipped)
        ));
    }

    #[test]
    fn fails_when_both_hints_are_inconclusive() {
        assert!(FormatDetector::detect(Some("statement"), None).is_err());
        assert!(FormatDetector::detect(None, None).is_err());
    }
}

//! Textual PDF extraction via `pdf-extract`. Scanned (image-only) PDFs are
//! out of scope; `pdf-extract` only recovers text that already has a text
//! layer, which matches that non-goal for free rather than requiring OCR.

use crate::domain::error::{EngineError, SourceLocation};
use crate::domain::profile::FormatKind;

pub fn extract_text(bytes: &[u8], parser_key: &str) -> Result<String, EngineError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| EngineError::IoFailure {
        parser_key: parser_key.to_string(),
        format_kind: FormatKind::Pdf.as_str().to_string(),
        location: SourceLocation::Unknown,
        source: Box::new(e),
    })
}

//! The engine's error taxonomy.

use thiserror::Error;

/// Where in the source an error (or the row closest to it) was located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Zero-based row index, for delimited and spreadsheet sources.
    Row(usize),
    /// Character offset into the extracted text layer, for PDF sources.
    CharOffset(usize),
    /// No more specific location is available.
    Unknown,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::Row(r) => write!(f, "row {r}"),
            SourceLocation::CharOffset(c) => write!(f, "offset {c}"),
            SourceLocation::Unknown => write!(f, "unknown location"),
        }
    }
}

/// Document-level and I/O-level failures. Row-level issues (an unparseable
/// date, a row dropped by a row-stop rule) are never represented here — they
/// are silently dropped by the row materializer, per the design's
/// row-dropping/error split.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported format for '{filename}' (content type: {content_type:?})")]
    UnsupportedFormat {
        filename: String,
        content_type: Option<String>,
    },

    #[error("unknown parser key '{parser_key}'")]
    UnknownParserKey { parser_key: String },

    #[error("format '{format_kind}' is not configured for parser key '{parser_key}'")]
    FormatNotConfigured {
        parser_key: String,
        format_kind: String,
    },

    #[error("no sufficient header found for parser key '{parser_key}' ({format_kind}) near {location}")]
    HeaderNotFound {
        parser_key: String,
        format_kind: String,
        location: SourceLocation,
    },

    #[error(
        "header mapping insufficient for parser key '{parser_key}' ({format_kind}) at {location}: \
         missing date/reference/amount coverage"
    )]
    HeaderMappingInsufficient {
        parser_key: String,
        format_kind: String,
        location: SourceLocation,
    },

    #[error("malformed profile for parser key '{parser_key}' ({format_kind}): {reason}")]
    MalformedProfile {
        parser_key: String,
        format_kind: String,
        reason: String,
    },

    #[error("I/O failure reading '{parser_key}' ({format_kind}) near {location}: {source}")]
    IoFailure {
        parser_key: String,
        format_kind: String,
        location: SourceLocation,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

//! Loading the bank profile file: a YAML document, top-level key `banks:`,
//! one entry per parser key. This is the engine's only configuration
//! surface — there is no other settings file. Read once at startup and
//! compiled into an immutable tree.

use std::path::Path;

use crate::domain::error::EngineError;
use crate::domain::profile::{ProfileBook, RawProfileBook};

/// Load and compile the profile book from a YAML file on disk.
///
/// Compilation happens exactly once here: every defaulted option is
/// materialized and every regex is compiled before the returned
/// [`ProfileBook`] is handed to the engine, so no parse invocation ever
/// re-derives or re-compiles profile state.
pub fn load_profiles(path: &Path) -> Result<ProfileBook, EngineError> {
    let io_err = |e: std::io::Error| EngineError::IoFailure {
        parser_key: String::new(),
        format_kind: "profile".to_string(),
        location: crate::domain::error::SourceLocation::Unknown,
        source: Box::new(e),
    };

    let content = std::fs::read_to_string(path).map_err(io_err)?;
    parse_profiles(&content)
}

/// Parse and compile the profile book from an in-memory YAML string.
pub fn parse_profiles(yaml: &str) -> Result<ProfileBook, EngineError> {
    let raw: RawProfileBook = serde_yaml::from_str(yaml).map_err(|e| EngineError::MalformedProfile {
        parser_key: String::new(),
        format_kind: "profile".to_string(),
        reason: format!("invalid YAML: {e}"),
    })?;
    raw.compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_profile_book() {
        let yaml = r#"
banks:
  hdfc:
    csv:
      headers:
        mode: SEARCH
        scanRange: [0, 0]
        expect:
          date: ["Date"]
          reference: ["Narration"]
          amount: ["Amount"]
"#;
        let book = parse_profiles(yaml).unwrap();
        assert!(book.banks.contains_key("hdfc"));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(parse_profiles("not: [valid").is_err());
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let err = load_profiles(Path::new("/nonexistent/profiles.yaml"));
        assert!(matches!(err, Err(EngineError::IoFailure { .. })));
    }
}

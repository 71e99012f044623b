//! Core domain entities and configuration schema.
//!
//! Pure data structures and validation logic - no I/O or external dependencies.

pub mod error;
pub mod fields;
pub mod profile;
pub mod row;

pub use error::{EngineError, EngineResult, SourceLocation};
pub use fields::SemanticField;
pub use profile::{
    BankProfile, DateParseConfig, FormatKind, FormatProfile, HeaderConfig, NumericConfig,
    PartsCountRule, PayInRule, ProfileBook, ReferenceConfig, ReferencePart, RowStopConfig,
};
pub use row::ParsedRow;

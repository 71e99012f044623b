//! Bank profile configuration: the declarative schema that parameterizes the
//! engine instead of per-bank code.
//!
//! Two layers: a raw
//! `serde`-deserializable tree that matches the YAML shape one-to-one
//! (`RawBankProfile`, `RawFormatProfile`, ...), and a compiled tree
//! (`BankProfile`, `FormatProfile`, ...) where every default has been
//! materialized and every regex has already been compiled. The engine only
//! ever reads the compiled tree; compilation happens once, at load time.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::domain::error::{EngineError, SourceLocation};
use crate::domain::fields::SemanticField;

/// One of the four document shapes a bank profile may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Csv,
    XlsBinary,
    XlsxZipped,
    Pdf,
}

impl FormatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Csv => "csv",
            FormatKind::XlsBinary => "xls",
            FormatKind::XlsxZipped => "xlsx",
            FormatKind::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single defaulting rule used for both the bank-profile `enabled` flag and
/// each format sub-profile's `enabled` flag (Open Question 3, see DESIGN.md):
/// absent means enabled.
pub fn effective_enabled(explicit: Option<bool>) -> bool {
    explicit.unwrap_or(true)
}

// ---------------------------------------------------------------------
// Raw (serde) layer
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawProfileBook {
    pub banks: HashMap<String, RawBankProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBankProfile {
    #[serde(default)]
    pub enabled: Option<bool>,
    pub csv: Option<RawFormatProfile>,
    pub xls: Option<RawFormatProfile>,
    pub xlsx: Option<RawFormatProfile>,
    pub pdf: Option<RawFormatProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormatProfile {
    #[serde(default)]
    pub enabled: Option<bool>,
    pub headers: Option<RawHeaderConfig>,
    #[serde(default)]
    pub numeric: RawNumericConfig,
    #[serde(default)]
    pub date_parse: RawDateParseConfig,
    #[serde(default)]
    pub reference: RawReferenceConfig,
    #[serde(default = "default_pay_in_rule")]
    pub pay_in_rule: RawPayInRule,
    #[serde(default)]
    pub row_stop: RawRowStopConfig,

    // delimited-only
    pub charset: Option<String>,
    pub delimiter: Option<char>,
    #[serde(default)]
    pub skip_rows: usize,

    // spreadsheet-only
    #[serde(default)]
    pub sheet_index: usize,

    // pdf-only
    pub start_after_regex: Option<String>,
    pub stop_before_regex: Option<String>,
    pub line_pattern: Option<String>,
}

fn default_pay_in_rule() -> RawPayInRule {
    RawPayInRule::AmountPositive
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum RawHeaderConfig {
    Fixed {
        row_start: usize,
        #[serde(default)]
        columns: HashMap<String, usize>,
    },
    Search {
        #[serde(default)]
        fixed_header_rows: Option<[usize; 2]>,
        #[serde(default)]
        scan_range: Option<[usize; 2]>,
        #[serde(default = "default_multi_row_count")]
        multi_row_count: usize,
        #[serde(default = "default_merge_separator")]
        merge_separator: String,
        #[serde(default = "default_row_start_offset")]
        row_start_offset: usize,
        #[serde(default)]
        expect: HashMap<String, Vec<String>>,
    },
}

fn default_multi_row_count() -> usize {
    1
}
fn default_merge_separator() -> String {
    " ".to_string()
}
fn default_row_start_offset() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNumericConfig {
    #[serde(default = "default_thousands")]
    pub thousands_separator: char,
    #[serde(default = "default_decimal")]
    pub decimal_separator: char,
}

fn default_thousands() -> char {
    ','
}
fn default_decimal() -> char {
    '.'
}

impl Default for RawNumericConfig {
    fn default() -> Self {
        Self {
            thousands_separator: default_thousands(),
            decimal_separator: default_decimal(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDateParseConfig {
    pub format: Option<String>,
    pub time_format: Option<String>,
    /// `"excelSerial"` triggers spreadsheet-serial-date interpretation.
    pub input: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReferenceConfig {
    pub splitter: Option<String>,
    pub parts_count: Option<RawPartsCountRule>,
    pub order_id: Option<RawReferencePart>,
    pub utr: Option<RawReferencePart>,
    pub utr_fallback: Option<RawUtrFallback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum RawPartsCountRule {
    Exact { value: usize },
    OneOf { values: Vec<usize> },
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReferencePart {
    pub index: usize,
    #[serde(default)]
    pub clean_digits_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUtrFallback {
    pub regex: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "rule")]
pub enum RawPayInRule {
    AmountPositive,
    CreditColumn,
    OrderIdNoSpace,
    UtrNoSpace,
    NarrationContains { any_of: Vec<String> },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum RawRowStopConfig {
    #[default]
    None,
    BlankRow,
    UntilRegex {
        until_regex: String,
    },
}

// ---------------------------------------------------------------------
// Compiled layer
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProfileBook {
    pub banks: HashMap<String, BankProfile>,
}

#[derive(Debug, Clone)]
pub struct BankProfile {
    pub enabled: bool,
    pub formats: HashMap<FormatKind, FormatProfile>,
}

#[derive(Debug, Clone)]
pub struct FormatProfile {
    pub enabled: bool,
    pub headers: HeaderConfig,
    pub numeric: NumericConfig,
    pub date_parse: DateParseConfig,
    pub reference: ReferenceConfig,
    pub pay_in_rule: PayInRule,
    pub row_stop: RowStopConfig,

    pub charset: String,
    pub delimiter: char,
    pub skip_rows: usize,

    pub sheet_index: usize,

    pub start_after_regex: Option<Regex>,
    pub stop_before_regex: Option<Regex>,
    pub line_pattern: Option<Regex>,
}

#[derive(Debug, Clone)]
pub enum HeaderConfig {
    Fixed {
        row_start: usize,
        columns: HashMap<SemanticField, usize>,
    },
    Search {
        fixed_header_rows: Option<(usize, usize)>,
        scan_range: Option<(usize, usize)>,
        multi_row_count: usize,
        merge_separator: String,
        row_start_offset: usize,
        expect: HashMap<SemanticField, Vec<String>>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct NumericConfig {
    pub thousands_separator: char,
    pub decimal_separator: char,
}

#[derive(Debug, Clone)]
pub struct DateParseConfig {
    pub format: Option<String>,
    pub time_format: Option<String>,
    pub excel_serial: bool,
}

#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub splitter: Option<String>,
    pub parts_count: PartsCountRule,
    pub order_id: Option<ReferencePart>,
    pub utr: Option<ReferencePart>,
    pub utr_fallback: Option<Regex>,
}

#[derive(Debug, Clone)]
pub enum PartsCountRule {
    Exact(usize),
    OneOf(Vec<usize>),
    None,
}

impl PartsCountRule {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            PartsCountRule::Exact(n) => count == *n,
            PartsCountRule::OneOf(values) => values.contains(&count),
            PartsCountRule::None => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReferencePart {
    pub index: usize,
    pub clean_digits_only: bool,
}

#[derive(Debug, Clone)]
pub enum PayInRule {
    AmountPositive,
    CreditColumn,
    OrderIdNoSpace,
    UtrNoSpace,
    NarrationContains(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum RowStopConfig {
    None,
    BlankRow,
    UntilRegex(Regex),
}

// ---------------------------------------------------------------------
// Compilation / validation
// ---------------------------------------------------------------------

impl RawProfileBook {
    /// Validate and materialize defaults for every bank/format in the book.
    /// This is the only place regexes are compiled; the engine never compiles
    /// a regex per row or per invocation.
    pub fn compile(self) -> Result<ProfileBook, EngineError> {
        let mut banks = HashMap::new();
        for (key, raw_bank) in self.banks {
            let bank = raw_bank.compile(&key)?;
            banks.insert(key, bank);
        }
        Ok(ProfileBook { banks })
    }
}

impl RawBankProfile {
    fn compile(self, parser_key: &str) -> Result<BankProfile, EngineError> {
        let mut formats = HashMap::new();
        for (kind, raw) in [
            (FormatKind::Csv, self.csv),
            (FormatKind::XlsBinary, self.xls),
            (FormatKind::XlsxZipped, self.xlsx),
            (FormatKind::Pdf, self.pdf),
        ] {
            if let Some(raw) = raw {
                formats.insert(kind, raw.compile(parser_key, kind)?);
            }
        }
        Ok(BankProfile {
            enabled: effective_enabled(self.enabled),
            formats,
        })
    }
}

impl RawFormatProfile {
    fn compile(self, parser_key: &str, kind: FormatKind) -> Result<FormatProfile, EngineError> {
        let malformed = |reason: String| EngineError::MalformedProfile {
            parser_key: parser_key.to_string(),
            format_kind: kind.as_str().to_string(),
            reason,
        };

        let headers = match self.headers {
            Some(raw) => raw.compile(parser_key, kind)?,
            None => {
                return Err(malformed("missing `headers` block".to_string()));
            }
        };

        let reference = self.reference.compile(&malformed)?;
        let row_stop = self.row_stop.compile(&malformed)?;

        let start_after_regex = self
            .start_after_regex
            .as_deref()
            .map(|p| compile_regex(p, &malformed))
            .transpose()?;
        let stop_before_regex = self
            .stop_before_regex
            .as_deref()
            .map(|p| compile_regex(p, &malformed))
            .transpose()?;
        let line_pattern = self
            .line_pattern
            .as_deref()
            .map(|p| compile_regex(p, &malformed))
            .transpose()?;

        if matches!(kind, FormatKind::Pdf) && line_pattern.is_none() {
            return Err(malformed(
                "pdf format profiles require `linePattern`".to_string(),
            ));
        }

        Ok(FormatProfile {
            enabled: effective_enabled(self.enabled),
            headers,
            numeric: NumericConfig {
                thousands_separator: self.numeric.thousands_separator,
                decimal_separator: self.numeric.decimal_separator,
            },
            date_parse: DateParseConfig {
                format: self.date_parse.format.as_deref().map(translate_date_pattern),
                time_format: self
                    .date_parse
                    .time_format
                    .as_deref()
                    .map(translate_date_pattern),
                excel_serial: self.date_parse.input.as_deref() == Some("excelSerial"),
            },
            reference,
            pay_in_rule: self.pay_in_rule.compile(),
            row_stop,
            charset: self.charset.unwrap_or_else(|| "UTF-8".to_string()),
            delimiter: self.delimiter.unwrap_or(','),
            skip_rows: self.skip_rows,
            sheet_index: self.sheet_index,
            start_after_regex,
            stop_before_regex,
            line_pattern,
        })
    }
}

/// Translate a Java/Joda-style date pattern (`dd/MM/yyyy`, `HH:mm:ss`) into
/// `chrono`'s strptime syntax, once, at load time - the engine never
/// re-derives this translation per row.
fn translate_date_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // Java/Joda literal-text quoting: `''` is a literal quote, a
            // quoted span is copied through untouched (letters inside are
            // not pattern specifiers).
            if i + 1 < chars.len() && chars[i + 1] == '\'' {
                out.push('\'');
                i += 2;
                continue;
            }
            let mut j = i + 1;
            while j < chars.len() && chars[j] != '\'' {
                j += 1;
            }
            out.extend(&chars[i + 1..j]);
            i = if j < chars.len() { j + 1 } else { j };
        } else if c.is_ascii_alphabetic() {
            let mut j = i;
            while j < chars.len() && chars[j] == c {
                j += 1;
            }
            let run_len = j - i;
            let token = match c {
                'y' => {
                    if run_len >= 4 {
                        "%Y"
                    } else {
                        "%y"
                    }
                }
                'M' => match run_len {
                    1 => "%-m",
                    2 => "%m",
                    3 => "%b",
                    _ => "%B",
                },
                'd' => {
                    if run_len == 1 {
                        "%-d"
                    } else {
                        "%d"
                    }
                }
                'H' => "%H",
                'h' => "%I",
                'm' => {
                    if run_len == 1 {
                        "%-M"
                    } else {
                        "%M"
                    }
                }
                's' => "%S",
                'a' => "%p",
                _ => "",
            };
            if token.is_empty() {
                out.extend(std::iter::repeat(c).take(run_len));
            } else {
                out.push_str(token);
            }
            i = j;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

fn compile_regex(
    pattern: &str,
    malformed: &impl Fn(String) -> EngineError,
) -> Result<Regex, EngineError> {
    Regex::new(pattern).map_err(|e| malformed(format!("invalid regex '{pattern}': {e}")))
}

impl RawHeaderConfig {
    fn compile(self, parser_key: &str, kind: FormatKind) -> Result<HeaderConfig, EngineError> {
        let malformed = |reason: String| EngineError::MalformedProfile {
            parser_key: parser_key.to_string(),
            format_kind: kind.as_str().to_string(),
            reason,
        };
        match self {
            RawHeaderConfig::Fixed { row_start, columns } => {
                let mut compiled = HashMap::new();
                for (name, idx) in columns {
                    let field = SemanticField::from_str(&name)
                        .ok_or_else(|| malformed(format!("unknown semantic field '{name}'")))?;
                    compiled.insert(field, idx);
                }
                Ok(HeaderConfig::Fixed {
                    row_start,
                    columns: compiled,
                })
            }
            RawHeaderConfig::Search {
                fixed_header_rows,
                scan_range,
                multi_row_count,
                merge_separator,
                row_start_offset,
                expect,
            } => {
                if expect.is_empty() {
                    return Err(malformed(
                        "SEARCH mode requires a non-empty `expect` map".to_string(),
                    ));
                }
                let mut compiled = HashMap::new();
                for (name, synonyms) in expect {
                    let field = SemanticField::from_str(&name)
                        .ok_or_else(|| malformed(format!("unknown semantic field '{name}'")))?;
                    if synonyms.is_empty() {
                        return Err(malformed(format!(
                            "field '{name}' has an empty synonym list"
                        )));
                    }
                    compiled.insert(field, synonyms);
                }
                Ok(HeaderConfig::Search {
                    fixed_header_rows: fixed_header_rows.map(|[a, b]| (a, b)),
                    scan_range: scan_range.map(|[a, b]| (a, b)),
                    multi_row_count,
                    merge_separator,
                    row_start_offset,
                    expect: compiled,
                })
            }
        }
    }
}

impl RawReferenceConfig {
    fn compile(
        self,
        malformed: &impl Fn(String) -> EngineError,
    ) -> Result<ReferenceConfig, EngineError> {
        let parts_count = match self.parts_count {
            Some(RawPartsCountRule::Exact { value }) => PartsCountRule::Exact(value),
            Some(RawPartsCountRule::OneOf { values }) => PartsCountRule::OneOf(values),
            Some(RawPartsCountRule::None) | None => PartsCountRule::None,
        };

        if self.splitter.is_some() && (self.order_id.is_none() && self.utr.is_none()) {
            return Err(malformed(
                "`splitter` configured but neither `orderId` nor `utr` is mapped".to_string(),
            ));
        }

        let utr_fallback = self
            .utr_fallback
            .map(|f| compile_regex(&f.regex, malformed))
            .transpose()?;

        Ok(ReferenceConfig {
            splitter: self.splitter,
            parts_count,
            order_id: self.order_id.map(|p| ReferencePart {
                index: p.index,
                clean_digits_only: p.clean_digits_only,
            }),
            utr: self.utr.map(|p| ReferencePart {
                index: p.index,
                clean_digits_only: p.clean_digits_only,
            }),
            utr_fallback,
        })
    }
}

impl RawRowStopConfig {
    fn compile(
        self,
        malformed: &impl Fn(String) -> EngineError,
    ) -> Result<RowStopConfig, EngineError> {
        match self {
            RawRowStopConfig::None => Ok(RowStopConfig::None),
            RawRowStopConfig::BlankRow => Ok(RowStopConfig::BlankRow),
            RawRowStopConfig::UntilRegex { until_regex } => {
                Ok(RowStopConfig::UntilRegex(compile_regex(&until_regex, malformed)?))
            }
        }
    }
}

impl RawPayInRule {
    fn compile(self) -> PayInRule {
        match self {
            RawPayInRule::AmountPositive => PayInRule::AmountPositive,
            RawPayInRule::CreditColumn => PayInRule::CreditColumn,
            RawPayInRule::OrderIdNoSpace => PayInRule::OrderIdNoSpace,
            RawPayInRule::UtrNoSpace => PayInRule::UtrNoSpace,
            RawPayInRule::NarrationContains { any_of } => PayInRule::NarrationContains(any_of),
        }
    }
}

impl FormatProfile {
    /// Invariant 4: a header mapping is sufficient iff it covers date,
    /// reference, and at least one of amount/credit/debit.
    pub fn headers_sufficient(mapped: &HashMap<SemanticField, usize>) -> bool {
        mapped.contains_key(&SemanticField::Date)
            && mapped.contains_key(&SemanticField::Reference)
            && (mapped.contains_key(&SemanticField::Amount)
                || mapped.contains_key(&SemanticField::Credit)
                || mapped.contains_key(&SemanticField::Debit))
    }
}

//! Header location and field-to-column mapping.
//!
//! Written once against the `CellTextSource` + `MergeAware` capability pair
//! so the same scanning/matching code serves the delimited adapter and both
//! spreadsheet variants; only the match style (exact vs. substring) and
//! whether right-propagation applies differ, and those are passed in as a
//! `HeaderStyle`, not duplicated per adapter.

use std::collections::HashMap;

use crate::domain::error::{EngineError, SourceLocation};
use crate::domain::fields::SemanticField;
use crate::domain::profile::{FormatKind, FormatProfile, HeaderConfig};
use crate::ports::cell_source::{CellTextSource, MergeAware};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Exact match after normalization; no right-propagation.
    Delimited,
    /// Substring match with right-propagation of merged header bands.
    Spreadsheet,
}

#[derive(Debug, Clone)]
pub struct HeaderResolution {
    pub mapping: HashMap<SemanticField, usize>,
    pub data_start_row: usize,
    /// Per-column normalized header text, after right-propagation for
    /// spreadsheet style. Empty for FIXED mode and for `Delimited` style,
    /// neither of which needs it.
    pub header_band_text: Vec<Option<String>>,
}

pub struct HeaderResolver;

impl HeaderResolver {
    pub fn resolve<S: CellTextSource + MergeAware>(
        source: &S,
        headers: &HeaderConfig,
        style: HeaderStyle,
        parser_key: &str,
        format_kind: FormatKind,
    ) -> Result<HeaderResolution, EngineError> {
        match headers {
            HeaderConfig::Fixed { row_start, columns } => {
                if !FormatProfile::headers_sufficient(columns) {
                    return Err(EngineError::HeaderMappingInsufficient {
                        parser_key: parser_key.to_string(),
                        format_kind: format_kind.as_str().to_string(),
                        location: SourceLocation::Row(*row_start),
                    });
                }
                Ok(HeaderResolution {
                    mapping: columns.clone(),
                    data_start_row: *row_start,
                    header_band_text: Vec::new(),
                })
            }
            HeaderConfig::Search {
                fixed_header_rows,
                scan_range,
                multi_row_count,
                merge_separator,
                row_start_offset,
                expect,
            } => Self::resolve_search(
                source,
                *fixed_header_rows,
                *scan_range,
                *multi_row_count,
                merge_separator,
                *row_start_offset,
                expect,
                style,
                parser_key,
                format_kind,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_search<S: CellTextSource + MergeAware>(
        source: &S,
        fixed_header_rows: Option<(usize, usize)>,
        scan_range: Option<(usize, usize)>,
        multi_row_count: usize,
        merge_separator: &str,
        row_start_offset: usize,
        expect: &HashMap<SemanticField, Vec<String>>,
        style: HeaderStyle,
        parser_key: &str,
        format_kind: FormatKind,
    ) -> Result<HeaderResolution, EngineError> {
        let not_found = || EngineError::HeaderNotFound {
            parser_key: parser_key.to_string(),
            format_kind: format_kind.as_str().to_string(),
            location: SourceLocation::Unknown,
        };

        if let Some((from, _to)) = fixed_header_rows {
            let band_end = from + multi_row_count - 1;
            let (mapping, band_text) =
                Self::try_band(source, from, band_end, merge_separator, expect, style)
                    .ok_or_else(not_found)?;
            return Ok(HeaderResolution {
                mapping,
                data_start_row: band_end + row_start_offset,
                header_band_text: band_text,
            });
        }

        let total_rows = source.row_count();
        let (from, to) = scan_range.unwrap_or((0, total_rows.saturating_sub(1)));
        if to + 1 < multi_row_count {
            return Err(not_found());
        }
        let last_start = to + 1 - multi_row_count;

        for s in from..=last_start.min(total_rows) {
            let band_end = s + multi_row_count - 1;
            if let Some((mapping, band_text)) =
                Self::try_band(source, s, band_end, merge_separator, expect, style)
            {
                return Ok(HeaderResolution {
                    mapping,
                    data_start_row: band_end + row_start_offset,
                    header_band_text: band_text,
                });
            }
        }

        Err(not_found())
    }

    fn try_band<S: CellTextSource + MergeAware>(
        source: &S,
        row_from: usize,
        row_to: usize,
        join: &str,
        expect: &HashMap<SemanticField, Vec<String>>,
        style: HeaderStyle,
    ) -> Option<(HashMap<SemanticField, usize>, Vec<Option<String>>)> {
        let width = (row_from..=row_to)
            .map(|r| source.column_count(r))
            .max()
            .unwrap_or(0);

        // Build one row of normalized cell text at a time; for spreadsheet
        // style, propagate each row's non-blank text rightward into that
        // row's own blank columns first (a visually merged label only
        // occupies the merge's leftmost cell), then join each column's
        // per-row contributions across the band.
        let mut row_texts: Vec<Vec<Option<String>>> = Vec::with_capacity(row_to - row_from + 1);
        for r in row_from..=row_to {
            let mut row: Vec<Option<String>> = (0..width)
                .map(|c| {
                    source.cell_text(r, c).map(|t| normalize_whitespace(&t)).filter(|t| !t.is_empty())
                })
                .collect();
            if style == HeaderStyle::Spreadsheet {
                propagate_right(&mut row);
            }
            row_texts.push(row);
        }

        let mut band_text: Vec<Option<String>> = Vec::with_capacity(width);
        for c in 0..width {
            let pieces: Vec<String> = row_texts
                .iter()
                .filter_map(|row| row.get(c).cloned().flatten())
                .collect();
            band_text.push(if pieces.is_empty() {
                None
            } else {
                Some(pieces.join(join))
            });
        }

        let mut mapping = HashMap::new();
        for (field, synonyms) in expect {
            for (col, text) in band_text.iter().enumerate() {
                let Some(text) = text else { continue };
                let normalized = casefold(text);
                let matches = synonyms.iter().any(|syn| {
                    let norm_syn = casefold(syn);
                    match style {
                        HeaderStyle::Delimited => normalized == norm_syn,
                        HeaderStyle::Spreadsheet => normalized.contains(&norm_syn),
                    }
                });
                if matches {
                    mapping.insert(*field, col);
                    break;
                }
            }
        }

        if FormatProfile::headers_sufficient(&mapping) {
            Some((mapping, band_text))
        } else {
            None
        }
    }
}

/// Propagate non-empty header text rightward into any subsequent empty
/// column of the same row until another non-empty column appears,
/// reconstructing a visually merged header label that only occupies the
/// merge's leftmost cell.
fn propagate_right(band_text: &mut [Option<String>]) {
    let mut carry: Option<String> = None;
    for slot in band_text.iter_mut() {
        match slot {
            Some(text) => carry = Some(text.clone()),
            None => {
                if let Some(text) = &carry {
                    *slot = Some(text.clone());
                }
            }
        }
    }
}

/// Collapse whitespace runs to one space, replace no-break space, and trim.
fn normalize_whitespace(s: &str) -> String {
    let replaced: String = s.chars().map(|c| if c == '\u{a0}' { ' ' } else { c }).collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn casefold(s: &str) -> String {
    normalize_whitespace(s).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::cell_source::NeverMerged;

    struct FakeSource(Vec<Vec<&'static str>>);
    impl NeverMerged for FakeSource {}
    impl CellTextSource for FakeSource {
        fn row_count(&self) -> usize {
            self.0.len()
        }
        fn column_count(&self, row: usize) -> usize {
            self.0.get(row).map(|r| r.len()).unwrap_or(0)
        }
        fn cell_text(&self, row: usize, col: usize) -> Option<String> {
            self.0.get(row).and_then(|r| r.get(col)).map(|s| s.to_string())
        }
    }

    fn expect_map() -> HashMap<SemanticField, Vec<String>> {
        let mut m = HashMap::new();
        m.insert(SemanticField::Date, vec!["Date".to_string()]);
        m.insert(SemanticField::Reference, vec!["Narration".to_string()]);
        m.insert(SemanticField::Credit, vec!["Credit".to_string()]);
        m.insert(SemanticField::Debit, vec!["Debit".to_string()]);
        m
    }

    #[test]
    fn single_row_header_exact_match() {
        let source = FakeSource(vec![
            vec!["Date", "Narration", "Credit", "Debit"],
            vec!["01/04/2025", "NEFT CR", "1000.00", ""],
        ]);
        let headers = HeaderConfig::Search {
            fixed_header_rows: None,
            scan_range: Some((0, 0)),
            multi_row_count: 1,
            merge_separator: " ".to_string(),
            row_start_offset: 1,
            expect: expect_map(),
        };
        let res = HeaderResolver::resolve(&source, &headers, HeaderStyle::Delimited, "hdfc", FormatKind::Csv)
            .unwrap();
        assert_eq!(res.mapping[&SemanticField::Date], 0);
        assert_eq!(res.mapping[&SemanticField::Reference], 1);
        assert_eq!(res.data_start_row, 1);
    }

    #[test]
    fn merged_band_matches_by_substring_for_spreadsheet_style() {
        let source = FakeSource(vec![
            vec!["Transaction Details", "", "", ""],
            vec!["Date", "Narration", "Credit", "Debit"],
        ]);
        let headers = HeaderConfig::Search {
            fixed_header_rows: None,
            scan_range: Some((0, 1)),
            multi_row_count: 2,
            merge_separator: " ".to_string(),
            row_start_offset: 1,
            expect: expect_map(),
        };
        let res =
            HeaderResolver::resolve(&source, &headers, HeaderStyle::Spreadsheet, "hdfc", FormatKind::XlsxZipped)
                .unwrap();
        assert_eq!(res.mapping[&SemanticField::Date], 0);
        assert_eq!(res.data_start_row, 2);
        assert_eq!(
            res.header_band_text[1].as_deref(),
            Some("Transaction Details Narration")
        );
        assert_eq!(
            res.header_band_text[3].as_deref(),
            Some("Transaction Details Debit")
        );
    }

    #[test]
    fn header_not_found_when_expect_never_matches() {
        let source = FakeSource(vec![vec!["Foo", "Bar"]]);
        let headers = HeaderConfig::Search {
            fixed_header_rows: None,
            scan_range: Some((0, 0)),
            multi_row_count: 1,
            merge_separator: " ".to_string(),
            row_start_offset: 1,
            expect: expect_map(),
        };
        assert!(HeaderResolver::resolve(&source, &headers, HeaderStyle::Delimited, "hdfc", FormatKind::Csv)
            .is_err());
    }
}

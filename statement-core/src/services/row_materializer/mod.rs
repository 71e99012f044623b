//! Row materialization: the shared numeric/date/reference/payIn pipeline,
//! plus format-specific variants in `delimited`, `spreadsheet`, and `pdf`.

pub mod delimited;
pub mod pdf;
pub mod spreadsheet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::profile::{
    DateParseConfig, FormatProfile, NumericConfig, PartsCountRule, PayInRule, ReferenceConfig,
};
use crate::domain::row::ParsedRow;

/// Raw per-field cell text for one candidate row, before numeric/date
/// parsing. Each format's adapter builds this however it needs to (plain
/// indexing for delimited, flexible-read probing for spreadsheet, named
/// regex groups for PDF); `materialize_row` then runs the one shared
/// pipeline (§4.4 steps 3-8) against it.
#[derive(Debug, Clone, Default)]
pub struct RowInputs {
    pub date: Option<String>,
    pub time: Option<String>,
    pub reference: Option<String>,
    pub credit: Option<String>,
    pub debit: Option<String>,
    pub amount: Option<String>,
    pub balance: Option<String>,
}

/// Run the common row pipeline: parse numbers, derive amount, parse the
/// date/time, split the reference, and classify pay-in. Returns `None` when
/// the row must be dropped (invariants 1-2): no amount, or no date.
pub fn materialize_row(inputs: RowInputs, profile: &FormatProfile) -> Option<ParsedRow> {
    let credit = inputs
        .credit
        .as_deref()
        .and_then(|s| parse_decimal(s, &profile.numeric));
    let debit = inputs
        .debit
        .as_deref()
        .and_then(|s| parse_decimal(s, &profile.numeric));
    let amount_raw = inputs
        .amount
        .as_deref()
        .and_then(|s| parse_decimal(s, &profile.numeric));
    let amount = derive_amount(amount_raw, credit, debit)?;
    let balance = inputs
        .balance
        .as_deref()
        .and_then(|s| parse_decimal(s, &profile.numeric));

    let date_str = inputs.date.filter(|s| !s.trim().is_empty())?;
    let transaction_date_time =
        parse_date_time(&date_str, inputs.time.as_deref(), &profile.date_parse)?;

    let reference = inputs.reference.unwrap_or_default();
    let (order_id, utr) = split_reference(&reference, &profile.reference);
    let pay_in = classify_pay_in(
        &profile.pay_in_rule,
        amount,
        order_id.as_deref(),
        utr.as_deref(),
        &reference,
    );

    Some(
        ParsedRow::new(transaction_date_time, amount, reference, pay_in)
            .with_balance(balance)
            .with_order_id(order_id)
            .with_utr(utr),
    )
}

/// Strip the configured thousands separator, normalize the decimal
/// separator to `.`, honor parentheses-negation, and keep only digits, `.`,
/// and a leading `-`. Blank/non-numeric input is `None`, never zero.
pub fn parse_decimal(raw: &str, numeric: &NumericConfig) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let negative_parens = trimmed.starts_with('(') && trimmed.ends_with(')');
    let inner = if negative_parens {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let mut normalized = String::with_capacity(inner.len());
    for c in inner.chars() {
        if c == numeric.thousands_separator {
            continue;
        }
        if c == numeric.decimal_separator {
            normalized.push('.');
            continue;
        }
        if c.is_ascii_digit() || c == '-' || c == '.' {
            normalized.push(c);
        }
        // anything else (currency symbols, whitespace, letters) is dropped
    }

    if normalized.is_empty() || normalized == "-" {
        return None;
    }

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative_parens { -value } else { value })
}

/// Amount derivation: `credit - debit` when either column is mapped
/// (nulls zeroed), otherwise the direct `amount` column.
pub fn derive_amount(
    amount: Option<Decimal>,
    credit: Option<Decimal>,
    debit: Option<Decimal>,
) -> Option<Decimal> {
    if credit.is_some() || debit.is_some() {
        Some(credit.unwrap_or(Decimal::ZERO) - debit.unwrap_or(Decimal::ZERO))
    } else {
        amount
    }
}

const TIME_FALLBACKS: [&str; 4] = ["%H:%M", "%-H:%M", "%H%M", "%-I:%M %p"];

/// Parse a date/time pair per the preference order in §4.4.5: Excel serial,
/// then ISO, then the configured pattern; a separate time column falls back
/// through a short list of common patterns when the configured one fails.
pub fn parse_date_time(
    raw_date: &str,
    raw_time: Option<&str>,
    config: &DateParseConfig,
) -> Option<NaiveDateTime> {
    let date_part = raw_date.trim();
    if date_part.is_empty() {
        return None;
    }

    if config.excel_serial {
        if let Ok(serial) = date_part.parse::<f64>() {
            let serial_dt = excel_serial_to_datetime(serial);
            let time = match raw_time.map(str::trim).filter(|s| !s.is_empty()) {
                Some(raw) => parse_time(raw, config.time_format.as_deref())?,
                None => serial_dt.time(),
            };
            return Some(NaiveDateTime::new(serial_dt.date(), time));
        }
    }

    let date_only = parse_iso_or_configured(date_part, config);
    let date = date_only?;

    let time = match raw_time.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_time(raw, config.time_format.as_deref())?,
        None => NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
    };

    Some(NaiveDateTime::new(date, time))
}

fn parse_iso_or_configured(date_part: &str, config: &DateParseConfig) -> Option<NaiveDate> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_part, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(format) = &config.format {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, format) {
            return Some(d);
        }
        // the configured format may include a time component
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_part, format) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_time(raw: &str, configured: Option<&str>) -> Option<NaiveTime> {
    if let Some(format) = configured {
        if let Ok(t) = NaiveTime::parse_from_str(raw, format) {
            return Some(t);
        }
    }
    for fallback in TIME_FALLBACKS {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fallback) {
            return Some(t);
        }
    }
    None
}

/// Spreadsheet serial dates count whole days since 1899-12-30; the
/// fractional part is the time of day.
pub fn excel_serial_to_datetime(serial: f64) -> NaiveDateTime {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let days = serial.floor() as i64;
    let date = epoch + chrono::Duration::days(days);
    let fraction = serial - serial.floor();
    let seconds_in_day = (fraction * 86_400.0).round() as i64;
    let time = NaiveTime::from_hms_opt(0, 0, 0).unwrap() + chrono::Duration::seconds(seconds_in_day);
    NaiveDateTime::new(date, time)
}

/// Split `reference` by the configured literal splitter, validate the part
/// count, and extract order-id/UTR (with optional digit-only cleaning and a
/// regex fallback for UTR).
pub fn split_reference(
    reference: &str,
    config: &ReferenceConfig,
) -> (Option<String>, Option<String>) {
    let mut order_id = None;
    let mut utr = None;

    if let Some(splitter) = &config.splitter {
        if !splitter.is_empty() {
            let parts: Vec<&str> = reference.split(splitter.as_str()).collect();
            if config.parts_count.accepts(parts.len()) {
                if let Some(spec) = &config.order_id {
                    order_id = parts.get(spec.index).map(|p| clean_part(p, spec.clean_digits_only));
                }
                if let Some(spec) = &config.utr {
                    utr = parts
                        .get(spec.index)
                        .map(|p| clean_part(p, spec.clean_digits_only))
                        .filter(|s| !s.is_empty());
                }
            }
        }
    }

    if utr.is_none() {
        if let Some(fallback) = &config.utr_fallback {
            utr = fallback
                .find(reference)
                .map(|m| m.as_str().to_string());
        }
    }

    (order_id, utr)
}

fn clean_part(part: &str, digits_only: bool) -> String {
    let trimmed = part.trim();
    if digits_only {
        trimmed.chars().filter(|c| c.is_ascii_digit()).collect()
    } else {
        trimmed.to_string()
    }
}

/// §4.4 step 8: classify whether this row is a credit (pay-in) to the
/// account.
pub fn classify_pay_in(
    rule: &PayInRule,
    amount: Decimal,
    order_id: Option<&str>,
    utr: Option<&str>,
    reference: &str,
) -> bool {
    let positive = amount > Decimal::ZERO;
    match rule {
        PayInRule::AmountPositive | PayInRule::CreditColumn => positive,
        PayInRule::OrderIdNoSpace => {
            positive && order_id.map(|s| !s.contains(' ')).unwrap_or(true)
        }
        PayInRule::UtrNoSpace => positive && utr.map(|s| !s.contains(' ')).unwrap_or(true),
        PayInRule::NarrationContains(needles) => {
            let lower = reference.to_lowercase();
            needles.iter().any(|n| lower.contains(&n.to_lowercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(thousands: char, decimal: char) -> NumericConfig {
        NumericConfig {
            thousands_separator: thousands,
            decimal_separator: decimal,
        }
    }

    #[test]
    fn parses_us_format() {
        assert_eq!(
            parse_decimal("1,234.56", &numeric(',', '.')),
            Some(Decimal::from_str("1234.56").unwrap())
        );
    }

    #[test]
    fn parses_european_format() {
        assert_eq!(
            parse_decimal("1.234,56", &numeric('.', ',')),
            Some(Decimal::from_str("1234.56").unwrap())
        );
    }

    #[test]
    fn parentheses_negate() {
        assert_eq!(
            parse_decimal("(78,90)", &numeric(',', '.')),
            Some(Decimal::from_str("-78.90").unwrap())
        );
    }

    #[test]
    fn blank_input_is_none_not_zero() {
        assert_eq!(parse_decimal("", &numeric(',', '.')), None);
        assert_eq!(parse_decimal("   ", &numeric(',', '.')), None);
    }

    #[test]
    fn derive_amount_uses_credit_minus_debit_when_present() {
        let credit = Some(Decimal::from_str("1000.00").unwrap());
        assert_eq!(
            derive_amount(None, credit, None),
            Some(Decimal::from_str("1000.00").unwrap())
        );
        let debit = Some(Decimal::from_str("500.50").unwrap());
        assert_eq!(
            derive_amount(None, None, debit),
            Some(Decimal::from_str("-500.50").unwrap())
        );
    }

    #[test]
    fn excel_serial_epoch_conversion() {
        let dt = excel_serial_to_datetime(45748.5);
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 4, 19).unwrap());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    fn excel_serial_config() -> DateParseConfig {
        DateParseConfig {
            format: None,
            time_format: None,
            excel_serial: true,
        }
    }

    #[test]
    fn excel_serial_without_time_column_uses_fractional_part() {
        let dt = parse_date_time("45748.5", None, &excel_serial_config()).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 4, 19).unwrap());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn excel_serial_with_time_column_overrides_the_fraction() {
        let dt = parse_date_time("45748.5", Some("09:15"), &excel_serial_config()).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 4, 19).unwrap());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
    }

    #[test]
    fn splits_reference_into_order_id_and_utr() {
        let config = ReferenceConfig {
            splitter: Some("/".to_string()),
            parts_count: PartsCountRule::OneOf(vec![3]),
            order_id: Some(crate::domain::profile::ReferencePart {
                index: 2,
                clean_digits_only: false,
            }),
            utr: Some(crate::domain::profile::ReferencePart {
                index: 1,
                clean_digits_only: false,
            }),
            utr_fallback: None,
        };
        let (order_id, utr) = split_reference("NEFT CR/UTR123456789012/ORD77", &config);
        assert_eq!(order_id.as_deref(), Some("ORD77"));
        assert_eq!(utr.as_deref(), Some("UTR123456789012"));
    }

    #[test]
    fn pay_in_order_id_no_space_rule() {
        let amount = Decimal::from_str("10.0").unwrap();
        assert!(classify_pay_in(
            &PayInRule::OrderIdNoSpace,
            amount,
            Some("ORD77"),
            None,
            "x"
        ));
        assert!(!classify_pay_in(
            &PayInRule::OrderIdNoSpace,
            amount,
            Some("ORD 77"),
            None,
            "x"
        ));
    }
}

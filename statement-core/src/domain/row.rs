//! The engine's output record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// One materialized transaction row, in document order.
///
/// `amount` is never null for an emitted row (rows that cannot produce one
/// are dropped before reaching this type), and `pay_in` always reflects the
/// format profile's configured rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// Wall-clock date-time; no timezone is attached or implied.
    pub transaction_date_time: NaiveDateTime,
    /// Signed amount: positive is a credit to the account.
    pub amount: Decimal,
    pub balance: Option<Decimal>,
    /// The raw, unsplit reference/narration text.
    pub reference: String,
    pub order_id: Option<String>,
    pub utr: Option<String>,
    pub pay_in: bool,
}

impl ParsedRow {
    pub fn new(
        transaction_date_time: NaiveDateTime,
        amount: Decimal,
        reference: impl Into<String>,
        pay_in: bool,
    ) -> Self {
        Self {
            transaction_date_time,
            amount,
            balance: None,
            reference: reference.into(),
            order_id: None,
            utr: None,
            pay_in,
        }
    }

    pub fn with_balance(mut self, balance: Option<Decimal>) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_order_id(mut self, order_id: Option<String>) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn with_utr(mut self, utr: Option<String>) -> Self {
        self.utr = utr;
        self
    }
}

//! The closed set of semantic fields the engine understands.

use std::fmt;

/// A semantic field a header column (or PDF capture group) can be mapped to.
///
/// This set is closed: profiles cannot introduce new fields, only map source
/// columns onto these seven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticField {
    Date,
    Time,
    Reference,
    Credit,
    Debit,
    Amount,
    Balance,
}

impl SemanticField {
    pub const ALL: [SemanticField; 7] = [
        SemanticField::Date,
        SemanticField::Time,
        SemanticField::Reference,
        SemanticField::Credit,
        SemanticField::Debit,
        SemanticField::Amount,
        SemanticField::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Date => "date",
            SemanticField::Time => "time",
            SemanticField::Reference => "reference",
            SemanticField::Credit => "credit",
            SemanticField::Debit => "debit",
            SemanticField::Amount => "amount",
            SemanticField::Balance => "balance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "date" => Some(SemanticField::Date),
            "time" => Some(SemanticField::Time),
            "reference" => Some(SemanticField::Reference),
            "credit" => Some(SemanticField::Credit),
            "debit" => Some(SemanticField::Debit),
            "amount" => Some(SemanticField::Amount),
            "balance" => Some(SemanticField::Balance),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for field in SemanticField::ALL {
            assert_eq!(SemanticField::from_str(field.as_str()), Some(field));
        }
    }

    #[test]
    fn unknown_string_is_none() {
        assert_eq!(SemanticField::from_str("narration"), None);
    }
}

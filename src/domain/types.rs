//! Shared domain value types aligned with the wire format.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a rendered block or table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoPosition {
    Top,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsPosition {
    Left,
    Right,
}

/// Business fields a layout may place in the receipt header, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderField {
    BusinessName,
    BusinessAddress,
    BusinessPhone,
    BusinessEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsField {
    Subtotal,
    Tax,
    Total,
}

/// Generation allowance. A balance at or above [`Credits::UNLIMITED`] marks an
/// active subscription and is never decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credits(pub i64);

impl Credits {
    pub const UNLIMITED: i64 = 999_999;

    pub fn unlimited() -> Self {
        Self(Self::UNLIMITED)
    }

    pub fn is_unlimited(self) -> bool {
        self.0 >= Self::UNLIMITED
    }

    pub fn is_exhausted(self) -> bool {
        self.0 <= 0
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_sentinel_is_never_exhausted() {
        assert!(Credits::unlimited().is_unlimited());
        assert!(!Credits::unlimited().is_exhausted());
        assert!(Credits(Credits::UNLIMITED + 5).is_unlimited());
    }

    #[test]
    fn zero_and_negative_balances_are_exhausted() {
        assert!(Credits(0).is_exhausted());
        assert!(Credits(-1).is_exhausted());
        assert!(!Credits(1).is_exhausted());
    }

    #[test]
    fn header_fields_use_wire_casing() {
        let field: HeaderField = serde_json::from_str("\"businessName\"").expect("parse");
        assert_eq!(field, HeaderField::BusinessName);
        assert_eq!(
            serde_json::to_string(&HeaderField::BusinessEmail).expect("serialize"),
            "\"businessEmail\""
        );
    }
}

//! Money amounts in minor units and currency codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing money amounts or currency codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount text is not a decimal number with at most two fraction digits.
    #[error("Malformed amount: {0:?}")]
    MalformedAmount(String),

    /// The amount does not fit in the minor-unit range.
    #[error("Amount out of range: {0:?}")]
    OutOfRange(String),

    /// The currency is not a three-letter code.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// Money amount represented in minor units (cents) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Parses a decimal major-unit amount such as `"12"`, `"12.5"` or `"12.50"`.
    pub fn parse_decimal(text: &str) -> Result<Self, MoneyError> {
        let trimmed = text.trim();
        let malformed = || MoneyError::MalformedAmount(text.to_string());

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if digits.ends_with('.') {
            return Err(malformed());
        }

        let out_of_range = || MoneyError::OutOfRange(text.to_string());
        let whole: i64 = whole.parse().map_err(|_| out_of_range())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse().map_err(|_| malformed())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(out_of_range)?;

        Ok(Self::from_cents(if negative { -cents } else { cents }))
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// Lowercase ISO 4217 currency code, e.g. `usd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parses a three-letter currency code, normalising it to lowercase.
    pub fn parse(code: &str) -> Result<Self, MoneyError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// US dollars.
    pub fn usd() -> Self {
        Self("usd".to_string())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_parse_decimal_amounts() {
        assert_eq!(Money::parse_decimal("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse_decimal("12.05").unwrap().cents(), 1205);
        assert_eq!(Money::parse_decimal(" 0.99 ").unwrap().cents(), 99);
        assert_eq!(Money::parse_decimal("-3.10").unwrap().cents(), -310);
    }

    #[test]
    fn test_parse_decimal_rejects_malformed() {
        for bad in ["", "abc", "1.234", "1.", ".5", "1,50", "1e3", "--1"] {
            assert!(
                matches!(Money::parse_decimal(bad), Err(MoneyError::MalformedAmount(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_decimal_rejects_overflow() {
        let result = Money::parse_decimal("99999999999999999999");
        assert!(matches!(result, Err(MoneyError::OutOfRange(_))));
    }


    #[test]
    fn test_currency_normalises_case() {
        assert_eq!(Currency::parse("USD").unwrap().as_str(), "usd");
        assert!(Currency::parse("dollars").is_err());
        assert!(Currency::parse("u5d").is_err());
    }

    #[test]
    fn test_currency_deserialization_validates() {
        let ok: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(ok.as_str(), "eur");
        assert!(serde_json::from_str::<Currency>("\"euro\"").is_err());
    }
}

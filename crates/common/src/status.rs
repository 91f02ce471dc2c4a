//! Order status axes.
//!
//! Fulfillment and payment are independent: staff advance fulfillment,
//! only payment reconciliation advances payment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status string that is not one of the legal values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {axis} status: {value:?}")]
pub struct StatusParseError {
    pub axis: &'static str,
    pub value: String,
}

/// Fulfillment progress of an order.
///
/// ```text
/// Pending ──┬──► Delivered
///           └──► Cancelled
/// ```
///
/// Staff may set any legal value; the core only guarantees that nothing
/// outside this set is ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    #[default]
    Pending,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FulfillmentStatus::Pending),
            "delivered" => Ok(FulfillmentStatus::Delivered),
            "cancelled" => Ok(FulfillmentStatus::Cancelled),
            other => Err(StatusParseError {
                axis: "fulfillment",
                value: other.to_string(),
            }),
        }
    }
}

/// Payment progress of an order. Monotonic: `Paid` is never reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    /// Returns true once the order has been paid.
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(StatusParseError {
                axis: "payment",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_pending_and_unpaid() {
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_fulfillment_parse_accepts_only_legal_values() {
        assert_eq!(
            "delivered".parse::<FulfillmentStatus>().unwrap(),
            FulfillmentStatus::Delivered
        );
        let err = "shipped".parse::<FulfillmentStatus>().unwrap_err();
        assert_eq!(err.value, "shipped");
        assert!("Pending".parse::<FulfillmentStatus>().is_err());
    }

    #[test]
    fn test_payment_parse() {
        assert!("paid".parse::<PaymentStatus>().unwrap().is_paid());
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_serialization_uses_lowercase_names() {
        let json = serde_json::to_string(&FulfillmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let status: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(status, PaymentStatus::Paid);
    }
}

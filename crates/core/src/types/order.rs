//! Locally stored order history records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Cents, OrderStatus};

/// One entry of the local order history.
///
/// History written by older storefront builds is sparse (dollar subtotals,
/// missing status), so every field is optional and the accessors apply the
/// display fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Payment id for the order.
    #[serde(default)]
    pub id: String,
    /// When the order was placed.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ts: Option<DateTime<Utc>>,
    /// Number of items in the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_c: Option<Cents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_c: Option<Cents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_c: Option<Cents>,
    /// Legacy subtotal in dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderRecord {
    /// The amount to show for this order.
    ///
    /// Prefers `total_c`, then `subtotal_c`, then the legacy dollar
    /// `subtotal`. Negative or missing amounts show as zero.
    #[must_use]
    pub fn display_amount(&self) -> Cents {
        self.total_c
            .or(self.subtotal_c)
            .or_else(|| self.subtotal.and_then(Cents::from_dollars))
            .unwrap_or(Cents::ZERO)
            .non_negative()
    }

    /// Short human reference: the last 8 characters of the id, uppercased.
    ///
    /// Returns `—` when the order has no id.
    #[must_use]
    pub fn short_reference(&self) -> String {
        let len = self.id.chars().count();
        if len == 0 {
            return "—".to_string();
        }
        self.id
            .chars()
            .skip(len.saturating_sub(8))
            .collect::<String>()
            .to_uppercase()
    }

    /// Status, defaulting to paid.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status.unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_prefers_total() {
        let order = OrderRecord {
            total_c: Some(Cents::new(2200)),
            subtotal_c: Some(Cents::new(2000)),
            ..OrderRecord::default()
        };
        assert_eq!(order.display_amount(), Cents::new(2200));
    }

    #[test]
    fn test_amount_falls_back_to_legacy_dollars() {
        let order: OrderRecord = serde_json::from_str(r#"{"id":"x","subtotal":149.99}"#).unwrap();
        assert_eq!(order.display_amount(), Cents::new(14_999));
    }

    #[test]
    fn test_amount_negative_and_missing_are_zero() {
        let order = OrderRecord {
            total_c: Some(Cents::new(-5)),
            ..OrderRecord::default()
        };
        assert_eq!(order.display_amount(), Cents::ZERO);
        assert_eq!(OrderRecord::default().display_amount(), Cents::ZERO);
    }

    #[test]
    fn test_short_reference() {
        let order = OrderRecord {
            id: "pi_3abcdefghijk".into(),
            ..OrderRecord::default()
        };
        assert_eq!(order.short_reference(), "DEFGHIJK");
        assert_eq!(OrderRecord::default().short_reference(), "—");
    }

    #[test]
    fn test_timestamp_is_epoch_millis() {
        let order: OrderRecord = serde_json::from_str(r#"{"id":"x","ts":1700000000000}"#).unwrap();
        assert_eq!(order.ts.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(order.status(), OrderStatus::Paid);
    }
}

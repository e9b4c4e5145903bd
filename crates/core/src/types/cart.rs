//! Cart lines as persisted in local storage.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Cents, ProductId};

/// A product-id/quantity pair representing purchase intent.
///
/// Serialized as `{"id": ..., "qty": ...}`, the format the storefront has
/// always written to local storage. The quantity is always at least 1;
/// missing, zero, or negative stored quantities read back as 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(rename = "qty", default = "one", deserialize_with = "at_least_one")]
    quantity: u32,
}

impl CartLine {
    /// Create a line, clamping `quantity` to at least 1.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity: clamp_quantity(quantity),
        }
    }

    /// The line quantity (always ≥ 1).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Replace the quantity, clamping to at least 1.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = clamp_quantity(quantity);
    }

    /// Increase the quantity by one, saturating.
    pub const fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }
}

/// A denormalized cart line sent with the payment request.
///
/// Carries the unit price known when the quote was issued so the payment
/// record does not depend on a live catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactCartLine {
    /// Product id.
    pub id: ProductId,
    /// Quantity.
    pub qty: u32,
    /// Unit price in cents at quote time.
    pub p: Cents,
}

/// Clamp an arbitrary integer quantity into the valid `1..=u32::MAX` range.
#[must_use]
pub fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

const fn one() -> u32 {
    1
}

fn at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map_or(1, clamp_quantity))
}

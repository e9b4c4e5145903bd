//! Server-issued tax quotes.

use serde::{Deserialize, Serialize};

use super::{Cents, QuoteId};

/// An address-dependent tax computation tied to one cart snapshot.
///
/// `subtotal_cents` is the subtotal the storefront displays, which may have
/// been reconstructed from the server's total (see
/// [`TaxQuote::from_server_amounts`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxQuote {
    pub quote_id: QuoteId,
    pub subtotal_cents: Cents,
    pub tax_cents: Cents,
}

impl TaxQuote {
    /// Build a quote from the raw server amounts.
    ///
    /// If the server reports a zero subtotal while the cart has items, the
    /// subtotal is reconstructed as `max(0, total - tax)`. This papers over
    /// an inconsistent server response; it is not guaranteed to be correct.
    #[must_use]
    pub fn from_server_amounts(
        quote_id: QuoteId,
        subtotal: Cents,
        tax: Cents,
        total: Cents,
        cart_item_count: u64,
    ) -> Self {
        let subtotal_cents = if cart_item_count > 0 && subtotal.is_zero() {
            (total - tax).non_negative()
        } else {
            subtotal
        };

        Self {
            quote_id,
            subtotal_cents,
            tax_cents: tax,
        }
    }

    /// Subtotal plus tax.
    #[must_use]
    pub fn total_cents(&self) -> Cents {
        self.subtotal_cents + self.tax_cents
    }
}

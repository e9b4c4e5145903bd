//! Client-side totals.

use serde::{Deserialize, Serialize};

use seattle_trading_core::{CartLine, Cents, CurrencyCode, TaxQuote};

use crate::catalog::Catalog;

/// Item count and subtotal of a cart, computed from catalog prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Sum of quantities over resolvable lines.
    pub item_count: u64,
    /// Sum of `unit price × quantity` over resolvable lines.
    pub subtotal: Cents,
}

/// Compute the optimistic (tax-free) totals of a cart.
///
/// Lines whose product is not in the catalog contribute nothing.
#[must_use]
pub fn compute_totals(lines: &[CartLine], catalog: &Catalog) -> Totals {
    lines
        .iter()
        .filter_map(|line| {
            catalog
                .get(&line.product_id)
                .map(|product| (line.quantity(), product.unit_price_cents))
        })
        .fold(Totals::default(), |acc, (quantity, price)| Totals {
            item_count: acc.item_count + u64::from(quantity),
            subtotal: acc.subtotal + price * quantity,
        })
}

/// Totals from the last authoritative quote, persisted for the
/// confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsSnapshot {
    pub subtotal_c: Cents,
    pub tax_c: Cents,
    pub total_c: Cents,
    pub currency: CurrencyCode,
}

impl From<&TaxQuote> for TotalsSnapshot {
    fn from(quote: &TaxQuote) -> Self {
        Self {
            subtotal_c: quote.subtotal_cents,
            tax_c: quote.tax_cents,
            total_c: quote.total_cents(),
            currency: CurrencyCode::Usd,
        }
    }
}

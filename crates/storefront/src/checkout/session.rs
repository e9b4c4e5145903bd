//! Checkout session: the reconciler wired to storage and remote services.

use tracing::{info, instrument, warn};

use seattle_trading_core::{
    AddressField, CartLine, OrderRecord, OrderStatus, ProductId, ShippingAddress,
};

use super::{
    CheckoutDisplay, CheckoutError, CheckoutInput, CheckoutState, Confirmation, Customer,
    Reconciler,
};
use crate::account::OrderHistory;
use crate::api::CheckoutApi;
use crate::cart::{AddOutcome, CartStore};
use crate::catalog::Catalog;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::payment::PaymentWidget;
use crate::storage::{KeyValueStore, keys, write_json};
use crate::totals::TotalsSnapshot;

/// One buyer's checkout page.
///
/// Every cart or address change goes through the session, which re-runs the
/// reconciler and performs whatever request it asks for before returning.
pub struct CheckoutSession<S, A, W> {
    store: S,
    catalog: Catalog,
    api: A,
    widget: W,
    reconciler: Reconciler,
    address: ShippingAddress,
    customer: Customer,
}

impl<S, A, W> CheckoutSession<S, A, W>
where
    S: KeyValueStore,
    A: CheckoutApi,
    W: PaymentWidget,
{
    pub fn new(store: S, catalog: Catalog, api: A, widget: W, reconciler: Reconciler) -> Self {
        Self {
            store,
            catalog,
            api,
            widget,
            reconciler,
            address: ShippingAddress::default(),
            customer: Customer::default(),
        }
    }

    /// Use `customer` for the payment request and as the default
    /// shipping name.
    #[must_use]
    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    #[must_use]
    pub const fn display(&self) -> &CheckoutDisplay {
        self.reconciler.display()
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.reconciler.state()
    }

    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    fn cart(&self) -> CartStore<&S> {
        CartStore::new(&self.store)
    }

    fn input(&self) -> Result<CheckoutInput> {
        let lines = self.cart().current_lines(&self.catalog)?;
        let address = self.customer.fill_name(&self.address);
        Ok(CheckoutInput::new(&lines, &self.catalog, &address))
    }

    /// Re-run the reconciler against the stored cart and current address,
    /// requesting a tax quote if needed.
    ///
    /// A failed quote is not an error here: it shows up in the display.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&CheckoutDisplay> {
        let input = self.input()?;
        if let Some(request) = self.reconciler.recalculate(&input) {
            let result = self.api.tax_preview(&request.body).await;
            self.reconciler.apply_quote(request.generation, result);

            if let (CheckoutState::QuoteReady, Some(quote)) =
                (self.reconciler.state(), self.reconciler.quote())
            {
                write_json(&self.store, keys::LAST_TOTALS, &TotalsSnapshot::from(quote))?;
            }
        }
        Ok(self.reconciler.display())
    }

    /// Replace the whole shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn set_address(&mut self, address: ShippingAddress) -> Result<&CheckoutDisplay> {
        self.address = address;
        self.refresh().await
    }

    /// Change one address field, as typed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn edit_address(
        &mut self,
        field: AddressField,
        value: &str,
    ) -> Result<&CheckoutDisplay> {
        value.clone_into(self.address.field_mut(field));
        self.refresh().await
    }

    /// Add one unit of a product, then re-quote.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn add_to_cart(&mut self, product_id: &ProductId) -> Result<AddOutcome> {
        let outcome = self.cart().add(&self.catalog, product_id)?;
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
        self.refresh().await?;
        Ok(outcome)
    }

    /// Change a line's quantity (clamped to at least 1), then re-quote.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<bool> {
        let changed = self.cart().set_quantity(product_id, quantity)?;
        self.refresh().await?;
        Ok(changed)
    }

    /// Remove a line, then re-quote.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<bool> {
        let removed = self.cart().remove(product_id)?;
        add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", product_id.as_str())]));
        self.refresh().await?;
        Ok(removed)
    }

    /// Pay for the cart with the current quote.
    ///
    /// Returns the confirmation when the payment went through. A declined or
    /// incomplete payment returns `Ok(None)` with the reason in the display;
    /// submission stays enabled for a retry.
    ///
    /// On confirmation the order is added to the local history and the cart
    /// is emptied. Once the payment intent exists, storage failures are
    /// reported and logged but never returned, so the attempt always
    /// reaches an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if there is no usable quote (a stale quote
    /// triggers a re-quote first), or an error if storage fails before the
    /// payment intent is requested.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<Option<Confirmation>> {
        let input = self.input()?;
        let attempted: Vec<CartLine> = self.cart().lines()?;
        let request = match self.reconciler.begin_payment(&input, &self.customer) {
            Ok(request) => request,
            Err(CheckoutError::StaleQuote) => {
                warn!("Quote went stale before payment; re-quoting");
                self.refresh().await?;
                return Err(CheckoutError::StaleQuote.into());
            }
            Err(e) => return Err(e.into()),
        };
        add_breadcrumb(
            "checkout",
            "Payment submitted",
            Some(&[("calc_id", request.body.calc_id.as_str())]),
        );

        let result = self.api.create_payment_intent(&request.body).await;
        let Some(handle) = self.reconciler.apply_payment_handle(request.generation, result) else {
            return Ok(None);
        };

        // Nothing below may return early until the outcome is applied.
        if let Err(e) = write_json(&self.store, keys::LAST_ORDER, &attempted) {
            warn!(error = %e, "Failed to save last order snapshot");
        }

        let return_url = self.reconciler.confirmation_url().clone();
        let outcome = self.widget.confirm(handle, &return_url).await;
        let Some(confirmation) = self
            .reconciler
            .apply_payment_outcome(request.generation, outcome)
            .cloned()
        else {
            return Ok(None);
        };

        if let Err(e) = self.record_order(&confirmation) {
            e.report();
        }
        if let Err(e) = self.cart().clear() {
            AppError::from(e).report();
        }
        info!(payment_id = %confirmation.payment_id, "Checkout complete");
        Ok(Some(confirmation))
    }

    fn record_order(&self, confirmation: &Confirmation) -> Result<()> {
        let items = confirmation.lines.iter().map(|l| u64::from(l.qty)).sum();
        let order = OrderRecord {
            id: confirmation.payment_id.to_string(),
            ts: None,
            items: Some(items),
            subtotal_c: Some(confirmation.quote.subtotal_cents),
            tax_c: Some(confirmation.quote.tax_cents),
            total_c: Some(confirmation.quote.total_cents()),
            subtotal: None,
            status: Some(OrderStatus::from(confirmation.status)),
        };
        OrderHistory::new(&self.store).push(order)?;
        Ok(())
    }
}

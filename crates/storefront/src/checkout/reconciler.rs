//! Checkout state machine.
//!
//! [`Reconciler`] owns the checkout state and performs no I/O. Callers feed
//! it the current cart and address, carry out the requests it returns, and
//! hand the responses back together with the generation the request was
//! stamped with. Only the response to the most recent request may change
//! state; anything older is discarded.

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use seattle_trading_core::{
    CartLine, Cents, CompactCartLine, PaymentId, PaymentStatus, ShippingAddress, TaxQuote,
    UserProfile,
};

use crate::api::{
    ApiError, CreatePaymentIntentRequest, QuoteItem, ShippingPayload, TaxPreview,
    TaxPreviewRequest,
};
use crate::catalog::Catalog;
use crate::payment::{PaymentHandle, PaymentOutcome, WidgetError};
use crate::totals::{Totals, compute_totals};

const EMPTY_CART: &str = "Your cart is empty.";
const ADDRESS_INCOMPLETE: &str = "Enter full shipping address to calculate tax.";
const CALCULATING: &str = "Calculating tax…";
const TAX_FAILED: &str = "Could not calculate tax.";
const NO_QUOTE: &str = "Please enter your address so we can calculate tax.";
const INITIALIZING: &str = "Initializing payment…";
const INIT_FAILED: &str = "Error initializing payment.";
const UNEXPECTED_STATUS: &str = "Additional authentication required or unexpected status.";

/// Where the checkout is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing to check out.
    Idle,
    /// Waiting for a complete address, or recovering from a failed quote.
    AddressIncomplete,
    /// A tax quote request is in flight.
    QuotePending,
    /// An authoritative quote matches the current cart and address.
    QuoteReady,
    /// A payment is being initialized or confirmed.
    PaymentPending,
    /// The payment went through; redirect to the confirmation page.
    PaymentConfirmed,
    /// The payment failed; submission is enabled for a retry.
    PaymentFailed,
}

/// What the checkout page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDisplay {
    pub item_count: u64,
    pub subtotal: Cents,
    pub tax: Cents,
    pub total: Cents,
    /// Inline status or error text.
    pub message: Option<String>,
    /// Whether the pay button is enabled.
    pub submit_enabled: bool,
}

/// Current cart and address, resolved against the catalog.
///
/// Only lines whose product exists are carried; each keeps the unit price
/// known at the time the input was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInput {
    lines: Vec<CompactCartLine>,
    address: ShippingAddress,
    totals: Totals,
}

impl CheckoutInput {
    /// Resolve `lines` against `catalog`.
    #[must_use]
    pub fn new(lines: &[CartLine], catalog: &Catalog, address: &ShippingAddress) -> Self {
        let compact = lines
            .iter()
            .filter_map(|line| {
                catalog.get(&line.product_id).map(|product| CompactCartLine {
                    id: line.product_id.clone(),
                    qty: line.quantity(),
                    p: product.unit_price_cents,
                })
            })
            .collect();

        Self {
            lines: compact,
            address: address.trimmed(),
            totals: compute_totals(lines, catalog),
        }
    }

    /// Optimistic (tax-free) totals.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        self.totals
    }

    /// The trimmed shipping address.
    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    fn basis(&self) -> Basis {
        Basis {
            lines: self.lines.clone(),
            address: self.address.clone(),
        }
    }
}

/// The cart and address a quote was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Basis {
    lines: Vec<CompactCartLine>,
    address: ShippingAddress,
}

/// Signed-in buyer details.
///
/// `email` goes out with the payment request. `name` fills a blank shipping
/// name before the address is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

impl Customer {
    /// `address` with a blank name replaced by the customer's name.
    #[must_use]
    pub fn fill_name(&self, address: &ShippingAddress) -> ShippingAddress {
        let mut address = address.clone();
        if address.name.trim().is_empty() {
            address.name.clone_from(&self.name);
        }
        address
    }
}

impl From<&UserProfile> for Customer {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.as_str().to_string(),
        }
    }
}

/// A tax preview request to send, stamped with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub generation: u64,
    pub body: TaxPreviewRequest,
}

/// A payment intent request to send, stamped with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub generation: u64,
    pub body: CreatePaymentIntentRequest,
}

/// A confirmed payment and what it paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub quote: TaxQuote,
    /// Cart snapshot the payment was created with.
    pub lines: Vec<CompactCartLine>,
    /// Confirmation page with the payment id attached.
    pub redirect_url: Url,
}

/// Why a payment could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please enter your address so we can calculate tax.")]
    NoQuote,
    #[error("Your cart or address changed since tax was calculated.")]
    StaleQuote,
    #[error("A payment is already in progress.")]
    PaymentInProgress,
}

#[derive(Debug, Clone)]
struct PaymentAttempt {
    generation: u64,
    quote: TaxQuote,
    lines: Vec<CompactCartLine>,
    /// The handle has been released to the widget.
    handed_off: bool,
}

/// The checkout state machine.
#[derive(Debug, Clone)]
pub struct Reconciler {
    state: CheckoutState,
    generation: u64,
    basis: Option<Basis>,
    quote: Option<TaxQuote>,
    optimistic: Totals,
    display: CheckoutDisplay,
    attempt: Option<PaymentAttempt>,
    confirmation: Option<Confirmation>,
    confirmation_url: Url,
}

impl Reconciler {
    /// A new reconciler redirecting to `confirmation_url` on success.
    #[must_use]
    pub fn new(confirmation_url: Url) -> Self {
        Self {
            state: CheckoutState::Idle,
            generation: 0,
            basis: None,
            quote: None,
            optimistic: Totals::default(),
            display: CheckoutDisplay::default(),
            attempt: None,
            confirmation: None,
            confirmation_url,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    #[must_use]
    pub const fn display(&self) -> &CheckoutDisplay {
        &self.display
    }

    /// The current authoritative quote, if any.
    #[must_use]
    pub const fn quote(&self) -> Option<&TaxQuote> {
        self.quote.as_ref()
    }

    /// Generation of the most recent request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Where the buyer lands after paying.
    #[must_use]
    pub const fn confirmation_url(&self) -> &Url {
        &self.confirmation_url
    }

    /// The last confirmed payment.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    /// Whether a quote for exactly this input is pending or in use.
    fn is_current(&self, basis: &Basis) -> bool {
        if self.basis.as_ref() != Some(basis) {
            return false;
        }
        match self.state {
            CheckoutState::QuotePending
            | CheckoutState::QuoteReady
            | CheckoutState::PaymentPending
            | CheckoutState::PaymentConfirmed => true,
            CheckoutState::PaymentFailed => self.quote.is_some(),
            CheckoutState::Idle | CheckoutState::AddressIncomplete => false,
        }
    }

    fn paint_optimistic(&mut self) {
        self.display.item_count = self.optimistic.item_count;
        self.display.subtotal = self.optimistic.subtotal;
        self.display.tax = Cents::ZERO;
        self.display.total = self.optimistic.subtotal;
    }

    fn enter(&mut self, state: CheckoutState, message: Option<&str>, submit_enabled: bool) {
        debug!(from = ?self.state, to = ?state, generation = self.generation, "Checkout transition");
        self.state = state;
        self.display.message = message.map(str::to_string);
        self.display.submit_enabled = submit_enabled;
    }

    /// Re-evaluate the checkout after a cart or address change.
    ///
    /// Any existing quote is invalidated and optimistic totals are shown.
    /// Returns the tax preview request to send when the cart is non-empty and
    /// the address complete. Returns `None` without touching state if a quote
    /// for identical input is already pending or in use.
    pub fn recalculate(&mut self, input: &CheckoutInput) -> Option<QuoteRequest> {
        let basis = input.basis();
        if self.is_current(&basis) {
            debug!(state = ?self.state, "Checkout input unchanged");
            return None;
        }

        self.generation += 1;
        self.quote = None;
        self.basis = None;
        if let Some(attempt) = self.attempt.take_if(|a| !a.handed_off) {
            info!(
                generation = attempt.generation,
                "Checkout changed during payment setup; abandoning payment"
            );
        }

        self.optimistic = input.totals();
        self.paint_optimistic();

        if self.optimistic.item_count == 0 {
            self.enter(CheckoutState::Idle, Some(EMPTY_CART), false);
            return None;
        }
        if !input.address.is_complete() {
            self.enter(CheckoutState::AddressIncomplete, Some(ADDRESS_INCOMPLETE), false);
            return None;
        }

        let body = TaxPreviewRequest {
            items: basis
                .lines
                .iter()
                .map(|l| QuoteItem {
                    id: l.id.clone(),
                    qty: l.qty,
                })
                .collect(),
            shipping: ShippingPayload::from(&basis.address),
        };
        self.basis = Some(basis);
        self.enter(CheckoutState::QuotePending, Some(CALCULATING), false);

        Some(QuoteRequest {
            generation: self.generation,
            body,
        })
    }

    /// Apply a tax preview response.
    ///
    /// Returns `false` if the response was stale and discarded.
    pub fn apply_quote(&mut self, generation: u64, result: Result<TaxPreview, ApiError>) -> bool {
        if generation != self.generation || self.state != CheckoutState::QuotePending {
            debug!(
                generation,
                current = self.generation,
                "Discarding stale tax preview"
            );
            return false;
        }

        match result {
            Ok(preview) => {
                let quote = TaxQuote::from_server_amounts(
                    preview.quote_id,
                    preview.subtotal,
                    preview.tax,
                    preview.total,
                    self.optimistic.item_count,
                );
                self.display.item_count = self.optimistic.item_count;
                self.display.subtotal = quote.subtotal_cents;
                self.display.tax = quote.tax_cents;
                self.display.total = quote.total_cents();
                info!(quote_id = %quote.quote_id, total = %quote.total_cents(), "Tax quote ready");
                self.quote = Some(quote);
                self.enter(CheckoutState::QuoteReady, None, true);
            }
            Err(e) => {
                warn!(error = %e, "Tax preview failed");
                self.basis = None;
                self.paint_optimistic();
                let message = non_blank(e.to_string(), TAX_FAILED);
                self.enter(CheckoutState::AddressIncomplete, Some(&message), false);
            }
        }
        true
    }

    /// Start a payment against the current quote.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NoQuote`] if no quote is available.
    /// - [`CheckoutError::StaleQuote`] if the cart or address changed since
    ///   the quote; the quote is invalidated and the caller should
    ///   recalculate.
    /// - [`CheckoutError::PaymentInProgress`] if a payment is already pending.
    pub fn begin_payment(
        &mut self,
        input: &CheckoutInput,
        customer: &Customer,
    ) -> Result<PaymentRequest, CheckoutError> {
        if self.state == CheckoutState::PaymentPending {
            return Err(CheckoutError::PaymentInProgress);
        }
        let ready = matches!(
            self.state,
            CheckoutState::QuoteReady | CheckoutState::PaymentFailed
        );
        let (Some(quote), Some(basis), true) = (self.quote.clone(), self.basis.clone(), ready)
        else {
            self.display.message = Some(NO_QUOTE.to_string());
            return Err(CheckoutError::NoQuote);
        };

        if basis != input.basis() {
            warn!(quote_id = %quote.quote_id, "Refusing to pay with a stale quote");
            self.quote = None;
            self.basis = None;
            self.paint_optimistic();
            self.enter(CheckoutState::AddressIncomplete, None, false);
            return Err(CheckoutError::StaleQuote);
        }

        self.generation += 1;
        let body = CreatePaymentIntentRequest {
            calc_id: quote.quote_id.clone(),
            shipping: ShippingPayload::from(&basis.address),
            email: customer.email.trim().to_string(),
            name: basis.address.name.clone(),
            cart: basis.lines.clone(),
        };

        self.attempt = Some(PaymentAttempt {
            generation: self.generation,
            quote,
            lines: basis.lines,
            handed_off: false,
        });
        self.confirmation = None;
        self.enter(CheckoutState::PaymentPending, Some(INITIALIZING), false);

        Ok(PaymentRequest {
            generation: self.generation,
            body,
        })
    }

    /// Apply a payment intent response.
    ///
    /// Returns the handle to give to the widget, or `None` if the exchange
    /// failed or belongs to a checkout that has since changed.
    pub fn apply_payment_handle(
        &mut self,
        generation: u64,
        result: Result<PaymentHandle, ApiError>,
    ) -> Option<PaymentHandle> {
        let pending = self.state == CheckoutState::PaymentPending
            && generation == self.generation
            && self.attempt.as_ref().is_some_and(|a| a.generation == generation);
        if !pending {
            warn!(
                generation,
                current = self.generation,
                "Dropping payment handle from superseded checkout"
            );
            return None;
        }

        match result {
            Ok(handle) => {
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.handed_off = true;
                }
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Payment initialization failed");
                self.attempt = None;
                let message = non_blank(e.to_string(), INIT_FAILED);
                self.enter(CheckoutState::PaymentFailed, Some(&message), true);
                None
            }
        }
    }

    /// Apply the widget's report for a handed-off payment.
    ///
    /// A success is honored even if the checkout changed while the widget
    /// was confirming; the confirmation carries the snapshot sent with the
    /// payment request. Failures for superseded payments are logged and
    /// otherwise ignored.
    pub fn apply_payment_outcome(
        &mut self,
        generation: u64,
        result: Result<PaymentOutcome, WidgetError>,
    ) -> Option<&Confirmation> {
        let Some(attempt) = self
            .attempt
            .take_if(|a| a.generation == generation && a.handed_off)
        else {
            warn!(generation, "Ignoring widget report for unknown payment");
            return None;
        };
        let superseded = generation != self.generation;

        match result {
            Ok(outcome) if outcome.status.is_terminal_success() => {
                let mut redirect_url = self.confirmation_url.clone();
                redirect_url
                    .query_pairs_mut()
                    .append_pair("pi", outcome.id.as_str());

                info!(payment_id = %outcome.id, status = %outcome.status, superseded, "Payment confirmed");
                self.display.subtotal = attempt.quote.subtotal_cents;
                self.display.tax = attempt.quote.tax_cents;
                self.display.total = attempt.quote.total_cents();
                self.quote = None;
                self.enter(CheckoutState::PaymentConfirmed, None, false);
                self.confirmation = Some(Confirmation {
                    payment_id: outcome.id,
                    status: outcome.status,
                    quote: attempt.quote,
                    lines: attempt.lines,
                    redirect_url,
                });
                self.confirmation.as_ref()
            }
            _ if superseded => {
                warn!(generation, "Superseded payment did not complete");
                None
            }
            Ok(outcome) => {
                warn!(payment_id = %outcome.id, status = %outcome.status, "Payment not completed");
                self.enter(CheckoutState::PaymentFailed, Some(UNEXPECTED_STATUS), true);
                None
            }
            Err(e) => {
                warn!(error = %e, "Payment failed");
                self.enter(CheckoutState::PaymentFailed, Some(&e.to_string()), true);
                None
            }
        }
    }
}

fn non_blank(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use seattle_trading_core::{AddressField, Email, ProductId, QuoteId};

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ada Lovelace".into(),
            line1: "1 Pike St".into(),
            city: "Seattle".into(),
            state: "WA".into(),
            postal_code: "98101".into(),
            country: "US".into(),
        }
    }

    fn input(lines: &[(&str, i64)], address: &ShippingAddress) -> CheckoutInput {
        let lines: Vec<CartLine> = lines.iter().map(|(p, q)| CartLine::new(id(p), *q)).collect();
        CheckoutInput::new(&lines, &fixture(), address)
    }

    fn preview(quote: &str, subtotal: i64, tax: i64, total: i64) -> TaxPreview {
        TaxPreview {
            quote_id: QuoteId::parse(quote).unwrap(),
            subtotal: Cents::new(subtotal),
            tax: Cents::new(tax),
            total: Cents::new(total),
        }
    }

    fn customer() -> Customer {
        Customer {
            name: "Profile Name".into(),
            email: "ada@example.com".into(),
        }
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(Url::parse("https://seattletrading.org/thank-you.html").unwrap())
    }

    fn outcome(status: PaymentStatus) -> PaymentOutcome {
        PaymentOutcome {
            status,
            id: PaymentId::parse("pi_123").unwrap(),
        }
    }

    /// Drive a reconciler to `QuoteReady` for `input`.
    fn ready(r: &mut Reconciler, input: &CheckoutInput) {
        let req = r.recalculate(input).unwrap();
        assert!(r.apply_quote(req.generation, Ok(preview("taxcalc_1", 2000, 200, 2200))));
    }

    #[test]
    fn test_empty_cart_is_idle() {
        let mut r = reconciler();
        assert!(r.recalculate(&input(&[], &address())).is_none());
        assert_eq!(r.state(), CheckoutState::Idle);
        assert!(!r.display().submit_enabled);
        assert_eq!(r.display().message.as_deref(), Some(EMPTY_CART));
    }

    #[test]
    fn test_incomplete_address_never_requests_quote() {
        for field in AddressField::ALL {
            if field == AddressField::Name {
                continue;
            }
            let mut a = address();
            *a.field_mut(field) = "   ".into();
            let mut r = reconciler();
            assert!(r.recalculate(&input(&[("A", 1)], &a)).is_none(), "{field}");
            assert_eq!(r.state(), CheckoutState::AddressIncomplete);
            assert!(!r.display().submit_enabled);
            assert_eq!(r.display().message.as_deref(), Some(ADDRESS_INCOMPLETE));
            assert_eq!(r.begin_payment(&input(&[("A", 1)], &a), &customer()), Err(CheckoutError::NoQuote));
        }
    }

    #[test]
    fn test_quote_request_carries_ids_and_quantities() {
        let mut r = reconciler();
        let req = r.recalculate(&input(&[("A", 2), ("ghost", 1)], &address())).unwrap();
        assert_eq!(r.state(), CheckoutState::QuotePending);
        assert_eq!(r.display().message.as_deref(), Some(CALCULATING));
        assert_eq!(
            serde_json::to_value(&req.body).unwrap()["items"],
            serde_json::json!([{"id": "A", "qty": 2}])
        );
        // Optimistic display while pending.
        assert_eq!(r.display().subtotal, Cents::new(2000));
        assert_eq!(r.display().tax, Cents::ZERO);
        assert_eq!(r.display().total, Cents::new(2000));
    }

    #[test]
    fn test_end_to_end_quote_and_payment_request() {
        let mut r = reconciler();
        let inp = input(&[("A", 2)], &address());
        ready(&mut r, &inp);

        assert_eq!(r.state(), CheckoutState::QuoteReady);
        assert!(r.display().submit_enabled);
        assert_eq!(r.display().total.to_string(), "$22.00");
        assert_eq!(r.display().message, None);

        let pay = r.begin_payment(&inp, &customer()).unwrap();
        assert_eq!(r.state(), CheckoutState::PaymentPending);
        assert_eq!(r.display().message.as_deref(), Some(INITIALIZING));
        let body = serde_json::to_value(&pay.body).unwrap();
        assert_eq!(body["calc_id"], "taxcalc_1");
        assert_eq!(body["cart"], serde_json::json!([{"id": "A", "qty": 2, "p": 1000}]));
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["shipping"]["address"]["postal_code"], "98101");
    }

    #[test]
    fn test_zero_subtotal_reconstructed() {
        let mut r = reconciler();
        let req = r.recalculate(&input(&[("C", 1)], &address())).unwrap();
        r.apply_quote(req.generation, Ok(preview("q", 0, 50, 500)));
        assert_eq!(r.display().subtotal, Cents::new(450));
        assert_eq!(r.display().total, Cents::new(500));
    }

    #[test]
    fn test_quote_failure_reverts_to_optimistic() {
        let mut r = reconciler();
        let req = r.recalculate(&input(&[("A", 1)], &address())).unwrap();
        r.apply_quote(req.generation, Err(ApiError::service("Invalid postal code")));
        assert_eq!(r.state(), CheckoutState::AddressIncomplete);
        assert_eq!(r.display().message.as_deref(), Some("Invalid postal code"));
        assert!(!r.display().submit_enabled);
        assert_eq!(r.display().tax, Cents::ZERO);
        assert_eq!(r.display().total, Cents::new(1000));
        assert!(r.quote().is_none());

        // Same input again retries.
        assert!(r.recalculate(&input(&[("A", 1)], &address())).is_some());
    }

    #[test]
    fn test_edit_after_ready_invalidates_quote() {
        let mut r = reconciler();
        ready(&mut r, &input(&[("A", 2)], &address()));

        let mut edited = address();
        edited.city = "Tacoma".into();
        let req = r.recalculate(&input(&[("A", 2)], &edited));
        assert!(req.is_some());
        assert!(r.quote().is_none());
        assert!(!r.display().submit_enabled);
        assert_eq!(r.state(), CheckoutState::QuotePending);

        let mut cleared = address();
        cleared.state.clear();
        assert!(r.recalculate(&input(&[("A", 2)], &cleared)).is_none());
        assert_eq!(r.state(), CheckoutState::AddressIncomplete);
    }

    #[test]
    fn test_identical_input_is_idempotent() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        let first = r.recalculate(&inp).unwrap();
        assert!(r.recalculate(&inp).is_none());
        assert_eq!(r.generation(), first.generation);

        r.apply_quote(first.generation, Ok(preview("q", 1000, 100, 1100)));
        assert!(r.recalculate(&inp).is_none());
        assert_eq!(r.state(), CheckoutState::QuoteReady);

        // Whitespace-only differences are not edits.
        let mut padded = address();
        padded.city = " Seattle ".into();
        assert!(r.recalculate(&input(&[("A", 1)], &padded)).is_none());
    }

    #[test]
    fn test_out_of_order_quote_discarded() {
        let mut r = reconciler();
        let old = r.recalculate(&input(&[("A", 1)], &address())).unwrap();
        let new = r.recalculate(&input(&[("A", 3)], &address())).unwrap();
        assert!(new.generation > old.generation);

        assert!(r.apply_quote(new.generation, Ok(preview("new", 3000, 300, 3300))));
        assert!(!r.apply_quote(old.generation, Ok(preview("old", 1000, 100, 1100))));
        assert_eq!(r.quote().unwrap().quote_id.as_str(), "new");
        assert_eq!(r.display().total, Cents::new(3300));
    }

    #[test]
    fn test_stale_failure_does_not_clobber_ready_quote() {
        let mut r = reconciler();
        let old = r.recalculate(&input(&[("A", 1)], &address())).unwrap();
        let new = r.recalculate(&input(&[("A", 2)], &address())).unwrap();
        r.apply_quote(new.generation, Ok(preview("new", 2000, 200, 2200)));
        assert!(!r.apply_quote(old.generation, Err(ApiError::service("timeout"))));
        assert_eq!(r.state(), CheckoutState::QuoteReady);
    }

    #[test]
    fn test_stale_quote_refused_at_submit() {
        let mut r = reconciler();
        ready(&mut r, &input(&[("A", 2)], &address()));
        let err = r.begin_payment(&input(&[("A", 5)], &address()), &customer());
        assert_eq!(err, Err(CheckoutError::StaleQuote));
        assert!(r.quote().is_none());
        assert!(!r.display().submit_enabled);
    }

    #[test]
    fn test_submit_without_quote() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        r.recalculate(&inp);
        assert_eq!(r.begin_payment(&inp, &customer()), Err(CheckoutError::NoQuote));
        assert_eq!(r.display().message.as_deref(), Some(NO_QUOTE));
    }

    #[test]
    fn test_blank_shipping_name_filled_from_profile() {
        let profile = UserProfile {
            name: "Grace Hopper".into(),
            email: Email::parse("grace@example.com").unwrap(),
            ts: chrono::Utc::now(),
            updated_at: None,
        };
        let customer = Customer::from(&profile);

        let mut a = address();
        a.name = "  ".into();
        let filled = customer.fill_name(&a);
        assert_eq!(filled.name, "Grace Hopper");
        assert_eq!(customer.fill_name(&address()).name, "Ada Lovelace");

        let mut r = reconciler();
        let inp = input(&[("A", 1)], &filled);
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer).unwrap();
        assert_eq!(pay.body.name, "Grace Hopper");
        assert_eq!(pay.body.email, "grace@example.com");
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        r.begin_payment(&inp, &customer()).unwrap();
        assert_eq!(
            r.begin_payment(&inp, &customer()),
            Err(CheckoutError::PaymentInProgress)
        );
    }

    #[test]
    fn test_payment_confirmed_redirects_with_id() {
        let mut r = reconciler();
        let inp = input(&[("A", 2)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        let handle = r
            .apply_payment_handle(pay.generation, Ok(PaymentHandle::new("pi_123_secret_x").unwrap()))
            .unwrap();
        assert_eq!(handle.intent_id(), Some("pi_123"));

        let confirmation = r
            .apply_payment_outcome(pay.generation, Ok(outcome(PaymentStatus::Processing)))
            .unwrap();
        assert_eq!(
            confirmation.redirect_url.as_str(),
            "https://seattletrading.org/thank-you.html?pi=pi_123"
        );
        assert_eq!(confirmation.quote.total_cents(), Cents::new(2200));
        assert_eq!(r.state(), CheckoutState::PaymentConfirmed);
        assert!(!r.display().submit_enabled);
    }

    #[test]
    fn test_widget_error_allows_retry() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        r.apply_payment_handle(pay.generation, Ok(PaymentHandle::new("pi_1_secret_x").unwrap()))
            .unwrap();

        let declined = WidgetError::Declined {
            message: "Your card was declined.".into(),
        };
        assert!(r.apply_payment_outcome(pay.generation, Err(declined)).is_none());
        assert_eq!(r.state(), CheckoutState::PaymentFailed);
        assert!(r.display().submit_enabled);
        assert_eq!(r.display().message.as_deref(), Some("Your card was declined."));

        let retry = r.begin_payment(&inp, &customer()).unwrap();
        assert!(retry.generation > pay.generation);
        assert_eq!(retry.body.calc_id.as_str(), "taxcalc_1");
    }

    #[test]
    fn test_requires_action_is_failure() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        r.apply_payment_handle(pay.generation, Ok(PaymentHandle::new("pi_1_secret_x").unwrap()));
        assert!(
            r.apply_payment_outcome(pay.generation, Ok(outcome(PaymentStatus::RequiresAction)))
                .is_none()
        );
        assert_eq!(r.state(), CheckoutState::PaymentFailed);
        assert_eq!(r.display().message.as_deref(), Some(UNEXPECTED_STATUS));
        assert!(r.display().submit_enabled);
    }

    #[test]
    fn test_intent_failure_reenables_submit() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        assert!(
            r.apply_payment_handle(pay.generation, Err(ApiError::service("Init failed")))
                .is_none()
        );
        assert_eq!(r.state(), CheckoutState::PaymentFailed);
        assert_eq!(r.display().message.as_deref(), Some("Init failed"));
        assert!(r.display().submit_enabled);
    }

    #[test]
    fn test_edit_during_payment_setup_drops_handle() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();

        let req = r.recalculate(&input(&[("A", 4)], &address()));
        assert!(req.is_some());
        assert_eq!(r.state(), CheckoutState::QuotePending);

        assert!(
            r.apply_payment_handle(pay.generation, Ok(PaymentHandle::new("pi_1_secret_x").unwrap()))
                .is_none()
        );
        assert_eq!(r.state(), CheckoutState::QuotePending);
    }

    #[test]
    fn test_success_after_edit_is_still_confirmed() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        r.apply_payment_handle(pay.generation, Ok(PaymentHandle::new("pi_1_secret_x").unwrap()))
            .unwrap();

        r.recalculate(&input(&[("A", 4)], &address()));
        let confirmation = r
            .apply_payment_outcome(pay.generation, Ok(outcome(PaymentStatus::Succeeded)))
            .unwrap();
        assert_eq!(confirmation.lines[0].qty, 1);
        assert_eq!(r.state(), CheckoutState::PaymentConfirmed);
    }

    #[test]
    fn test_outcome_without_handoff_ignored() {
        let mut r = reconciler();
        let inp = input(&[("A", 1)], &address());
        ready(&mut r, &inp);
        let pay = r.begin_payment(&inp, &customer()).unwrap();
        assert!(
            r.apply_payment_outcome(pay.generation, Ok(outcome(PaymentStatus::Succeeded)))
                .is_none()
        );
        assert_eq!(r.state(), CheckoutState::PaymentPending);
    }
}

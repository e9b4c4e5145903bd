//! Checkout: tax quoting and payment.
//!
//! [`Reconciler`] is the pure state machine; [`CheckoutSession`] drives it
//! against storage, the checkout API, and the payment widget.

mod reconciler;
mod session;

pub use reconciler::{
    CheckoutDisplay, CheckoutError, CheckoutInput, CheckoutState, Confirmation, Customer,
    PaymentRequest, QuoteRequest, Reconciler,
};
pub use session::CheckoutSession;

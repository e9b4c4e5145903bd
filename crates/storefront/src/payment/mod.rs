//! Hosted payment widget.
//!
//! The storefront never sees card details. It receives an opaque
//! [`PaymentHandle`] (the payment intent's client secret) from the checkout
//! API and hands it to a [`PaymentWidget`], which collects credentials and
//! confirms the charge with the payment provider.

mod stripe;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use seattle_trading_core::{PaymentId, PaymentStatus};

pub use stripe::StripeWidget;

/// Marker separating the intent id from the secret in a client secret.
const SECRET_MARKER: &str = "_secret_";

/// Opaque token authorizing the widget to confirm one payment.
///
/// Not `Clone`: a handle is consumed by exactly one
/// [`PaymentWidget::confirm`] call.
#[derive(Debug)]
pub struct PaymentHandle {
    client_secret: SecretString,
}

impl PaymentHandle {
    /// Wrap a client secret. Returns `None` for blank input.
    #[must_use]
    pub fn new(client_secret: impl Into<String>) -> Option<Self> {
        let client_secret: String = client_secret.into();
        if client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_secret: SecretString::from(client_secret),
        })
    }

    /// The payment intent id embedded in the client secret, if present.
    #[must_use]
    pub fn intent_id(&self) -> Option<&str> {
        self.client_secret
            .expose_secret()
            .split_once(SECRET_MARKER)
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }

    /// The raw client secret, for the widget implementation.
    pub(crate) fn expose(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

/// Terminal report from the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub id: PaymentId,
}

/// Errors reported by the payment widget.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The provider rejected the payment; the message is shown verbatim.
    #[error("{message}")]
    Declined { message: String },

    /// The provider could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider's reply was not understood.
    #[error("Unexpected payment response: {0}")]
    Parse(String),

    /// The handle does not identify a payment intent.
    #[error("Payment handle does not identify a payment")]
    InvalidHandle,
}

/// A hosted widget that confirms payments.
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    /// Collect credentials and confirm the payment behind `handle`.
    ///
    /// `return_url` is where redirect-based payment methods send the buyer
    /// after authentication.
    ///
    /// # Errors
    ///
    /// Returns a [`WidgetError`] if the payment is declined or the provider
    /// cannot be reached.
    async fn confirm(
        &self,
        handle: PaymentHandle,
        return_url: &Url,
    ) -> Result<PaymentOutcome, WidgetError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_handle_rejected() {
        assert!(PaymentHandle::new("").is_none());
        assert!(PaymentHandle::new("   ").is_none());
    }

    #[test]
    fn test_intent_id() {
        let handle = PaymentHandle::new("pi_3Abc_secret_xyz").unwrap();
        assert_eq!(handle.intent_id(), Some("pi_3Abc"));
        let handle = PaymentHandle::new("opaque").unwrap();
        assert_eq!(handle.intent_id(), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let handle = PaymentHandle::new("pi_1_secret_topsecret").unwrap();
        let debug = format!("{handle:?}");
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn test_declined_message_verbatim() {
        let err = WidgetError::Declined {
            message: "Your card was declined.".into(),
        };
        assert_eq!(err.to_string(), "Your card was declined.");
    }
}

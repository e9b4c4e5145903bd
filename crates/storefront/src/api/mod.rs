//! Checkout API: tax previews and payment intents.
//!
//! [`CheckoutApi`] is the seam between the checkout flow and the network.
//! [`CheckoutClient`] is the HTTP implementation; tests substitute fakes.

mod client;
mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::payment::PaymentHandle;

pub use client::CheckoutClient;
pub use types::{
    AddressPayload, CreatePaymentIntentRequest, QuoteItem, ShippingPayload, TaxPreview,
    TaxPreviewRequest,
};

/// Errors from the checkout API.
///
/// The `Display` text is what the buyer sees.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a failure.
    #[error("{message}")]
    Service {
        /// HTTP status, if the failure came with a non-2xx response.
        status: Option<u16>,
        message: String,
    },

    /// The service answered 2xx with a body we cannot use.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Shorthand for a [`ApiError::Service`] without a status.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            status: None,
            message: message.into(),
        }
    }
}

/// Remote operations the checkout flow depends on.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// Request an authoritative tax computation for a cart and address.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-2xx response, or a body
    /// carrying an `error` field.
    async fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxPreview, ApiError>;

    /// Create a payment intent bound to a tax quote.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-2xx response, or a body
    /// without a client secret.
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentHandle, ApiError>;
}

#[async_trait]
impl<T: CheckoutApi + ?Sized> CheckoutApi for std::sync::Arc<T> {
    async fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxPreview, ApiError> {
        (**self).tax_preview(request).await
    }

    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentHandle, ApiError> {
        (**self).create_payment_intent(request).await
    }
}

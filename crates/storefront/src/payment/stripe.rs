//! Payment widget backed by the Stripe payment intents API.
//!
//! Confirms an intent with the publishable key and the intent's client
//! secret, the same call the hosted payment element makes in a browser. The
//! payment method is supplied up front (a saved method or a test token such
//! as `pm_card_visa`) instead of being collected from a form.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use seattle_trading_core::{PaymentId, PaymentStatus};

use super::{PaymentHandle, PaymentOutcome, PaymentWidget, WidgetError};
use crate::config::StripeConfig;

const PAYMENT_FAILED: &str = "Payment failed. Please try again.";

/// Stripe-backed [`PaymentWidget`].
#[derive(Clone)]
pub struct StripeWidget {
    client: reqwest::Client,
    api_base: Url,
    publishable_key: SecretString,
    payment_method: String,
}

impl std::fmt::Debug for StripeWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWidget")
            .field("api_base", &self.api_base.as_str())
            .field("publishable_key", &"[REDACTED]")
            .field("payment_method", &self.payment_method)
            .finish_non_exhaustive()
    }
}

impl StripeWidget {
    /// Create a widget that pays with `payment_method`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig, payment_method: impl Into<String>) -> Result<Self, WidgetError> {
        // Relative joins keep a path prefix only when the base ends in '/'.
        let mut api_base = config.api_base.clone();
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_base,
            publishable_key: config.publishable_key.clone(),
            payment_method: payment_method.into(),
        })
    }

    fn confirm_url(&self, intent_id: &str) -> Result<Url, WidgetError> {
        self.api_base
            .join(&format!("v1/payment_intents/{intent_id}/confirm"))
            .map_err(|e| WidgetError::Parse(format!("Invalid confirm URL: {e}")))
    }
}

#[async_trait]
impl PaymentWidget for StripeWidget {
    #[instrument(skip(self, handle, return_url), fields(intent_id = tracing::field::Empty))]
    async fn confirm(
        &self,
        handle: PaymentHandle,
        return_url: &Url,
    ) -> Result<PaymentOutcome, WidgetError> {
        let intent_id = handle.intent_id().ok_or(WidgetError::InvalidHandle)?;
        tracing::Span::current().record("intent_id", intent_id);

        let form = [
            ("client_secret", handle.expose()),
            ("payment_method", self.payment_method.as_str()),
            ("return_url", return_url.as_str()),
        ];

        let response = self
            .client
            .post(self.confirm_url(intent_id)?)
            .bearer_auth(self.publishable_key.expose_secret())
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let outcome = decode_confirmation(status, &body);
        match &outcome {
            Ok(o) => info!(status = %o.status, "Payment confirmed"),
            Err(e) => warn!(error = %e, "Payment confirmation failed"),
        }
        outcome
    }
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    id: String,
    status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn decode_confirmation(status: StatusCode, body: &str) -> Result<PaymentOutcome, WidgetError> {
    if let Ok(ErrorReply { error }) = serde_json::from_str::<ErrorReply>(body) {
        return Err(WidgetError::Declined {
            message: error
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| PAYMENT_FAILED.to_string()),
        });
    }
    if !status.is_success() {
        return Err(WidgetError::Declined {
            message: PAYMENT_FAILED.to_string(),
        });
    }

    let reply: IntentReply =
        serde_json::from_str(body).map_err(|e| WidgetError::Parse(e.to_string()))?;
    let id = PaymentId::parse(&reply.id).map_err(|e| WidgetError::Parse(e.to_string()))?;
    Ok(PaymentOutcome {
        status: reply.status,
        id,
    })
}

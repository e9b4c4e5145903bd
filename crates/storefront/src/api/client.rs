//! HTTP client for the checkout API.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};
use url::Url;

use seattle_trading_core::{Cents, QuoteId};

use super::types::{CreatePaymentIntentResponse, TaxPreviewResponse};
use super::{ApiError, CheckoutApi, CreatePaymentIntentRequest, TaxPreview, TaxPreviewRequest};
use crate::config::ApiConfig;
use crate::payment::PaymentHandle;

const TAX_PREVIEW_PATH: &str = "tax-preview";
const PAYMENT_INTENT_PATH: &str = "create-payment-intent";

const TAX_PREVIEW_FAILED: &str = "Tax preview failed";
const INIT_FAILED: &str = "Init failed";

/// Checkout API client.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CheckoutClient {
    /// Create a new checkout API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        // `Url::join` replaces the last segment unless the base ends in '/'.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Parse(format!("Invalid endpoint {path}: {e}")))
    }

    async fn post<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, String), ApiError> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "Checkout API response");
        Ok((status, text))
    }
}

#[async_trait]
impl CheckoutApi for CheckoutClient {
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxPreview, ApiError> {
        let (status, body) = self.post(TAX_PREVIEW_PATH, request).await?;
        decode_tax_preview(status, &body).inspect_err(|e| warn!(error = %e, "Tax preview failed"))
    }

    #[instrument(skip(self, request), fields(calc_id = %request.calc_id))]
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentHandle, ApiError> {
        let (status, body) = self.post(PAYMENT_INTENT_PATH, request).await?;
        decode_payment_intent(status, &body)
            .inspect_err(|e| warn!(error = %e, "Payment intent creation failed"))
    }
}

/// Parse a JSON body, falling back to an empty reply for non-2xx responses
/// whose body is not JSON (proxies and gateways return HTML error pages).
fn parse_body<T: serde::de::DeserializeOwned + Default>(
    status: StatusCode,
    body: &str,
) -> Result<T, ApiError> {
    match serde_json::from_str(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Ok(T::default()),
        Err(e) => Err(ApiError::Parse(e.to_string())),
    }
}

fn failure(status: StatusCode, error: Option<String>, fallback: &str) -> ApiError {
    ApiError::Service {
        status: (!status.is_success()).then_some(status.as_u16()),
        message: error
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}

pub(crate) fn decode_tax_preview(status: StatusCode, body: &str) -> Result<TaxPreview, ApiError> {
    let reply: TaxPreviewResponse = parse_body(status, body)?;
    if !status.is_success() || reply.error.is_some() {
        return Err(failure(status, reply.error, TAX_PREVIEW_FAILED));
    }

    let quote_id = reply
        .id
        .as_deref()
        .and_then(|id| QuoteId::parse(id).ok())
        .ok_or_else(|| ApiError::Parse("tax preview has no id".to_string()))?;

    Ok(TaxPreview {
        quote_id,
        subtotal: reply.subtotal.unwrap_or(Cents::ZERO),
        tax: reply.tax.unwrap_or(Cents::ZERO),
        total: reply.total.unwrap_or(Cents::ZERO),
    })
}

pub(crate) fn decode_payment_intent(
    status: StatusCode,
    body: &str,
) -> Result<PaymentHandle, ApiError> {
    let reply: CreatePaymentIntentResponse = parse_body(status, body)?;
    if !status.is_success() {
        return Err(failure(status, reply.error, INIT_FAILED));
    }
    let CreatePaymentIntentResponse {
        client_secret,
        error,
    } = reply;
    client_secret
        .and_then(PaymentHandle::new)
        .ok_or_else(|| failure(status, error, INIT_FAILED))
}

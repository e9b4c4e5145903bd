//! Wire types for the checkout API.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use seattle_trading_core::{Cents, CompactCartLine, ProductId, QuoteId, ShippingAddress};

/// One cart line in a tax preview request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteItem {
    pub id: ProductId,
    pub qty: u32,
}

/// Postal address as the API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPayload {
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Shipping block shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingPayload {
    pub name: String,
    pub address: AddressPayload,
}

impl From<&ShippingAddress> for ShippingPayload {
    fn from(address: &ShippingAddress) -> Self {
        let a = address.trimmed();
        Self {
            name: a.name,
            address: AddressPayload {
                line1: a.line1,
                city: a.city,
                state: a.state,
                postal_code: a.postal_code,
                country: a.country,
            },
        }
    }
}

/// `POST /tax-preview` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxPreviewRequest {
    pub items: Vec<QuoteItem>,
    pub shipping: ShippingPayload,
}

/// `POST /tax-preview` reply. Amounts are cents, read leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TaxPreviewResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub subtotal: Option<Cents>,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub tax: Option<Cents>,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total: Option<Cents>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accept an amount as an integer, a float, or a numeric string, rounded to
/// whole cents. Anything else reads as absent.
fn lenient_cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Cents>, D::Error> {
    let amount = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(cents) => return Ok(Some(Cents::new(cents))),
            None => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    Ok(amount
        .and_then(|d| {
            d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .map(Cents::new))
}

/// A successful tax preview, before display reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxPreview {
    pub quote_id: QuoteId,
    pub subtotal: Cents,
    pub tax: Cents,
    pub total: Cents,
}

/// `POST /create-payment-intent` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePaymentIntentRequest {
    pub calc_id: QuoteId,
    pub shipping: ShippingPayload,
    pub email: String,
    pub name: String,
    pub cart: Vec<CompactCartLine>,
}

/// `POST /create-payment-intent` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentIntentResponse {
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_preview_request_shape() {
        let address = ShippingAddress {
            name: " Ada ".into(),
            line1: "1 Pike St".into(),
            city: "Seattle".into(),
            state: "WA".into(),
            postal_code: "98101".into(),
            country: "US".into(),
        };
        let body = TaxPreviewRequest {
            items: vec![QuoteItem {
                id: ProductId::parse("A").unwrap(),
                qty: 2,
            }],
            shipping: ShippingPayload::from(&address),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "items": [{"id": "A", "qty": 2}],
                "shipping": {
                    "name": "Ada",
                    "address": {
                        "line1": "1 Pike St",
                        "city": "Seattle",
                        "state": "WA",
                        "postal_code": "98101",
                        "country": "US"
                    }
                }
            })
        );
    }

    #[test]
    fn test_responses_tolerate_missing_fields() {
        let r: TaxPreviewResponse = serde_json::from_str(r#"{"error":"bad zip"}"#).unwrap();
        assert_eq!(r.error.as_deref(), Some("bad zip"));
        assert!(r.id.is_none());

        let r: TaxPreviewResponse = serde_json::from_str(r#"{"total":null}"#).unwrap();
        assert!(r.total.is_none());

        let r: CreatePaymentIntentResponse =
            serde_json::from_str(r#"{"clientSecret":"pi_1_secret_2"}"#).unwrap();
        assert_eq!(r.client_secret.as_deref(), Some("pi_1_secret_2"));
    }

    #[test]
    fn test_tax_preview_amounts_accept_floats_and_strings() {
        let r: TaxPreviewResponse = serde_json::from_str(
            r#"{"id":"taxcalc_1","subtotal":2000.0,"tax":"200","total":2199.6}"#,
        )
        .unwrap();
        assert_eq!(r.subtotal, Some(Cents::new(2000)));
        assert_eq!(r.tax, Some(Cents::new(200)));
        assert_eq!(r.total, Some(Cents::new(2200)));

        let r: TaxPreviewResponse =
            serde_json::from_str(r#"{"subtotal":"n/a","tax":true}"#).unwrap();
        assert!(r.subtotal.is_none());
        assert!(r.tax.is_none());
    }
}

//! Integration tests for the Seattle Trading storefront.
//!
//! [`FakeServices`] serves the checkout API and the payment provider's
//! confirm endpoint from one local axum server, so tests drive the real HTTP
//! clients end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p seattle-trading-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use seattle_trading_core::ProductId;
use seattle_trading_storefront::catalog::Catalog;
use seattle_trading_storefront::config::{ApiConfig, StripeConfig};

/// Postal code the fake tax service rejects.
pub const REJECTED_POSTAL_CODE: &str = "00000";

/// Payment method the fake provider declines.
pub const DECLINED_CARD: &str = "pm_card_chargeDeclined";

/// Payment method the fake provider leaves in `requires_action`.
pub const AUTH_REQUIRED_CARD: &str = "pm_card_authenticationRequired";

/// Flat tax rate charged by the fake tax service.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Three products: `A` at $10.00, `B` at $149.99, `C` at $5.00.
pub const CATALOG_JSON: &str = r#"[
    {"id": "A", "name": "Nitrile Exam Gloves (Ice Blue)", "unit_price_cents": 1000,
     "sizes": ["S", "M"], "categories": "Medical", "brand": "Ultra Stretch", "bestseller": false},
    {"id": "B", "name": "Chemo Gloves (Hot Pink)", "unit_price_cents": 14999,
     "sizes": ["M", "L"], "categories": ["Chemo Rated", "Medical"], "brand": "Ultra Stretch",
     "bestseller": true, "material": "Nitrile"},
    {"id": "C", "name": "Vinyl Gloves", "unit_price_cents": 500,
     "sizes": ["XL"], "categories": ["Food Service"], "brand": "Icon", "bestseller": true}
]"#;

/// The fixture catalog.
///
/// # Panics
///
/// Never, unless [`CATALOG_JSON`] is edited into something invalid.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog::from_json(CATALOG_JSON).expect("fixture catalog")
}

/// Request bodies the fake services received, in arrival order.
#[derive(Debug, Default)]
pub struct Recorded {
    pub tax_previews: Vec<Value>,
    pub payment_intents: Vec<Value>,
    pub confirmations: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Recorded>>;

fn lock(recorded: &Shared) -> MutexGuard<'_, Recorded> {
    recorded.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Checkout API and payment provider on a local port.
pub struct FakeServices {
    addr: SocketAddr,
    recorded: Shared,
}

impl FakeServices {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    pub async fn spawn() -> Self {
        let recorded = Shared::default();
        let app = Router::new()
            .route("/tax-preview", post(tax_preview))
            .route("/create-payment-intent", post(create_payment_intent))
            .route("/v1/payment_intents/{id}/confirm", post(confirm))
            .with_state(Arc::clone(&recorded));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake services") });

        Self { addr, recorded }
    }

    /// # Panics
    ///
    /// Never; a bound socket address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("base url")
    }

    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[must_use]
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            publishable_key: SecretString::from("pk_test_integration".to_owned()),
            api_base: self.base_url(),
        }
    }

    /// What the services have received so far.
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        lock(&self.recorded)
    }
}

fn cents_for(item: &Value) -> i64 {
    let price = item
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| ProductId::parse(id).ok())
        .and_then(|id| catalog().get(&id).map(|p| p.unit_price_cents.as_i64()))
        .unwrap_or_default();
    let qty = item.get("qty").and_then(Value::as_i64).unwrap_or_default();
    price * qty
}

async fn tax_preview(
    State(recorded): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = {
        let mut recorded = lock(&recorded);
        recorded.tax_previews.push(body.clone());
        recorded.tax_previews.len()
    };

    let postal_code = body
        .pointer("/shipping/address/postal_code")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if postal_code == REJECTED_POSTAL_CODE {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid postal code"})),
        );
    }

    let subtotal: i64 = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(cents_for).sum())
        .unwrap_or_default();
    let tax = subtotal * TAX_RATE_PERCENT / 100;

    (
        StatusCode::OK,
        Json(json!({
            "id": format!("taxcalc_{n}"),
            "subtotal": subtotal,
            "tax": tax,
            "total": subtotal + tax,
        })),
    )
}

async fn create_payment_intent(
    State(recorded): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = {
        let mut recorded = lock(&recorded);
        recorded.payment_intents.push(body.clone());
        recorded.payment_intents.len()
    };

    if body.get("calc_id").and_then(Value::as_str).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing calc_id"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"clientSecret": format!("pi_{n}_secret_test")})),
    )
}

async fn confirm(
    State(recorded): State<Shared>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let method = form.get("payment_method").cloned().unwrap_or_default();
    lock(&recorded).confirmations.push(form);

    match method.as_str() {
        DECLINED_CARD => (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({"error": {"message": "Your card was declined."}})),
        ),
        AUTH_REQUIRED_CARD => (
            StatusCode::OK,
            Json(json!({"id": id, "status": "requires_action"})),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({"id": id, "status": "succeeded"})),
        ),
    }
}

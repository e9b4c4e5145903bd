//! Checkout over HTTP: the session driving the real API client and payment
//! widget against local fake services, with state in a temp directory.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use url::Url;

use seattle_trading_core::{CartLine, Cents, OrderStatus, ProductId, ShippingAddress};
use seattle_trading_integration_tests::{
    AUTH_REQUIRED_CARD, DECLINED_CARD, FakeServices, REJECTED_POSTAL_CODE, catalog,
};
use seattle_trading_storefront::account::OrderHistory;
use seattle_trading_storefront::api::CheckoutClient;
use seattle_trading_storefront::cart::CartStore;
use seattle_trading_storefront::checkout::{CheckoutSession, CheckoutState, Customer, Reconciler};
use seattle_trading_storefront::payment::StripeWidget;
use seattle_trading_storefront::storage::{FileStore, keys, read_json};
use seattle_trading_storefront::totals::TotalsSnapshot;

type Session<'a> = CheckoutSession<&'a FileStore, CheckoutClient, StripeWidget>;

fn confirmation_url() -> Url {
    Url::parse("http://127.0.0.1:5500/thank-you.html").unwrap()
}

fn session<'a>(store: &'a FileStore, services: &FakeServices, payment_method: &str) -> Session<'a> {
    let api = CheckoutClient::new(&services.api_config()).unwrap();
    let widget = StripeWidget::new(&services.stripe_config(), payment_method).unwrap();
    CheckoutSession::new(store, catalog(), api, widget, Reconciler::new(confirmation_url()))
        .with_customer(Customer {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
        })
}

fn seattle() -> ShippingAddress {
    ShippingAddress {
        name: "Ada Lovelace".into(),
        line1: "1 Pike St".into(),
        city: "Seattle".into(),
        state: "WA".into(),
        postal_code: "98101".into(),
        country: "US".into(),
    }
}

fn id(raw: &str) -> ProductId {
    ProductId::parse(raw).unwrap()
}

#[tokio::test]
async fn test_checkout_end_to_end() {
    let services = FakeServices::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut s = session(&store, &services, "pm_card_visa");

    s.add_to_cart(&id("A")).await.unwrap();
    s.add_to_cart(&id("A")).await.unwrap();
    assert_eq!(s.state(), CheckoutState::AddressIncomplete);
    assert_eq!(s.display().subtotal.to_string(), "$20.00");

    let display = s.set_address(seattle()).await.unwrap();
    assert_eq!(display.item_count, 2);
    assert_eq!(display.subtotal.to_string(), "$20.00");
    assert_eq!(display.tax.to_string(), "$2.00");
    assert_eq!(display.total.to_string(), "$22.00");
    assert!(display.submit_enabled);

    let totals: TotalsSnapshot = read_json(&store, keys::LAST_TOTALS).unwrap().unwrap();
    assert_eq!(totals.total_c, Cents::new(2200));

    let confirmation = s.submit().await.unwrap().unwrap();
    assert_eq!(s.state(), CheckoutState::PaymentConfirmed);
    assert_eq!(confirmation.payment_id.as_str(), "pi_1");
    assert_eq!(
        confirmation.redirect_url.as_str(),
        "http://127.0.0.1:5500/thank-you.html?pi=pi_1"
    );

    {
        let recorded = services.recorded();
        assert_eq!(recorded.tax_previews.len(), 1);
        assert_eq!(
            recorded.tax_previews[0],
            json!({
                "items": [{"id": "A", "qty": 2}],
                "shipping": {
                    "name": "Ada Lovelace",
                    "address": {
                        "line1": "1 Pike St",
                        "city": "Seattle",
                        "state": "WA",
                        "postal_code": "98101",
                        "country": "US",
                    },
                },
            })
        );

        let intent = &recorded.payment_intents[0];
        assert_eq!(intent["calc_id"], "taxcalc_1");
        assert_eq!(intent["email"], "ada@example.com");
        assert_eq!(intent["cart"], json!([{"id": "A", "qty": 2, "p": 1000}]));

        let form = &recorded.confirmations[0];
        assert_eq!(form["client_secret"], "pi_1_secret_test");
        assert_eq!(form["payment_method"], "pm_card_visa");
        assert_eq!(form["return_url"], "http://127.0.0.1:5500/thank-you.html");
    }

    let orders = OrderHistory::new(&store).list().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, "pi_1");
    assert_eq!(orders[0].items, Some(2));
    assert_eq!(orders[0].total_c, Some(Cents::new(2200)));
    assert_eq!(orders[0].status(), OrderStatus::Paid);
    assert!(orders[0].ts.is_some());

    let last: Vec<CartLine> = read_json(&store, keys::LAST_ORDER).unwrap().unwrap();
    assert_eq!(last[0].quantity(), 2);
    assert!(CartStore::new(&store).lines().unwrap().is_empty());
}

#[tokio::test]
async fn test_declined_card_allows_retry() {
    let services = FakeServices::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut s = session(&store, &services, DECLINED_CARD);

    s.add_to_cart(&id("B")).await.unwrap();
    s.set_address(seattle()).await.unwrap();
    assert_eq!(s.display().total, Cents::new(14999 + 1499));

    assert!(s.submit().await.unwrap().is_none());
    assert_eq!(s.state(), CheckoutState::PaymentFailed);
    assert_eq!(
        s.display().message.as_deref(),
        Some("Your card was declined.")
    );
    assert!(s.display().submit_enabled);

    // Nothing recorded, nothing cleared.
    assert!(OrderHistory::new(&store).list().unwrap().is_empty());
    assert_eq!(CartStore::new(&store).lines().unwrap().len(), 1);
}

#[tokio::test]
async fn test_authentication_required_is_not_confirmed() {
    let services = FakeServices::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut s = session(&store, &services, AUTH_REQUIRED_CARD);

    s.add_to_cart(&id("C")).await.unwrap();
    s.set_address(seattle()).await.unwrap();

    assert!(s.submit().await.unwrap().is_none());
    assert_eq!(s.state(), CheckoutState::PaymentFailed);
    assert_eq!(
        s.display().message.as_deref(),
        Some("Additional authentication required or unexpected status.")
    );
    assert!(s.display().submit_enabled);
}

#[tokio::test]
async fn test_rejected_address_shows_service_message() {
    let services = FakeServices::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut s = session(&store, &services, "pm_card_visa");

    s.add_to_cart(&id("A")).await.unwrap();
    let address = ShippingAddress {
        postal_code: REJECTED_POSTAL_CODE.into(),
        ..seattle()
    };
    let display = s.set_address(address).await.unwrap();
    assert_eq!(display.message.as_deref(), Some("Invalid postal code"));
    assert!(!display.submit_enabled);
    assert_eq!(display.total, Cents::new(1000));
    assert_eq!(s.state(), CheckoutState::AddressIncomplete);
    assert!(s.submit().await.is_err());
    assert!(services.recorded().payment_intents.is_empty());

    // Fixing the address quotes again.
    let display = s.set_address(seattle()).await.unwrap();
    assert!(display.submit_enabled);
    assert_eq!(display.total, Cents::new(1100));
    assert_eq!(services.recorded().tax_previews.len(), 2);
}

#[tokio::test]
async fn test_cart_change_after_quote_requotes_before_paying() {
    let services = FakeServices::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut s = session(&store, &services, "pm_card_visa");

    s.add_to_cart(&id("A")).await.unwrap();
    s.set_address(seattle()).await.unwrap();
    s.set_quantity(&id("A"), 3).await.unwrap();
    assert_eq!(s.display().total, Cents::new(3300));
    assert_eq!(services.recorded().tax_previews.len(), 2);

    let confirmation = s.submit().await.unwrap().unwrap();
    assert_eq!(confirmation.quote.total_cents(), Cents::new(3300));
    assert_eq!(
        services.recorded().payment_intents[0]["calc_id"],
        "taxcalc_2"
    );
}

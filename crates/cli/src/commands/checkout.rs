//! Checkout: quote tax for the stored cart and pay with the hosted widget.
//!
//! # Usage
//!
//! ```bash
//! st-cli checkout --name "Ada Lovelace" --line1 "1 Pike St" --city Seattle \
//!     --state WA --postal-code 98101 --email ada@example.com --quote-only
//!
//! st-cli checkout --name "Ada Lovelace" --line1 "1 Pike St" --city Seattle \
//!     --state WA --postal-code 98101 --payment-method pm_card_visa
//! ```

use clap::Args;
use tracing::{info, warn};

use seattle_trading_core::ShippingAddress;
use seattle_trading_storefront::account::ProfileStore;
use seattle_trading_storefront::api::CheckoutClient;
use seattle_trading_storefront::checkout::{
    CheckoutDisplay, CheckoutSession, CheckoutState, Customer, Reconciler,
};
use seattle_trading_storefront::payment::StripeWidget;

use super::{CommandError, Storefront};

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Recipient name (defaults to the signed-in profile name)
    #[arg(long, default_value = "")]
    name: String,

    /// Street address
    #[arg(long)]
    line1: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    state: String,

    #[arg(long)]
    postal_code: String,

    #[arg(long, default_value = "US")]
    country: String,

    /// Receipt email (defaults to the signed-in profile email)
    #[arg(long)]
    email: Option<String>,

    /// Payment method handed to the widget
    #[arg(long, default_value = "pm_card_visa")]
    payment_method: String,

    /// Stop after the tax quote
    #[arg(long)]
    quote_only: bool,
}

impl CheckoutArgs {
    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            name: self.name.clone(),
            line1: self.line1.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

fn print_display(view: &CheckoutDisplay) {
    info!("Items:    {}", view.item_count);
    info!("Subtotal: {}", view.subtotal);
    info!("Tax:      {}", view.tax);
    info!("Total:    {}", view.total);
    if let Some(message) = &view.message {
        info!("{message}");
    }
}

fn stopped(display: &CheckoutDisplay, state: CheckoutState) -> CommandError {
    let reason = display
        .message
        .clone()
        .unwrap_or_else(|| format!("checkout is {state:?}"));
    CommandError::Stopped(reason)
}

/// Quote the cart and, unless `quote_only`, pay for it.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the quote or payment
/// does not go through, or storage fails.
pub async fn run(storefront: Storefront, args: CheckoutArgs) -> Result<(), CommandError> {
    let Storefront {
        config,
        store,
        catalog,
    } = storefront;

    let stripe = config.require_stripe()?;
    if stripe.is_test_mode() {
        info!("Using Stripe test mode");
    }
    let widget = StripeWidget::new(stripe, args.payment_method.clone())?;
    let api = CheckoutClient::new(&config.api)?;

    let mut customer = ProfileStore::new(&store)
        .get()?
        .map(|profile| Customer::from(&profile))
        .unwrap_or_default();
    if let Some(email) = &args.email {
        email.trim().clone_into(&mut customer.email);
    }

    let reconciler = Reconciler::new(config.confirmation_url.clone());
    let mut session =
        CheckoutSession::new(&store, catalog, api, widget, reconciler).with_customer(customer);

    let display = session.set_address(args.address()).await?.clone();
    print_display(&display);

    let state = session.state();
    if state != CheckoutState::QuoteReady {
        return Err(stopped(&display, state));
    }
    if args.quote_only {
        return Ok(());
    }

    match session.submit().await? {
        Some(confirmation) => {
            info!(
                "Payment {}: {}",
                confirmation.status, confirmation.payment_id
            );
            info!("Charged {}", confirmation.quote.total_cents());
            info!("Confirmation: {}", confirmation.redirect_url);
            Ok(())
        }
        None => {
            warn!("Payment did not complete");
            Err(stopped(session.display(), session.state()))
        }
    }
}

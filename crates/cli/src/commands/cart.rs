//! Cart editing.
//!
//! These commands only touch local storage. Tax is quoted by `checkout`.
//!
//! # Usage
//!
//! ```bash
//! st-cli cart add us-2000-pro-3.5-ice-blue
//! st-cli cart set us-2000-pro-3.5-ice-blue 3
//! st-cli cart remove us-2000-pro-3.5-ice-blue
//! st-cli cart show
//! st-cli cart clear
//! ```

use tracing::{info, warn};

use seattle_trading_storefront::cart::{AddOutcome, CartStore};
use seattle_trading_storefront::error::add_breadcrumb;
use seattle_trading_storefront::storage::FileStore;
use seattle_trading_storefront::totals::compute_totals;

use super::{CommandError, Storefront};

fn cart(storefront: &Storefront) -> CartStore<&FileStore> {
    CartStore::new(&storefront.store)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the id is malformed or storage fails.
pub fn add(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    let id = storefront.product_id(id)?;
    match cart(storefront).add(&storefront.catalog, &id)? {
        AddOutcome::Added => info!("Added {id} to cart"),
        AddOutcome::Incremented { quantity } => info!("{id} now x{quantity}"),
        AddOutcome::UnknownProduct => return Err(CommandError::UnknownProduct(id.into_inner())),
    }
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
    show(storefront)
}

/// Set a line's quantity. Values below 1 become 1.
///
/// # Errors
///
/// Returns an error if the id is malformed or storage fails.
pub fn set(storefront: &Storefront, id: &str, quantity: i64) -> Result<(), CommandError> {
    let id = storefront.product_id(id)?;
    if !cart(storefront).set_quantity(&id, quantity)? {
        warn!("{id} is not in the cart");
        return Ok(());
    }
    show(storefront)
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the id is malformed or storage fails.
pub fn remove(storefront: &Storefront, id: &str) -> Result<(), CommandError> {
    let id = storefront.product_id(id)?;
    if cart(storefront).remove(&id)? {
        add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));
        info!("Removed {id}");
    } else {
        warn!("{id} is not in the cart");
    }
    show(storefront)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn clear(storefront: &Storefront) -> Result<(), CommandError> {
    cart(storefront).clear()?;
    info!("Cart cleared");
    Ok(())
}

/// Print the cart with its optimistic subtotal and badge count.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn show(storefront: &Storefront) -> Result<(), CommandError> {
    let cart = cart(storefront);
    let lines = cart.list(&storefront.catalog)?;
    if lines.is_empty() {
        info!("Your cart is empty.");
    }
    for line in &lines {
        info!(
            "{:<24} x{:<3} {:>10}  {}",
            line.product.id.as_str(),
            line.quantity,
            line.line_total().to_string(),
            line.product.name
        );
    }

    let stored = cart.current_lines(&storefront.catalog)?;
    let totals = compute_totals(&stored, &storefront.catalog);
    info!("Items: {}  Subtotal: {}", totals.item_count, totals.subtotal);
    info!("Cart badge: {}", cart.item_count()?);
    Ok(())
}

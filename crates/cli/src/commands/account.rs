//! Local customer profile and order history.
//!
//! # Usage
//!
//! ```bash
//! st-cli account login -n "Ada Lovelace" -e ada@example.com
//! st-cli account show
//! st-cli account update -n "Ada King" -e ada@example.com
//! st-cli account orders
//! st-cli account logout
//! ```

use tracing::info;

use seattle_trading_storefront::account::{OrderHistory, ProfileError, ProfileStore};

use super::{CommandError, Storefront};

/// Sign in.
///
/// # Errors
///
/// Returns an error if the name or email is invalid, or storage fails.
pub fn login(storefront: &Storefront, name: &str, email: &str) -> Result<(), CommandError> {
    let profile = ProfileStore::new(&storefront.store).login(name, email)?;
    info!("Signed in as {} <{}>", profile.name, profile.email);
    Ok(())
}

/// Print the greeting and the stored profile.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn show(storefront: &Storefront) -> Result<(), CommandError> {
    let profiles = ProfileStore::new(&storefront.store);
    info!("{}", profiles.greeting()?);
    if let Some(profile) = profiles.get()? {
        info!("  name:   {}", profile.name);
        info!("  email:  {}", profile.email);
        info!("  since:  {}", profile.ts.format("%Y-%m-%d"));
        if let Some(updated) = profile.updated_at {
            info!("  edited: {}", updated.format("%Y-%m-%d"));
        }
    }
    Ok(())
}

/// Change the stored name and email.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the input is invalid, or
/// storage fails.
pub fn update(storefront: &Storefront, name: &str, email: &str) -> Result<(), CommandError> {
    let profile = ProfileStore::new(&storefront.store).update(name, email)?;
    info!("Profile saved for {}", profile.email);
    Ok(())
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn logout(storefront: &Storefront) -> Result<(), CommandError> {
    ProfileStore::new(&storefront.store).logout()?;
    Ok(())
}

/// List orders placed from this device.
///
/// # Errors
///
/// Returns an error if nobody is signed in or storage fails.
pub fn orders(storefront: &Storefront) -> Result<(), CommandError> {
    if ProfileStore::new(&storefront.store).get()?.is_none() {
        return Err(ProfileError::NotSignedIn.into());
    }

    let orders = OrderHistory::new(&storefront.store).list()?;
    if orders.is_empty() {
        info!("No orders yet.");
    }
    for order in &orders {
        let date = order
            .ts
            .map_or_else(|| "—".to_string(), |ts| ts.format("%Y-%m-%d").to_string());
        info!(
            "#{:<8}  {}  {:>10}  {:>3} items  {}",
            order.short_reference(),
            date,
            order.display_amount().to_string(),
            order.items.unwrap_or_default(),
            order.status()
        );
    }
    Ok(())
}

//! Local customer profile and order history.
//!
//! There is no server-side account. The profile only prefills checkout and
//! the order history is whatever this device has recorded.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use seattle_trading_core::{Email, EmailError, OrderRecord, UserProfile};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{KeyValueStore, StorageError, keys, read_json_lenient, write_json};

/// Header link text when nobody is signed in.
pub const SIGNED_OUT_GREETING: &str = "Login";

/// Errors from profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Please enter your name.")]
    MissingName,

    #[error("Please enter a valid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The locally stored customer profile.
#[derive(Debug, Clone)]
pub struct ProfileStore<S> {
    store: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The signed-in profile. A corrupt profile reads as signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn get(&self) -> Result<Option<UserProfile>, StorageError> {
        read_json_lenient(&self.store, keys::USER)
    }

    /// Sign in with a name and email.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the email is invalid, or
    /// storage fails.
    #[instrument(skip_all)]
    pub fn login(&self, name: &str, email: &str) -> Result<UserProfile, ProfileError> {
        let (name, email) = validate(name, email)?;
        let profile = UserProfile {
            name,
            email,
            ts: Utc::now(),
            updated_at: None,
        };
        write_json(&self.store, keys::USER, &profile)?;
        set_sentry_user(&profile.email, Some(profile.email.as_str()));
        info!("Signed in");
        Ok(profile)
    }

    /// Change the signed-in customer's name and email.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotSignedIn`] without a profile, or a
    /// validation or storage error.
    #[instrument(skip_all)]
    pub fn update(&self, name: &str, email: &str) -> Result<UserProfile, ProfileError> {
        let current = self.get()?.ok_or(ProfileError::NotSignedIn)?;
        let (name, email) = validate(name, email)?;
        let profile = UserProfile {
            name,
            email,
            updated_at: Some(Utc::now()),
            ..current
        };
        write_json(&self.store, keys::USER, &profile)?;
        set_sentry_user(&profile.email, Some(profile.email.as_str()));
        info!("Profile updated");
        Ok(profile)
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.remove(keys::USER)?;
        clear_sentry_user();
        info!("Signed out");
        Ok(())
    }

    /// Header link text: `Hi, <first name>` or `Login`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn greeting(&self) -> Result<String, StorageError> {
        Ok(self.get()?.map_or_else(
            || SIGNED_OUT_GREETING.to_string(),
            |p| format!("Hi, {}", p.first_name()),
        ))
    }
}

fn validate(name: &str, email: &str) -> Result<(String, Email), ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::MissingName);
    }
    Ok((name.to_string(), Email::parse(email)?))
}

/// Orders placed from this device, newest first.
#[derive(Debug, Clone)]
pub struct OrderHistory<S> {
    store: S,
}

impl<S: KeyValueStore> OrderHistory<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// All recorded orders. A corrupt history reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn list(&self) -> Result<Vec<OrderRecord>, StorageError> {
        Ok(read_json_lenient(&self.store, keys::ORDERS)?.unwrap_or_default())
    }

    /// Record an order at the front of the history.
    ///
    /// A missing timestamp is set to now.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    #[instrument(skip_all, fields(order = %order.short_reference()))]
    pub fn push(&self, mut order: OrderRecord) -> Result<(), StorageError> {
        order.ts.get_or_insert_with(Utc::now);
        let mut list = self.list()?;
        list.insert(0, order);
        write_json(&self.store, keys::ORDERS, &list)?;
        info!(orders = list.len(), "Order recorded");
        Ok(())
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for storefront operations. Front ends
//! call [`AppError::report`] before showing an error so infrastructure
//! failures reach Sentry while buyer mistakes do not.

use thiserror::Error;

use crate::account::ProfileError;
use crate::api::ApiError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::payment::WidgetError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Product catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout API call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Payment widget failed.
    #[error("{0}")]
    Payment(#[from] WidgetError),

    /// Checkout cannot proceed.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// Profile operation failed.
    #[error("{0}")]
    Profile(#[from] ProfileError),
}

impl AppError {
    /// Whether this error points at a fault worth reporting, rather than at
    /// something the buyer can fix.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Catalog(_) => true,
            Self::Api(ApiError::Service { status, .. }) => matches!(status, Some(500..)),
            Self::Api(_) => true,
            Self::Payment(err) => !matches!(err, WidgetError::Declined { .. }),
            Self::Profile(err) => matches!(err, ProfileError::Storage(_)),
            Self::Checkout(_) => false,
        }
    }

    /// Capture reportable errors to Sentry and log them.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "Buyer-facing error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the customer.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for buyer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "nitrile-blue")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

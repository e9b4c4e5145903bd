//! Subcommand implementations.
//!
//! Every command opens the same [`Storefront`]: configuration, the file-backed
//! store, and the product catalog.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod theme;

use thiserror::Error;

use seattle_trading_core::{IdError, ProductId};
use seattle_trading_storefront::account::ProfileError;
use seattle_trading_storefront::api::ApiError;
use seattle_trading_storefront::catalog::{Catalog, CatalogError};
use seattle_trading_storefront::config::{ConfigError, StorefrontConfig};
use seattle_trading_storefront::error::AppError;
use seattle_trading_storefront::payment::WidgetError;
use seattle_trading_storefront::storage::{FileStore, StorageError};

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Invalid product id: {0}")]
    InvalidProductId(#[from] IdError),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    /// Checkout ended without a quote or payment.
    #[error("Checkout stopped: {0}")]
    Stopped(String),
}

impl CommandError {
    /// Send storefront faults to Sentry before the process exits.
    pub fn report(&self) {
        if let Self::App(err) = self {
            err.report();
        }
    }
}

macro_rules! from_storefront_error {
    ($($ty:ty),+) => {
        $(impl From<$ty> for CommandError {
            fn from(err: $ty) -> Self {
                Self::App(err.into())
            }
        })+
    };
}

from_storefront_error!(
    ApiError,
    CatalogError,
    ConfigError,
    ProfileError,
    StorageError,
    WidgetError
);

/// Loaded configuration, storage, and catalog.
pub struct Storefront {
    pub config: StorefrontConfig,
    pub store: FileStore,
    pub catalog: Catalog,
}

impl Storefront {
    /// Open the store directory and load the catalog named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the catalog
    /// cannot be read.
    pub fn open(config: StorefrontConfig) -> Result<Self, CommandError> {
        let store = FileStore::open(config.storage_dir.clone())?;
        let catalog = Catalog::load(&config.catalog_path)?;
        tracing::debug!(
            storage_dir = %config.storage_dir.display(),
            products = catalog.len(),
            "Storefront opened"
        );
        Ok(Self {
            config,
            store,
            catalog,
        })
    }

    /// Parse `id` and make sure the catalog carries it.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed or unknown.
    pub fn product_id(&self, id: &str) -> Result<ProductId, CommandError> {
        let id = ProductId::parse(id)?;
        if self.catalog.contains(&id) {
            Ok(id)
        } else {
            Err(CommandError::UnknownProduct(id.into_inner()))
        }
    }
}

//! Client-side key-value storage.
//!
//! # Storage model
//!
//! The storefront keeps all of its state in a flat key-value store holding
//! JSON strings, the same model as browser local storage:
//!
//! - [`keys::CART`] - cart lines (`[{"id", "qty"}]`)
//! - [`keys::USER`] - local customer profile
//! - [`keys::ORDERS`] - order history, newest first
//! - [`keys::LAST_TOTALS`] - last authoritative totals snapshot
//! - [`keys::LAST_ORDER`] - cart lines of the last payment attempt
//! - [`keys::THEME`] - theme preference
//!
//! Every read goes to the backing store. Nothing is cached in memory between
//! operations, so two handles over the same directory always agree.

mod file;
mod memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage keys.
pub mod keys {
    /// Cart lines.
    pub const CART: &str = "seattle_trading_cart_v1";

    /// Local customer profile.
    pub const USER: &str = "st_user";

    /// Order history.
    pub const ORDERS: &str = "st_orders_v1";

    /// Totals snapshot from the last successful tax quote.
    pub const LAST_TOTALS: &str = "last_totals";

    /// Cart lines submitted with the last payment attempt.
    pub const LAST_ORDER: &str = "last_order";

    /// Theme preference.
    pub const THEME: &str = "theme";
}

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored value is not valid JSON for the expected type.
    #[error("Corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be serialized.
    #[error("Failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters the backend cannot store.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A synchronous string key-value store.
///
/// Writes must be durable when the call returns.
pub trait KeyValueStore {
    /// Read the raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Read and decode a JSON value.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the stored value does not decode.
pub fn read_json<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Read a JSON value, treating corrupt data as absent.
///
/// Corrupt values are logged and left in place; the next write replaces them.
///
/// # Errors
///
/// Returns an error only if the backend itself fails.
pub fn read_json_lenient<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match read_json(store, key) {
        Err(StorageError::Corrupt { key, source }) => {
            tracing::warn!(key = %key, error = %source, "Ignoring corrupt stored value");
            Ok(None)
        }
        other => other,
    }
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let store = MemoryStore::new();
        write_json(&store, "k", &vec![1, 2, 3]).unwrap();
        let value: Option<Vec<i32>> = read_json(&store, "k").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        let value: Option<Vec<i32>> = read_json(&store, "missing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_corrupt_value() {
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();

        let strict: Result<Option<Vec<i32>>, _> = read_json(&store, "k");
        assert!(matches!(strict, Err(StorageError::Corrupt { .. })));

        let lenient: Option<Vec<i32>> = read_json_lenient(&store, "k").unwrap();
        assert!(lenient.is_none());
        // Left in place for the next write to replace.
        assert_eq!(store.get("k").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_blanket_impls() {
        let store = Arc::new(MemoryStore::new());
        let by_ref: &MemoryStore = &store;
        by_ref.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}

//! Newtype IDs for type-safe entity references.
//!
//! Every identifier in the storefront is an opaque string issued by someone
//! else: the catalog file, the tax service, or the payment provider. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing them.

use thiserror::Error;

/// Errors that can occur when parsing an ID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty or whitespace only.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` rejecting empty input, `as_str()`, `into_inner()`
/// - `Display`, `FromStr` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use seattle_trading_core::define_id;
/// define_id!(SkuId);
/// define_id!(BinId);
///
/// let sku = SkuId::parse("sku-1").unwrap();
/// assert_eq!(sku.as_str(), "sku-1");
///
/// // These are different types, so this won't compile:
/// // let _: BinId = sku;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Empty`](crate::IdError::Empty) if the trimmed input is empty.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty(stringify!($name)));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog product handle (e.g. `us-2000-pro-3.5-ice-blue`).
define_id!(ProductId);
// Tax calculation id returned by the tax preview service.
define_id!(QuoteId);
// Payment intent id returned by the payment provider (`pi_...`).
define_id!(PaymentId);

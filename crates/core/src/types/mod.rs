//! Core types for the Seattle Trading storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;
pub mod quote;
pub mod status;

pub use address::{AddressField, ShippingAddress};
pub use cart::{CartLine, CompactCartLine, clamp_quantity};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::OrderRecord;
pub use price::{Cents, CurrencyCode};
pub use product::Product;
pub use profile::UserProfile;
pub use quote::TaxQuote;
pub use status::*;

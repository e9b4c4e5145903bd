//! Seattle Trading Storefront library.
//!
//! Catalog, persisted cart, and the checkout flow that reconciles the cart
//! and shipping address with server-side tax quotes and a hosted payment
//! widget.
//!
//! # Architecture
//!
//! - [`storage`] - Key-value persistence for client state
//! - [`catalog`] / [`cart`] / [`totals`] - Products, cart lines, optimistic totals
//! - [`api`] - Checkout API (tax preview, payment intent)
//! - [`payment`] - Hosted payment widget
//! - [`checkout`] - Reconciler state machine and the session that drives it
//! - [`account`] / [`preferences`] - Local profile, order history, theme

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod payment;
pub mod preferences;
pub mod storage;
pub mod totals;

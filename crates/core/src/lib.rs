//! Giftshop Core - Shared domain types.
//!
//! This crate provides the types used across all Giftshop components:
//! - `storefront` - The JSON API server (catalog, cart, checkout, admin)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no
//! database access, no HTTP clients. The optional `sqlite` feature adds sqlx
//! encode/decode implementations so the types can be bound directly in
//! queries.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, checkout totals, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

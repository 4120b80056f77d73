//! Giftshop storefront library.
//!
//! The JSON API is built here so the binary, the CLI, and the integration
//! tests share one router and one set of services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin password verification (Argon2)
//! - `cart` - Cart operations and checkout totals
//! - `catalog` - Product listing, admin product edits, category list
//! - `orders` - Transactional checkout and order administration
//! - `payment` - Payment gateway bridge and signature verification
//!
//! Services borrow the connection pool and return [`crate::error::AppError`],
//! so route handlers stay thin.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payment;

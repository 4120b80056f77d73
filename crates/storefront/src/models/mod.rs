//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and serialize with camelCase field names,
//! which is the JSON shape clients consume.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use order::{Order, OrderDetail, OrderLine};
pub use product::Product;
pub use session::{CurrentAdmin, keys as session_keys};
pub use user::User;

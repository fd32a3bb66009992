//! Checkout Module
//!
//! Turns a cart into an order in the `orders` collection, guarded by the
//! per-phone submission rate limiter.

pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::routes;
pub use models::{CustomerDetails, OrderPayload, Receipt};
pub use service::{submit_order, CheckoutError};

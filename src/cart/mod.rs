//! Shopping Cart Domain Module
//!
//! This module contains all shopping cart business logic, including:
//! - The cart aggregate (merge rules, bundle lines, totals)
//! - Domain models (lines, inputs, views)
//! - Identifier and formatting helpers
//! - Application state and the persistent cart store
//! - REST API handlers

pub mod aggregate;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod state;
pub mod store;

// Re-export commonly used types for convenience
pub use aggregate::{Cart, CartError};
pub use handlers::routes;
pub use state::{AppState, SharedState};
pub use store::{CartStore, JsonFileCartStore, MemoryCartStore, StoreError};

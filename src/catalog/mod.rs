//! Catalog Module
//!
//! Read models for products, special offers and gift promotions, decoded
//! from data-service records.

pub mod loaders;
pub mod models;

pub use loaders::{
    fetch_active_gift_promotion, fetch_bundle_offer, fetch_product, fetch_products, CatalogError,
};
pub use models::{OptionMismatch, Product, ProductOptions};

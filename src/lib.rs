//! Storefront Order Engine Library
//!
//! This library provides the core of an online storefront: the cart
//! aggregate, bundle offers, threshold gifts, order submission with a
//! per-phone rate limit, and the retry wrapper around every backend call.

// Domain modules
pub mod bundle;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod gift;
pub mod ratelimit;

// Infrastructure
pub mod config;
pub mod data;
pub mod demo;
pub mod retry;
pub mod router;
pub mod selector;

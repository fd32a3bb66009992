//! Order Submission Rate Limiting
//!
//! A sliding window over the `order_rate_limits` collection, keyed by the
//! customer's phone number, plus the periodic sweep that removes old records.

pub mod limiter;
pub mod models;

pub use limiter::{normalize_phone, spawn_cleanup_sweep, RateLimiter};
pub use models::{RateLimitDecision, RateLimitPolicy, RateLimitRecord};

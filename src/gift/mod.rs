//! Gift Promotion Module
//!
//! Threshold-triggered free gifts:
//! - Promotion and candidate models
//! - The eligibility engine (threshold, progress, choice, weighted draw)
//! - The cancellable timed reveal for random gifts
//! - REST handlers

pub mod engine;
pub mod handlers;
pub mod models;
pub mod reveal;

pub use engine::{GiftEngine, GiftError};
pub use handlers::routes;
pub use models::{GiftCandidate, GiftMode, GiftPromotion, SelectedGift};
pub use reveal::{RevealConfig, RevealEvent, RevealHandle, RevealPlan};

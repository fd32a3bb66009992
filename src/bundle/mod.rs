//! Bundle Offer Module
//!
//! "Special offer" bundles: the admin-authored offer model and the selection
//! state machine that decides when a bundle may become a cart line.

pub mod models;
pub mod selection;

pub use models::BundleOffer;
pub use selection::{BundleSelection, SelectionState, ToggleOutcome};

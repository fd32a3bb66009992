//! Shopping Cart Helpers
//!
//! Identifier generation and formatting used across cart operations.

use super::models::CartLine;
use uuid::Uuid;

/// Returns the provided `cart_id` or creates a new UUID string when `None`.
///
/// This guarantees that every cart operation works with a non-empty identifier.
pub fn get_or_create_cart_id(cart_id: Option<String>) -> String {
    cart_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

/// Fresh identifier for a cart line.
pub fn new_line_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Whether `cart_id` is safe to use as a storage key (and file name).
pub fn is_valid_cart_id(cart_id: &str) -> bool {
    !cart_id.is_empty()
        && cart_id.len() <= 64
        && cart_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Produces a human-readable one-line summary for a list of cart lines.
///
/// Example output: `"2x عباية, 1x أي ٣ عطور"`.
pub fn format_item_summary(items: &[CartLine]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.quantity, i.name))
        .collect::<Vec<_>>()
        .join(", ")
}

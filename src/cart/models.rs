//! Shopping Cart Domain Models
//!
//! This module contains all data structures related to the shopping cart
//! business domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::Cart;

// =============================================================================
// Cart Domain Models
// =============================================================================

/// Returns the default quantity (1) for cart items
fn default_quantity() -> u32 {
    1
}

/// Size/color chosen for a product variant
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SelectedOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SelectedOptions {
    /// Drops blank values and collapses "nothing selected" to `None`, so that
    /// `None` and `Some({})` address the same cart line.
    pub fn normalized(options: Option<Self>) -> Option<Self> {
        let options = options?;
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let normalized = Self {
            size: clean(options.size),
            color: clean(options.color),
        };
        if normalized.size.is_none() && normalized.color.is_none() {
            None
        } else {
            Some(normalized)
        }
    }
}

/// One product inside a bundle line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleItem {
    pub product_id: String,
    pub name: String,
}

/// What a bundle line is made of
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleDetails {
    pub offer_id: String,
    pub offer_name: String,
    pub required_quantity: u32,
    pub products: Vec<BundleItem>,
}

/// Represents a line in the shopping cart
///
/// `bundle_details` is present exactly when `is_bundle` is set; lines are
/// built through [`Cart`] which keeps the two in step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Locally generated line identifier
    pub id: String,

    /// Product id, or the offer id for bundle lines
    pub product_id: String,

    pub name: String,

    /// Price of one unit; for bundles, the price of the whole bundle
    pub unit_price: Decimal,

    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<SelectedOptions>,

    #[serde(default)]
    pub is_bundle: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_details: Option<BundleDetails>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A regular product about to be added to the cart
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub selected_options: Option<SelectedOptions>,
}

// =============================================================================
// REST Inputs and Responses
// =============================================================================

/// Optional body of `POST /carts`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartInput {
    /// Reuse an identifier the client already holds
    #[serde(default)]
    pub cart_id: Option<String>,
}

/// Body of `POST /carts/:cart_id/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product_id: String,

    /// Quantity to add (defaults to 1)
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub selected_options: Option<SelectedOptions>,
}

/// Body of `POST /carts/:cart_id/bundles`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBundleInput {
    pub offer_id: String,

    /// Products picked from the offer's pool, in selection order
    pub product_ids: Vec<String>,
}

/// Body of `PATCH /carts/:cart_id/items/:line_id`
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    /// New quantity; zero or less removes the line
    pub quantity: i64,
}

/// Response for cart creation
#[derive(Serialize)]
pub struct CreateCartResponse {
    /// Status of the operation
    pub status: String,

    /// Cart identifier
    #[serde(rename = "cartId")]
    pub cart_id: String,
}

/// Read view of a cart
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub items: Vec<CartLine>,
    pub special_offers: Vec<CartLine>,
    pub regular_items: Vec<CartLine>,
    pub total: Decimal,
    pub item_count: u32,
}

impl CartView {
    pub fn new(cart_id: impl Into<String>, cart: &Cart) -> Self {
        Self {
            cart_id: cart_id.into(),
            items: cart.items().to_vec(),
            special_offers: cart.special_offers().cloned().collect(),
            regular_items: cart.regular_items().cloned().collect(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

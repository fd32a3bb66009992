//! Bundle Offer Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::models::Product;

/// An admin-authored "special offer": pick exactly `required_quantity`
/// products from `candidate_products` for one combined price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleOffer {
    pub id: String,

    pub name: String,

    pub required_quantity: u32,

    /// Flat price for the whole bundle
    #[serde(default)]
    pub bundle_price: Option<Decimal>,

    /// Per-product price, used when no flat price is set
    #[serde(default)]
    pub unit_price: Option<Decimal>,

    /// Eligible products, in display order
    #[serde(default)]
    pub candidate_products: Vec<Product>,
}

impl BundleOffer {
    /// Price of one bundle line: the flat `bundle_price` when set, otherwise
    /// `unit_price * required_quantity`. `None` for an unpriced offer.
    pub fn line_price(&self) -> Option<Decimal> {
        self.bundle_price
            .or_else(|| {
                self.unit_price
                    .map(|unit| unit * Decimal::from(self.required_quantity))
            })
            .filter(|price| !price.is_sign_negative())
    }

    pub fn candidate(&self, product_id: &str) -> Option<&Product> {
        self.candidate_products.iter().find(|p| p.id == product_id)
    }
}

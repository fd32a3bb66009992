//! Catalog Read Models
//!
//! Products as stored in the `products` collection. Bundle offers and gift
//! promotions are assembled from these by the loaders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::models::SelectedOptions;

/// Variant choices a product offers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductOptions {
    #[serde(default)]
    pub sizes: Vec<String>,

    #[serde(default)]
    pub colors: Vec<String>,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    pub name: String,

    /// List price before any discount
    pub price: Decimal,

    #[serde(default)]
    pub images: Vec<String>,

    /// Percentage off the list price, 0 to 100
    #[serde(default, alias = "discount_percentage")]
    pub discount_percentage: Option<Decimal>,

    #[serde(default)]
    pub options: ProductOptions,
}

impl Product {
    /// Price after discount, rounded to 2 decimal places.
    pub fn effective_price(&self) -> Decimal {
        let discount = self
            .discount_percentage
            .unwrap_or_default()
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        (self.price * (Decimal::ONE_HUNDRED - discount) / Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Checks a requested size/color against what the product offers.
    ///
    /// A product with sizes requires one of them; a product without sizes
    /// accepts none. Colors follow the same rule.
    pub fn check_options(&self, selected: Option<&SelectedOptions>) -> Result<(), OptionMismatch> {
        let size = selected.and_then(|s| s.size.as_deref());
        let color = selected.and_then(|s| s.color.as_deref());
        check_choice("size", size, &self.options.sizes)?;
        check_choice("color", color, &self.options.colors)
    }
}

/// A size or color that the product does not offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMismatch {
    pub field: &'static str,
    pub value: Option<String>,
}

fn check_choice(
    field: &'static str,
    chosen: Option<&str>,
    offered: &[String],
) -> Result<(), OptionMismatch> {
    let ok = match chosen {
        Some(value) => offered.iter().any(|o| o == value),
        None => offered.is_empty(),
    };
    if ok {
        Ok(())
    } else {
        Err(OptionMismatch {
            field,
            value: chosen.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn abaya() -> Product {
        serde_json::from_value(json!({
            "id": "p-abaya",
            "name": "عباية سوداء",
            "price": 250,
            "discount_percentage": 20,
            "options": { "sizes": ["M", "L"], "colors": [] }
        }))
        .unwrap()
    }

    #[test]
    fn test_effective_price_applies_discount() {
        assert_eq!(abaya().effective_price(), Decimal::from(200));

        let mut odd = abaya();
        odd.price = Decimal::new(9999, 2);
        odd.discount_percentage = Some(Decimal::from(15));
        assert_eq!(odd.effective_price(), Decimal::new(8499, 2));

        odd.discount_percentage = Some(Decimal::from(150));
        assert_eq!(odd.effective_price(), Decimal::ZERO);
    }

    #[test]
    fn test_option_checks() {
        let product = abaya();
        let medium = SelectedOptions {
            size: Some("M".into()),
            color: None,
        };
        assert!(product.check_options(Some(&medium)).is_ok());
        assert_eq!(product.check_options(None).unwrap_err().field, "size");

        let red = SelectedOptions {
            size: Some("L".into()),
            color: Some("red".into()),
        };
        assert_eq!(product.check_options(Some(&red)).unwrap_err().field, "color");
    }
}

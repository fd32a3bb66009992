//! Cart Aggregate
//!
//! The lines a customer has picked and the rules that govern them:
//! - Regular lines merge per `(product_id, selected_options)`
//! - Bundle lines never merge; each accepted bundle is a new line
//! - The total is recomputed on every read

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::helpers::new_line_id;
use super::models::{BundleDetails, BundleItem, CartLine, NewCartLine, SelectedOptions};
use crate::bundle::{BundleOffer, BundleSelection};

/// Refusals from the cart. The cart is unchanged whenever one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("bundle needs {required} products, {selected} selected")]
    IncompleteBundle { selected: u32, required: u32 },

    #[error("selection belongs to offer '{selection}', not '{offer}'")]
    OfferMismatch { selection: String, offer: String },

    #[error("offer '{0}' has no price")]
    UnpricedOffer(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a regular product, merging into an existing line with the same
    /// product and options. A quantity of 0 counts as 1.
    pub fn add_item(&mut self, item: NewCartLine) -> &CartLine {
        let options = SelectedOptions::normalized(item.selected_options);
        let quantity = item.quantity.max(1);

        let existing = self.lines.iter().position(|line| {
            !line.is_bundle && line.product_id == item.product_id && line.selected_options == options
        });

        let idx = match existing {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(quantity);
                idx
            }
            None => {
                self.lines.push(CartLine {
                    id: new_line_id(),
                    product_id: item.product_id,
                    name: item.name,
                    unit_price: item.unit_price,
                    quantity,
                    selected_options: options,
                    is_bundle: false,
                    bundle_details: None,
                });
                self.lines.len() - 1
            }
        };
        &self.lines[idx]
    }

    /// Turns a complete selection into a new bundle line priced at the
    /// offer's line price.
    pub fn add_bundle(
        &mut self,
        selection: &BundleSelection,
        offer: &BundleOffer,
    ) -> Result<&CartLine, CartError> {
        if selection.offer_id() != offer.id {
            return Err(CartError::OfferMismatch {
                selection: selection.offer_id().to_string(),
                offer: offer.id.clone(),
            });
        }
        if offer.required_quantity == 0 || selection.len() != offer.required_quantity {
            return Err(CartError::IncompleteBundle {
                selected: selection.len(),
                required: offer.required_quantity,
            });
        }
        let price = offer
            .line_price()
            .ok_or_else(|| CartError::UnpricedOffer(offer.id.clone()))?;

        let products = selection
            .selected()
            .iter()
            .map(|p| BundleItem {
                product_id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();

        self.lines.push(CartLine {
            id: new_line_id(),
            product_id: offer.id.clone(),
            name: offer.name.clone(),
            unit_price: price,
            quantity: 1,
            selected_options: None,
            is_bundle: true,
            bundle_details: Some(BundleDetails {
                offer_id: offer.id.clone(),
                offer_name: offer.name.clone(),
                required_quantity: offer.required_quantity,
                products,
            }),
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Sets a line's quantity; zero or less removes it. Returns whether a
    /// line was found.
    pub fn update_quantity(&mut self, line_id: &str, new_quantity: i64) -> bool {
        if new_quantity <= 0 {
            return self.remove_item(line_id);
        }
        match self.lines.iter_mut().find(|line| line.id == line_id) {
            Some(line) => {
                line.quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
                true
            }
            None => false,
        }
    }

    /// Removes a line. Returns whether it existed.
    pub fn remove_item(&mut self, line_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != line_id);
        self.lines.len() != before
    }

    /// Takes the lines of a placed order out of the cart. Lines added after
    /// `ordered` was copied stay, and so does quantity added to an ordered
    /// line in the meantime.
    pub fn remove_ordered(&mut self, ordered: &[CartLine]) {
        for done in ordered {
            let Some(pos) = self.lines.iter().position(|line| line.id == done.id) else {
                continue;
            };
            let line = &mut self.lines[pos];
            if line.quantity > done.quantity {
                line.quantity -= done.quantity;
            } else {
                self.lines.remove(pos);
            }
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn items(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    /// Bundle lines.
    pub fn special_offers(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| line.is_bundle)
    }

    /// Non-bundle lines.
    pub fn regular_items(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| !line.is_bundle)
    }

    /// Σ unit_price × quantity over every line.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Σ quantity over every line.
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

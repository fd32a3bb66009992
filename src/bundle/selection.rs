//! Bundle selection state machine.
//!
//! A selection moves `Empty -> Partial(k) -> Complete` as products are
//! toggled in, and back as they are toggled out. The ceiling is hard: once
//! complete, another product is refused until one is deselected.

use serde::Serialize;

use super::models::BundleOffer;
use crate::catalog::models::Product;

/// Where a selection stands relative to the offer's required quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "selected", rename_all = "camelCase")]
pub enum SelectionState {
    Empty,
    Partial(u32),
    Complete,
}

/// Result of a [`BundleSelection::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Refused: the selection already holds `required_quantity` products.
    Full,
    /// Refused: the product is not part of the offer's pool.
    NotEligible,
}

impl ToggleOutcome {
    pub fn is_refused(self) -> bool {
        matches!(self, Self::Full | Self::NotEligible)
    }
}

/// Products picked so far for one bundle offer.
#[derive(Debug, Clone)]
pub struct BundleSelection {
    offer_id: String,
    required_quantity: u32,
    pool: Vec<String>,
    selected: Vec<Product>,
}

impl BundleSelection {
    /// Starts an empty selection for `offer`.
    pub fn new(offer: &BundleOffer) -> Self {
        Self {
            offer_id: offer.id.clone(),
            required_quantity: offer.required_quantity,
            pool: offer
                .candidate_products
                .iter()
                .map(|p| p.id.clone())
                .collect(),
            selected: Vec::new(),
        }
    }

    /// Adds `product` if absent and there is room, removes it if present.
    pub fn toggle(&mut self, product: &Product) -> ToggleOutcome {
        if let Some(pos) = self.selected.iter().position(|p| p.id == product.id) {
            self.selected.remove(pos);
            return ToggleOutcome::Removed;
        }
        if !self.pool.iter().any(|id| *id == product.id) {
            return ToggleOutcome::NotEligible;
        }
        if self.len() >= self.required_quantity {
            return ToggleOutcome::Full;
        }
        self.selected.push(product.clone());
        ToggleOutcome::Added
    }

    pub fn reset(&mut self) {
        self.selected.clear();
    }

    pub fn state(&self) -> SelectionState {
        match self.len() {
            0 => SelectionState::Empty,
            n if n >= self.required_quantity => SelectionState::Complete,
            n => SelectionState::Partial(n),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.len() == self.required_quantity
    }

    pub fn len(&self) -> u32 {
        u32::try_from(self.selected.len()).unwrap_or(u32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// How many more products are needed.
    pub fn remaining(&self) -> u32 {
        self.required_quantity.saturating_sub(self.len())
    }

    pub fn offer_id(&self) -> &str {
        &self.offer_id
    }

    pub fn required_quantity(&self) -> u32 {
        self.required_quantity
    }

    /// Selected products in the order they were picked.
    pub fn selected(&self) -> &[Product] {
        &self.selected
    }
}

//! Gift Promotion Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::selector::Weighted;

/// How the customer ends up with a gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftMode {
    /// The customer picks one candidate.
    Choice,
    /// A weighted lottery picks one candidate.
    Random,
}

impl fmt::Display for GiftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice => f.write_str("choice"),
            Self::Random => f.write_str("random"),
        }
    }
}

/// A product that can be given away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCandidate {
    pub id: String,
    pub name: String,
    pub price: Decimal,

    /// Relative lottery weight; absent or zero means 100
    #[serde(default)]
    pub weight: Option<u32>,
}

impl Weighted for GiftCandidate {
    fn weight(&self) -> Option<u32> {
        self.weight
    }
}

/// A threshold-triggered free gift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GiftPromotion {
    pub id: String,

    /// Cart subtotal at which the gift unlocks
    pub minimum_amount: Decimal,

    pub mode: GiftMode,

    pub candidates: Vec<GiftCandidate>,
}

/// The gift attached to a cart, with the threshold it was won under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedGift {
    pub promotion_id: String,
    pub minimum_amount: Decimal,
    pub mode: GiftMode,
    pub candidate: GiftCandidate,
}

impl SelectedGift {
    /// Whether a cart with `subtotal` still qualifies for this gift.
    pub fn still_eligible(&self, subtotal: Decimal) -> bool {
        subtotal >= self.minimum_amount
    }
}

//! Gift Eligibility Engine
//!
//! Eligibility and progress are pure functions of the cart subtotal. In
//! `choice` mode the caller's pick is recorded as-is; in `random` mode one
//! authoritative weighted draw decides the gift, and any interim picks shown
//! while "spinning" are cosmetic.

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use super::models::{GiftCandidate, GiftMode, GiftPromotion, SelectedGift};
use super::reveal::{spawn_reveal, RevealConfig, RevealHandle, RevealPlan};
use crate::selector;

#[derive(Debug, Error, PartialEq)]
pub enum GiftError {
    #[error("gift promotion '{0}' has no candidates")]
    NoCandidates(String),

    #[error("gift promotion is in {actual} mode")]
    WrongMode { actual: GiftMode },

    #[error("'{0}' is not a gift candidate")]
    UnknownCandidate(String),
}

/// Evaluates one gift promotion.
#[derive(Debug, Clone)]
pub struct GiftEngine {
    promotion: GiftPromotion,
}

impl GiftEngine {
    /// Wraps `promotion`; a promotion without candidates is unusable.
    pub fn new(promotion: GiftPromotion) -> Result<Self, GiftError> {
        if promotion.candidates.is_empty() {
            return Err(GiftError::NoCandidates(promotion.id));
        }
        Ok(Self { promotion })
    }

    pub fn promotion(&self) -> &GiftPromotion {
        &self.promotion
    }

    pub fn mode(&self) -> GiftMode {
        self.promotion.mode
    }

    pub fn is_eligible(&self, subtotal: Decimal) -> bool {
        subtotal >= self.promotion.minimum_amount
    }

    /// `min(100, 100 * subtotal / minimum_amount)`, rounded to 2 places.
    pub fn progress_percent(&self, subtotal: Decimal) -> Decimal {
        let minimum = self.promotion.minimum_amount;
        if minimum <= Decimal::ZERO {
            return Decimal::ONE_HUNDRED;
        }
        (Decimal::ONE_HUNDRED * subtotal / minimum)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .round_dp(2)
    }

    /// Amount still missing to unlock the gift.
    pub fn remaining(&self, subtotal: Decimal) -> Decimal {
        (self.promotion.minimum_amount - subtotal).max(Decimal::ZERO)
    }

    /// Records the customer's explicit pick (`choice` mode).
    pub fn select_gift(&self, candidate_id: &str) -> Result<SelectedGift, GiftError> {
        self.require_mode(GiftMode::Choice)?;
        let candidate = self
            .promotion
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .ok_or_else(|| GiftError::UnknownCandidate(candidate_id.to_string()))?;
        Ok(self.selected(candidate.clone()))
    }

    /// The authoritative weighted draw (`random` mode).
    pub fn draw_final<R: Rng>(&self, rng: &mut R) -> Result<SelectedGift, GiftError> {
        self.require_mode(GiftMode::Random)?;
        let candidate = self.weighted_pick(rng)?;
        Ok(self.selected(candidate))
    }

    /// Interim cosmetic picks plus the authoritative final pick.
    pub fn plan_reveal<R: Rng>(&self, spins: u32, rng: &mut R) -> Result<RevealPlan, GiftError> {
        self.require_mode(GiftMode::Random)?;
        let candidates = &self.promotion.candidates;
        let interim = (0..spins)
            .filter_map(|_| candidates.get(rng.random_range(0..candidates.len())).cloned())
            .collect();
        let final_pick = self.weighted_pick(rng)?;
        Ok(RevealPlan {
            interim,
            final_pick: self.selected(final_pick),
        })
    }

    /// Plans a reveal and plays it on a background task, one pick per tick.
    ///
    /// Must be called inside a tokio runtime. The final pick is decided
    /// before the first tick and is available at once from the handle.
    pub fn start_random_reveal(&self, config: &RevealConfig) -> Result<RevealHandle, GiftError> {
        let plan = self.plan_reveal(config.spins, &mut rand::rng())?;
        tracing::debug!(
            promotion_id = %self.promotion.id,
            gift_id = %plan.final_pick.candidate.id,
            spins = plan.interim.len(),
            "starting gift reveal"
        );
        Ok(spawn_reveal(plan, config.tick()))
    }

    fn weighted_pick<R: Rng>(&self, rng: &mut R) -> Result<GiftCandidate, GiftError> {
        selector::select(&self.promotion.candidates, rng)
            .cloned()
            .ok_or_else(|| GiftError::NoCandidates(self.promotion.id.clone()))
    }

    fn require_mode(&self, expected: GiftMode) -> Result<(), GiftError> {
        if self.promotion.mode == expected {
            Ok(())
        } else {
            Err(GiftError::WrongMode {
                actual: self.promotion.mode,
            })
        }
    }

    fn selected(&self, candidate: GiftCandidate) -> SelectedGift {
        SelectedGift {
            promotion_id: self.promotion.id.clone(),
            minimum_amount: self.promotion.minimum_amount,
            mode: self.promotion.mode,
            candidate,
        }
    }
}

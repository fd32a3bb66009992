//! Weighted random selection.

use rand::Rng;

/// Weight used when a candidate has none, or zero.
pub const DEFAULT_WEIGHT: u32 = 100;

/// A candidate for a weighted draw.
pub trait Weighted {
    /// Raw weight as configured; `None` or `Some(0)` count as [`DEFAULT_WEIGHT`].
    fn weight(&self) -> Option<u32>;

    fn effective_weight(&self) -> u64 {
        match self.weight() {
            Some(w) if w > 0 => u64::from(w),
            _ => u64::from(DEFAULT_WEIGHT),
        }
    }
}

/// Draws one candidate with probability proportional to its weight.
///
/// Returns `None` only for an empty slice. A single candidate is returned
/// without touching `rng`. Candidates are walked in input order, so a seeded
/// `rng` gives reproducible draws.
pub fn select<'a, T, R>(candidates: &'a [T], rng: &mut R) -> Option<&'a T>
where
    T: Weighted,
    R: Rng,
{
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            let total: u64 = candidates.iter().map(Weighted::effective_weight).sum();
            let mut remainder = rng.random_range(0..total);
            for candidate in candidates {
                let weight = candidate.effective_weight();
                if remainder < weight {
                    return Some(candidate);
                }
                remainder -= weight;
            }
            candidates.last()
        }
    }
}

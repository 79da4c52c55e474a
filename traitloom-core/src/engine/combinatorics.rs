use crate::{
    collection::model::Layer,
    foundation::error::{TraitloomError, TraitloomResult},
};

/// Product of variant counts over enabled, non-empty layers.
///
/// Disabled and empty layers contribute a factor of 1; with no such layers the result is 1.
/// Saturates at `u128::MAX`.
pub fn total_combinations(layers: &[Layer]) -> u128 {
    layers
        .iter()
        .filter(|l| l.is_active())
        .fold(1u128, |acc, l| acc.saturating_mul(l.variants.len() as u128))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Result of clamping a requested batch size to the combinatorial ceiling.
pub struct BatchSizeCheck {
    /// What the user asked for.
    pub requested: usize,
    /// Total achievable combinations.
    pub ceiling: u128,
    /// The value to store: `min(requested, ceiling)`.
    pub accepted: usize,
}

impl BatchSizeCheck {
    pub fn new(requested: usize, ceiling: u128) -> Self {
        let accepted = if (requested as u128) > ceiling {
            ceiling as usize
        } else {
            requested
        };
        Self {
            requested,
            ceiling,
            accepted,
        }
    }

    pub fn was_clamped(&self) -> bool {
        self.accepted != self.requested
    }

    /// User-facing warning, present only when a clamp happened.
    pub fn warning(&self) -> Option<String> {
        self.was_clamped().then(|| too_many_message(self.requested, self.ceiling))
    }
}

fn too_many_message(requested: usize, ceiling: u128) -> String {
    format!(
        "You've requested {requested} NFTs but there are only {ceiling} possible unique combinations"
    )
}

/// Reject a batch request before any sampling starts.
pub fn ensure_batch_feasible(layers: &[Layer], requested: usize) -> TraitloomResult<u128> {
    if layers.is_empty() {
        return Err(TraitloomError::config("add at least one layer first"));
    }
    if !layers.iter().any(Layer::is_active) {
        return Err(TraitloomError::config(
            "no enabled layer has any variants to combine",
        ));
    }
    if requested == 0 {
        return Err(TraitloomError::config("batch size must be at least 1"));
    }
    let ceiling = total_combinations(layers);
    if (requested as u128) > ceiling {
        return Err(TraitloomError::config(too_many_message(requested, ceiling)));
    }
    Ok(ceiling)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/combinatorics.rs"]
mod tests;

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    collection::model::{Layer, MAX_RARITY},
    engine::combinatorics::ensure_batch_feasible,
    engine::selection::{Batch, CombinationKey, GeneratedItem, ItemId, LayerSelection},
    engine::space::CombinationSpace,
    foundation::core::CancelToken,
    foundation::error::{TraitloomError, TraitloomResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Tuning for [`Sampler::sample_batch`].
pub struct SamplerOptions {
    /// Consecutive key collisions tolerated before switching to exhaustive enumeration.
    pub retry_budget: usize,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self { retry_budget: 1_000 }
    }
}

/// Weighted, uniqueness-enforcing trait sampler.
#[derive(Clone, Debug)]
pub struct Sampler<R = ChaCha8Rng> {
    rng: R,
    opts: SamplerOptions,
}

impl Sampler<ChaCha8Rng> {
    /// Deterministic sampler: the same seed and collection yield the same batch.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            opts: SamplerOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: SamplerOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Roll the layer's inclusion. Layers at 100% never consume randomness.
    pub fn include_layer(&mut self, layer: &Layer) -> bool {
        if layer.rarity >= MAX_RARITY {
            return true;
        }
        self.rng.r#gen::<f64>() * 100.0 <= f64::from(layer.rarity)
    }

    /// Pick a variant index by cumulative weight; ties go to the earlier variant.
    ///
    /// Callers must pass a layer with at least one variant.
    pub fn select_variant(&mut self, layer: &Layer) -> usize {
        let total = layer.total_weight();
        let draw = self.rng.r#gen::<f64>() * f64::from(total);
        let mut cumulative = 0u32;
        for (i, v) in layer.variants.iter().enumerate() {
            cumulative += u32::from(v.rarity);
            if draw <= f64::from(cumulative) {
                return i;
            }
        }
        layer.variants.len().saturating_sub(1)
    }

    /// One sampling attempt over all layers, in array order.
    pub fn draw(&mut self, layers: &[Layer]) -> Vec<LayerSelection> {
        layers
            .iter()
            .map(|layer| {
                if !layer.is_active() || !self.include_layer(layer) {
                    LayerSelection::Skipped
                } else {
                    LayerSelection::Used(self.select_variant(layer))
                }
            })
            .collect()
    }

    /// Sample `requested` items with pairwise-distinct combination keys.
    ///
    /// Random draws are retried on collision. After `retry_budget` consecutive collisions the
    /// rest of the batch is filled by walking the reachable combination space in shuffled
    /// order, which always terminates.
    #[tracing::instrument(skip(self, layers, cancel))]
    pub fn sample_batch(
        &mut self,
        layers: &[Layer],
        requested: usize,
        cancel: &CancelToken,
    ) -> TraitloomResult<Batch> {
        let ceiling = ensure_batch_feasible(layers, requested)?;
        let space = CombinationSpace::reachable(layers);
        if (requested as u128) > space.size() {
            return Err(TraitloomError::exhausted(format!(
                "requested {requested} items but only {} of {ceiling} combinations can be drawn with the current weights",
                space.size()
            )));
        }

        let mut seen = HashSet::with_capacity(requested);
        let mut batch = Batch {
            items: Vec::with_capacity(requested),
            ..Batch::default()
        };
        let mut streak = 0usize;

        while batch.items.len() < requested {
            cancel.check()?;
            if streak >= self.opts.retry_budget {
                tracing::info!(
                    produced = batch.items.len(),
                    requested,
                    "collision budget spent; enumerating remaining combinations"
                );
                self.fill_exhaustively(&space, &mut seen, &mut batch, requested, cancel)?;
                break;
            }

            let selections = self.draw(layers);
            batch.stats.attempts += 1;
            if !seen.insert(CombinationKey::from_selections(&selections)) {
                batch.stats.collisions += 1;
                streak += 1;
                continue;
            }
            streak = 0;
            let id = ItemId(batch.items.len());
            batch.items.push(GeneratedItem { id, selections });
        }

        tracing::debug!(
            items = batch.items.len(),
            attempts = batch.stats.attempts,
            collisions = batch.stats.collisions,
            "batch sampled"
        );
        Ok(batch)
    }

    fn fill_exhaustively(
        &mut self,
        space: &CombinationSpace,
        seen: &mut HashSet<CombinationKey>,
        batch: &mut Batch,
        requested: usize,
        cancel: &CancelToken,
    ) -> TraitloomResult<()> {
        for index in space.shuffled_walk(&mut self.rng) {
            if batch.items.len() >= requested {
                return Ok(());
            }
            let selections = space.decode(index);
            if !seen.insert(CombinationKey::from_selections(&selections)) {
                continue;
            }
            cancel.check()?;
            let id = ItemId(batch.items.len());
            batch.items.push(GeneratedItem { id, selections });
            batch.stats.fallback_items += 1;
        }
        if batch.items.len() < requested {
            return Err(TraitloomError::exhausted(format!(
                "produced {} of {requested} unique items",
                batch.items.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/sampler.rs"]
mod tests;

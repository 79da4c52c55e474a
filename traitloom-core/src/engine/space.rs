use rand::Rng;

use crate::{
    collection::model::{Layer, MAX_RARITY},
    engine::selection::LayerSelection,
    foundation::math::{add_mod_u128, gcd_u128},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Mixed-radix enumeration of every selection vector the sampler can produce.
///
/// Per layer, the options are:
/// - inactive (disabled or empty) or 0% inclusion: `Skipped` only
/// - otherwise `Skipped` when inclusion is below 100%, then each variant with a non-zero
///   weight (or just the first variant when every weight is zero)
pub struct CombinationSpace {
    options: Vec<Vec<LayerSelection>>,
    size: u128,
}

impl CombinationSpace {
    pub fn reachable(layers: &[Layer]) -> Self {
        let options: Vec<Vec<LayerSelection>> = layers.iter().map(layer_options).collect();
        let size = options
            .iter()
            .fold(1u128, |acc, o| acc.saturating_mul(o.len() as u128));
        Self { options, size }
    }

    /// Number of distinct selection vectors (saturating).
    pub fn size(&self) -> u128 {
        self.size
    }

    /// Decode a linear index into one selection per layer. Layer 0 is the fastest digit.
    pub fn decode(&self, mut index: u128) -> Vec<LayerSelection> {
        let mut out = Vec::with_capacity(self.options.len());
        for opts in &self.options {
            let radix = opts.len() as u128;
            out.push(opts[(index % radix) as usize]);
            index /= radix;
        }
        out
    }

    /// Visit every index exactly once in a seeded pseudo-shuffled order.
    pub fn shuffled_walk<R: Rng + ?Sized>(&self, rng: &mut R) -> ShuffledWalk {
        ShuffledWalk::new(self.size, rng)
    }
}

fn layer_options(layer: &Layer) -> Vec<LayerSelection> {
    if !layer.is_active() || layer.rarity == 0 {
        return vec![LayerSelection::Skipped];
    }
    let mut opts = Vec::with_capacity(layer.variants.len() + 1);
    if layer.rarity < MAX_RARITY {
        opts.push(LayerSelection::Skipped);
    }
    if layer.total_weight() == 0 {
        opts.push(LayerSelection::Used(0));
    } else {
        opts.extend(
            layer
                .variants
                .iter()
                .enumerate()
                .filter(|(_, v)| v.rarity > 0)
                .map(|(i, _)| LayerSelection::Used(i)),
        );
    }
    opts
}

#[derive(Clone, Debug)]
/// Full-period affine permutation `start + k * stride (mod size)` with `gcd(stride, size) == 1`.
pub struct ShuffledWalk {
    size: u128,
    stride: u128,
    next: u128,
    remaining: u128,
}

impl ShuffledWalk {
    fn new<R: Rng + ?Sized>(size: u128, rng: &mut R) -> Self {
        if size <= 2 {
            return Self {
                size,
                stride: if size == 2 { 1 } else { 0 },
                next: if size == 0 { 0 } else { rng.gen_range(0..size) },
                remaining: size,
            };
        }
        let stride = loop {
            let s = rng.gen_range(1..size);
            if gcd_u128(s, size) == 1 {
                break s;
            }
        };
        Self {
            size,
            stride,
            next: rng.gen_range(0..size),
            remaining: size,
        }
    }
}

impl Iterator for ShuffledWalk {
    type Item = u128;

    fn next(&mut self) -> Option<u128> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let out = self.next;
        if self.size > 1 {
            self.next = add_mod_u128(self.next, self.stride, self.size);
        }
        Some(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/space.rs"]
mod tests;

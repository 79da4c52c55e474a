use crate::{
    assets::store::ImageKey,
    engine::combinatorics,
    foundation::core::Canvas,
    foundation::error::{TraitloomError, TraitloomResult},
};

/// Upper bound for variant weights and layer inclusion percentages.
pub const MAX_RARITY: u8 = 100;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
/// Stable layer identifier; survives renames and reordering.
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One selectable image option inside a layer.
pub struct Variant {
    /// Handle into the session's image store.
    pub image: ImageKey,
    /// User-facing trait value, written to the metadata table.
    pub name: String,
    /// Relative weight within the layer (0..=100).
    pub rarity: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// A trait category drawn at a fixed z-order.
pub struct Layer {
    /// Stable identifier.
    pub id: LayerId,
    /// Trait category name; becomes a metadata column header.
    pub name: String,
    /// Weighted variants. Order only matters for tie-breaking during sampling.
    pub variants: Vec<Variant>,
    /// Draw order; ascending is drawn first (bottom). Always equals the array position.
    pub z_order: u32,
    /// Disabled layers are excluded from counting, sampling and rendering.
    pub enabled: bool,
    /// Probability (0..=100) that a generated item includes this layer.
    pub rarity: u8,
}

impl Layer {
    /// Whether this layer participates in combination counting and sampling.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.variants.is_empty()
    }

    /// Sum of all variant weights.
    pub fn total_weight(&self) -> u32 {
        self.variants.iter().map(|v| u32::from(v.rarity)).sum()
    }

    fn reset_equal_split(&mut self) {
        if self.variants.is_empty() {
            return;
        }
        let equal = equal_split(self.variants.len());
        for v in &mut self.variants {
            v.rarity = equal;
        }
    }
}

/// `floor(100 / count)`; the default weight after any variant add/remove.
pub fn equal_split(count: usize) -> u8 {
    if count == 0 {
        return MAX_RARITY;
    }
    (usize::from(MAX_RARITY) / count) as u8
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Collection-level metadata and output configuration.
pub struct CollectionMeta {
    /// Collection name; also names the exported archive.
    pub name: String,
    /// Description written into every metadata row.
    pub description: String,
    /// Optional item name prefix for files and titles.
    pub item_prefix: String,
    /// Output raster size.
    pub canvas: Canvas,
    /// Requested number of items per batch.
    pub batch_size: usize,
    /// Fixed sampling seed; `None` draws one from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for CollectionMeta {
    fn default() -> Self {
        Self {
            name: "My collection".to_string(),
            description: String::new(),
            item_prefix: String::new(),
            canvas: Canvas::default(),
            batch_size: 100,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// The full mutable collection: ordered layers plus metadata.
///
/// Every mutator keeps two invariants:
/// - each layer's `z_order` equals its index in [`Collection::layers`]
/// - after a variant add/remove, the affected layer's weights are reset to an equal split
pub struct Collection {
    /// Collection metadata.
    pub meta: CollectionMeta,
    #[serde(default)]
    layers: Vec<Layer>,
    #[serde(default)]
    next_layer_id: u64,
}

impl Collection {
    pub fn new(meta: CollectionMeta) -> Self {
        Self {
            meta,
            layers: Vec::new(),
            next_layer_id: 0,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> TraitloomResult<&Layer> {
        self.layers
            .get(index)
            .ok_or_else(|| TraitloomError::validation(format!("no layer at index {index}")))
    }

    fn layer_mut(&mut self, index: usize) -> TraitloomResult<&mut Layer> {
        self.layers
            .get_mut(index)
            .ok_or_else(|| TraitloomError::validation(format!("no layer at index {index}")))
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Product of variant counts over enabled, non-empty layers.
    pub fn total_combinations(&self) -> u128 {
        combinatorics::total_combinations(&self.layers)
    }

    /// Append a new enabled layer drawn above all existing ones.
    pub fn add_layer(&mut self, name: &str) -> TraitloomResult<LayerId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TraitloomError::validation("layer name must be non-empty"));
        }
        let next = self
            .layers
            .iter()
            .map(|l| l.id.0 + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_layer_id);
        let id = LayerId(next);
        self.next_layer_id = next + 1;
        self.layers.push(Layer {
            id,
            name: name.to_string(),
            variants: Vec::new(),
            z_order: self.layers.len() as u32,
            enabled: true,
            rarity: MAX_RARITY,
        });
        Ok(id)
    }

    /// Remove a layer and all of its variants.
    pub fn remove_layer(&mut self, index: usize) -> TraitloomResult<Layer> {
        self.layer(index)?;
        let removed = self.layers.remove(index);
        self.renumber_z_order();
        Ok(removed)
    }

    /// Move the layer at `from` to position `to`, shifting the others.
    pub fn move_layer(&mut self, from: usize, to: usize) -> TraitloomResult<()> {
        self.layer(from)?;
        self.layer(to)?;
        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
        }
        self.renumber_z_order();
        Ok(())
    }

    /// Swap the layer at `a` with the layer at `b`.
    pub fn swap_layers(&mut self, a: usize, b: usize) -> TraitloomResult<()> {
        self.layer(a)?;
        self.layer(b)?;
        self.layers.swap(a, b);
        self.renumber_z_order();
        Ok(())
    }

    fn renumber_z_order(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.z_order = i as u32;
        }
    }

    pub fn set_layer_name(&mut self, index: usize, name: &str) -> TraitloomResult<()> {
        self.layer_mut(index)?.name = name.to_string();
        Ok(())
    }

    /// Set the layer inclusion probability, clamped to `0..=100`.
    pub fn set_layer_rarity(&mut self, index: usize, rarity: u32) -> TraitloomResult<()> {
        self.layer_mut(index)?.rarity = clamp_rarity(rarity);
        Ok(())
    }

    pub fn set_layer_enabled(&mut self, index: usize, enabled: bool) -> TraitloomResult<()> {
        self.layer_mut(index)?.enabled = enabled;
        Ok(())
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle_layer_enabled(&mut self, index: usize) -> TraitloomResult<bool> {
        let layer = self.layer_mut(index)?;
        layer.enabled = !layer.enabled;
        Ok(layer.enabled)
    }

    /// Append variants to a layer, then reset the layer to an equal split.
    pub fn add_variants(
        &mut self,
        index: usize,
        variants: impl IntoIterator<Item = (ImageKey, String)>,
    ) -> TraitloomResult<()> {
        let layer = self.layer_mut(index)?;
        let before = layer.variants.len();
        layer
            .variants
            .extend(variants.into_iter().map(|(image, name)| Variant {
                image,
                name,
                rarity: 0,
            }));
        if layer.variants.len() != before {
            layer.reset_equal_split();
        }
        Ok(())
    }

    /// Remove one variant, then reset the layer to an equal split.
    pub fn remove_variant(&mut self, index: usize, variant: usize) -> TraitloomResult<Variant> {
        let layer = self.layer_mut(index)?;
        if variant >= layer.variants.len() {
            return Err(TraitloomError::validation(format!(
                "layer '{}' has no variant at index {variant}",
                layer.name
            )));
        }
        let removed = layer.variants.remove(variant);
        layer.reset_equal_split();
        Ok(removed)
    }

    fn variant_mut(&mut self, index: usize, variant: usize) -> TraitloomResult<&mut Variant> {
        let layer = self.layer_mut(index)?;
        let name = layer.name.clone();
        layer.variants.get_mut(variant).ok_or_else(|| {
            TraitloomError::validation(format!("layer '{name}' has no variant at index {variant}"))
        })
    }

    /// Set one variant weight, clamped to `0..=100`. Kept until the next add/remove.
    pub fn set_variant_rarity(
        &mut self,
        index: usize,
        variant: usize,
        rarity: u32,
    ) -> TraitloomResult<()> {
        self.variant_mut(index, variant)?.rarity = clamp_rarity(rarity);
        Ok(())
    }

    pub fn set_variant_name(
        &mut self,
        index: usize,
        variant: usize,
        name: &str,
    ) -> TraitloomResult<()> {
        self.variant_mut(index, variant)?.name = name.to_string();
        Ok(())
    }

    /// Check invariants on values that did not come through the mutators (e.g. deserialized).
    pub fn validate(&self) -> TraitloomResult<()> {
        self.meta.canvas.validate()?;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.z_order as usize != i {
                return Err(TraitloomError::validation(format!(
                    "layer '{}' has z-order {} at position {i}",
                    layer.name, layer.z_order
                )));
            }
            if layer.rarity > MAX_RARITY {
                return Err(TraitloomError::validation(format!(
                    "layer '{}' rarity {} exceeds {MAX_RARITY}",
                    layer.name, layer.rarity
                )));
            }
            if let Some(v) = layer.variants.iter().find(|v| v.rarity > MAX_RARITY) {
                return Err(TraitloomError::validation(format!(
                    "variant '{}' in layer '{}' rarity {} exceeds {MAX_RARITY}",
                    v.name, layer.name, v.rarity
                )));
            }
        }
        let mut ids: Vec<LayerId> = self.layers.iter().map(|l| l.id).collect();
        ids.sort();
        ids.dedup();
        if ids.len() != self.layers.len() {
            return Err(TraitloomError::validation("layer ids must be unique"));
        }
        Ok(())
    }
}

fn clamp_rarity(v: u32) -> u8 {
    v.min(u32::from(MAX_RARITY)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/collection/model.rs"]
mod tests;

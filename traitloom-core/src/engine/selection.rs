use crate::collection::model::{Layer, Variant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Outcome of sampling one layer for one item.
pub enum LayerSelection {
    /// The layer is drawn with the variant at this index.
    Used(usize),
    /// The layer is absent: disabled, empty, or dropped by its inclusion roll.
    Skipped,
}

impl LayerSelection {
    pub fn variant_index(self) -> Option<usize> {
        match self {
            Self::Used(i) => Some(i),
            Self::Skipped => None,
        }
    }

    pub fn is_used(self) -> bool {
        matches!(self, Self::Used(_))
    }

    fn write_key_fragment(self, out: &mut String) {
        use std::fmt::Write as _;
        match self {
            Self::Used(i) => {
                let _ = write!(out, "{i}:");
            }
            Self::Skipped => out.push('-'),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Fingerprint of an item's per-layer selections; unique within a batch.
pub struct CombinationKey(String);

impl CombinationKey {
    pub fn from_selections(selections: &[LayerSelection]) -> Self {
        let mut s = String::with_capacity(selections.len() * 3);
        for sel in selections {
            sel.write_key_fragment(&mut s);
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
/// Position of an item inside its batch (0-based).
pub struct ItemId(pub usize);

impl ItemId {
    /// 1-based sequence number used in file names and titles.
    pub fn sequence(self) -> usize {
        self.0 + 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One sampled item: a selection per layer, by layer position.
pub struct GeneratedItem {
    pub id: ItemId,
    pub selections: Vec<LayerSelection>,
}

impl GeneratedItem {
    pub fn key(&self) -> CombinationKey {
        CombinationKey::from_selections(&self.selections)
    }

    pub fn selection(&self, layer_index: usize) -> LayerSelection {
        self.selections
            .get(layer_index)
            .copied()
            .unwrap_or(LayerSelection::Skipped)
    }

    /// Resolve the selected variant of `layers[layer_index]`, if any.
    ///
    /// Returns `None` for skipped layers and for indices that no longer resolve.
    pub fn variant<'a>(&self, layers: &'a [Layer], layer_index: usize) -> Option<&'a Variant> {
        let idx = self.selection(layer_index).variant_index()?;
        layers.get(layer_index)?.variants.get(idx)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Sampling counters for one batch.
pub struct SampleStats {
    /// Random draws attempted (accepted + collided).
    pub attempts: u64,
    /// Draws rejected because their key was already in the batch.
    pub collisions: u64,
    /// Items produced by the exhaustive fallback walk.
    pub fallback_items: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A batch of unique items in sampling order.
pub struct Batch {
    pub items: Vec<GeneratedItem>,
    pub stats: SampleStats,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&GeneratedItem> {
        self.items.get(id.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/selection.rs"]
mod tests;

use std::path::Path;

use anyhow::Context;

use crate::{
    collection::model::{CollectionMeta, MAX_RARITY},
    foundation::core::Canvas,
    foundation::error::{TraitloomError, TraitloomResult},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// On-disk JSON description of a collection.
///
/// Variant `source` paths are relative to the manifest's directory. Omitted fields take the
/// interactive defaults: file-stem names, equal-split weights, 100% layer inclusion.
pub struct CollectionManifest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub item_prefix: String,
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub layers: Vec<LayerManifest>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerManifest {
    pub name: String,
    #[serde(default = "default_rarity")]
    pub rarity: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub variants: Vec<VariantManifest>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantManifest {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u32>,
}

fn default_name() -> String {
    CollectionMeta::default().name
}

fn default_side() -> u32 {
    Canvas::default().width
}

fn default_batch_size() -> usize {
    CollectionMeta::default().batch_size
}

fn default_rarity() -> u32 {
    u32::from(MAX_RARITY)
}

fn default_enabled() -> bool {
    true
}

impl CollectionManifest {
    pub fn from_json_str(json: &str) -> TraitloomResult<Self> {
        serde_json::from_str(json).map_err(|e| TraitloomError::serde(e.to_string()))
    }

    pub fn from_path(path: &Path) -> TraitloomResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> TraitloomResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TraitloomError::serde(e.to_string()))
    }

    /// Collection metadata described by this manifest.
    pub fn meta(&self) -> TraitloomResult<CollectionMeta> {
        Ok(CollectionMeta {
            name: self.name.clone(),
            description: self.description.clone(),
            item_prefix: self.item_prefix.clone(),
            canvas: Canvas::new(self.width, self.height)?,
            batch_size: self.batch_size,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collection/manifest.rs"]
mod tests;

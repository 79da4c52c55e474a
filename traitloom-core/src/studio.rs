use std::path::Path;

use rand::Rng;

use crate::{
    archive::export::{ArchiveOutput, ArchiveSaver, Archiver, UnlockGate, ensure_unlocked},
    archive::metadata::item_file_name,
    archive::progress::Progress,
    assets::decode::encode_png,
    assets::store::{ImageStore, Upload, load_relative},
    collection::manifest::CollectionManifest,
    collection::model::{Collection, CollectionMeta, LayerId},
    engine::combinatorics::BatchSizeCheck,
    engine::sampler::Sampler,
    engine::selection::{Batch, GeneratedItem, ItemId},
    foundation::core::{CancelToken, Canvas, Raster},
    foundation::error::{TraitloomError, TraitloomResult},
    render::compositor::{Compositor, OverviewMode},
};

/// One editing session: the collection, its uploaded images, and the latest preview batch.
///
/// Structural edits (adding, removing, or reordering layers and variants) discard the
/// preview batch, since its selections are positional. Renames and weight edits keep it.
#[derive(Debug)]
pub struct Studio {
    collection: Collection,
    images: ImageStore,
    compositor: Compositor,
    active_layer: usize,
    batch: Option<Batch>,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(CollectionMeta::default())
    }
}

impl Studio {
    pub fn new(meta: CollectionMeta) -> Self {
        let compositor = Compositor::new(meta.canvas);
        Self {
            collection: Collection::new(meta),
            images: ImageStore::new(),
            compositor,
            active_layer: 0,
            batch: None,
        }
    }

    /// Build a session from a manifest, loading variant files relative to `root`.
    #[tracing::instrument(skip(manifest), fields(layers = manifest.layers.len()))]
    pub fn from_manifest(manifest: &CollectionManifest, root: &Path) -> TraitloomResult<Self> {
        let mut studio = Self::new(manifest.meta()?);
        for layer in &manifest.layers {
            studio.add_layer(&layer.name)?;
            let index = studio.active_layer;

            let uploads = layer
                .variants
                .iter()
                .map(|v| load_relative(root, &v.source))
                .collect::<TraitloomResult<Vec<_>>>()?;
            studio.upload_variants(index, uploads)?;

            for (vi, v) in layer.variants.iter().enumerate() {
                if let Some(name) = &v.name {
                    studio.collection.set_variant_name(index, vi, name)?;
                }
                if let Some(rarity) = v.rarity {
                    studio.collection.set_variant_rarity(index, vi, rarity)?;
                }
            }
            studio.collection.set_layer_rarity(index, layer.rarity)?;
            studio.collection.set_layer_enabled(index, layer.enabled)?;
        }
        studio.active_layer = 0;

        let check = studio.set_batch_size(manifest.batch_size);
        tracing::debug!(
            batch_size = check.accepted,
            combinations = %check.ceiling,
            "manifest loaded"
        );
        Ok(studio)
    }

    /// Read a JSON manifest from disk; variant paths resolve against its directory.
    pub fn open(manifest_path: &Path) -> TraitloomResult<Self> {
        let manifest = CollectionManifest::from_path(manifest_path)?;
        let root = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(&manifest, root)
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn meta(&self) -> &CollectionMeta {
        &self.collection.meta
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn active_layer(&self) -> usize {
        self.active_layer
    }

    /// Latest preview batch, if one was generated since the last structural edit.
    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    pub fn total_combinations(&self) -> u128 {
        self.collection.total_combinations()
    }

    // Collection metadata.

    pub fn set_name(&mut self, name: &str) {
        self.collection.meta.name = name.to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.collection.meta.description = description.to_string();
    }

    pub fn set_item_prefix(&mut self, prefix: &str) {
        self.collection.meta.item_prefix = prefix.to_string();
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.collection.meta.seed = seed;
    }

    pub fn set_canvas(&mut self, width: u32, height: u32) -> TraitloomResult<()> {
        let canvas = Canvas::new(width, height)?;
        self.collection.meta.canvas = canvas;
        self.compositor.set_canvas(canvas);
        Ok(())
    }

    /// Store a batch size, clamped to the current number of combinations.
    pub fn set_batch_size(&mut self, requested: usize) -> BatchSizeCheck {
        let check = BatchSizeCheck::new(requested, self.total_combinations());
        if let Some(warning) = check.warning() {
            tracing::warn!(accepted = check.accepted, "{warning}");
        }
        self.collection.meta.batch_size = check.accepted;
        check
    }

    // Layers.

    /// Append a layer and make it the active one.
    pub fn add_layer(&mut self, name: &str) -> TraitloomResult<LayerId> {
        let id = self.collection.add_layer(name)?;
        self.active_layer = self.collection.layers().len() - 1;
        self.invalidate_previews();
        Ok(id)
    }

    pub fn remove_layer(&mut self, index: usize) -> TraitloomResult<()> {
        self.collection.remove_layer(index)?;
        self.active_layer = self
            .active_layer
            .min(self.collection.layers().len().saturating_sub(1));
        self.prune_images();
        self.invalidate_previews();
        Ok(())
    }

    pub fn select_layer(&mut self, index: usize) -> TraitloomResult<()> {
        self.collection.layer(index)?;
        self.active_layer = index;
        Ok(())
    }

    /// Move a layer to `to`. The active selection follows the layer it pointed at.
    pub fn move_layer(&mut self, from: usize, to: usize) -> TraitloomResult<()> {
        self.collection.move_layer(from, to)?;
        self.active_layer = follow_move(self.active_layer, from, to);
        if from != to {
            self.invalidate_previews();
        }
        Ok(())
    }

    /// Exchange two layers' positions. The active selection follows its layer.
    pub fn swap_layers(&mut self, a: usize, b: usize) -> TraitloomResult<()> {
        self.collection.swap_layers(a, b)?;
        if self.active_layer == a {
            self.active_layer = b;
        } else if self.active_layer == b {
            self.active_layer = a;
        }
        if a != b {
            self.invalidate_previews();
        }
        Ok(())
    }

    /// Draw the layer one step higher. No-op for the topmost layer.
    pub fn move_layer_up(&mut self, index: usize) -> TraitloomResult<()> {
        let len = self.collection.layers().len();
        self.collection.layer(index)?;
        if index + 1 < len {
            self.move_layer(index, index + 1)?;
        }
        Ok(())
    }

    /// Draw the layer one step lower. No-op for the bottom layer.
    pub fn move_layer_down(&mut self, index: usize) -> TraitloomResult<()> {
        self.collection.layer(index)?;
        if index > 0 {
            self.move_layer(index, index - 1)?;
        }
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> TraitloomResult<()> {
        self.collection.set_layer_name(index, name)
    }

    pub fn set_layer_rarity(&mut self, index: usize, rarity: u32) -> TraitloomResult<()> {
        self.collection.set_layer_rarity(index, rarity)
    }

    pub fn toggle_layer_enabled(&mut self, index: usize) -> TraitloomResult<bool> {
        let enabled = self.collection.toggle_layer_enabled(index)?;
        self.invalidate_previews();
        Ok(enabled)
    }

    // Variants.

    /// Register uploads and append them as variants of one layer.
    ///
    /// Rejected files (non-PNG) abort the whole call before the layer changes.
    pub fn upload_variants(
        &mut self,
        layer: usize,
        uploads: Vec<Upload>,
    ) -> TraitloomResult<usize> {
        self.collection.layer(layer)?;
        let registered = uploads
            .iter()
            .map(|u| -> TraitloomResult<_> { Ok((self.images.register(u)?, u.display_name())) })
            .collect::<TraitloomResult<Vec<_>>>();
        let variants = match registered {
            Ok(variants) => variants,
            Err(err) => {
                self.prune_images();
                return Err(err);
            }
        };
        let added = variants.len();
        self.collection.add_variants(layer, variants)?;
        if added > 0 {
            self.invalidate_previews();
        }
        Ok(added)
    }

    pub fn remove_variant(&mut self, layer: usize, variant: usize) -> TraitloomResult<()> {
        self.collection.remove_variant(layer, variant)?;
        self.prune_images();
        self.invalidate_previews();
        Ok(())
    }

    pub fn rename_variant(
        &mut self,
        layer: usize,
        variant: usize,
        name: &str,
    ) -> TraitloomResult<()> {
        self.collection.set_variant_name(layer, variant, name)
    }

    pub fn set_variant_rarity(
        &mut self,
        layer: usize,
        variant: usize,
        rarity: u32,
    ) -> TraitloomResult<()> {
        self.collection.set_variant_rarity(layer, variant, rarity)
    }

    // Generation and rendering.

    /// Sample a fresh preview batch using the collection seed, or entropy when unset.
    pub fn generate_previews(&mut self, cancel: &CancelToken) -> TraitloomResult<&Batch> {
        match self.collection.meta.seed {
            Some(seed) => self.generate_previews_with(&mut Sampler::seeded(seed), cancel),
            None => self.generate_previews_with(&mut Sampler::from_entropy(), cancel),
        }
    }

    /// Sample a fresh preview batch of the stored batch size, replacing the previous one.
    pub fn generate_previews_with<R: Rng>(
        &mut self,
        sampler: &mut Sampler<R>,
        cancel: &CancelToken,
    ) -> TraitloomResult<&Batch> {
        let batch = sampler.sample_batch(
            self.collection.layers(),
            self.collection.meta.batch_size,
            cancel,
        )?;
        let batch = self.batch.insert(batch);
        Ok(&*batch)
    }

    /// Composite one preview item.
    pub fn render_item(&mut self, id: ItemId) -> TraitloomResult<Raster> {
        let item = preview_item(self.batch.as_ref(), id)?;
        self.compositor.set_canvas(self.collection.meta.canvas);
        Ok(self
            .compositor
            .render(self.collection.layers(), item, &self.images)
            .clone())
    }

    /// Single-item PNG download: `(file name, bytes)`.
    pub fn export_item_png(&mut self, id: ItemId) -> TraitloomResult<(String, Vec<u8>)> {
        let sequence = preview_item(self.batch.as_ref(), id)?.id.sequence();
        let raster = self.render_item(id)?;
        let file_name = item_file_name(&self.collection.meta.item_prefix, sequence);
        Ok((file_name, encode_png(&raster)?))
    }

    /// Overview canvas: every layer's first variant, or only the active layer's.
    pub fn render_overview(&mut self, show_all: bool) -> Raster {
        let mode = if show_all {
            OverviewMode::AllLayers
        } else {
            OverviewMode::Layer(self.active_layer)
        };
        self.compositor.set_canvas(self.collection.meta.canvas);
        self.compositor
            .render_overview(self.collection.layers(), mode, &self.images)
            .clone()
    }

    // Archiving.

    /// Build the full archive for the preview batch and hand it to `saver`.
    ///
    /// The gate is consulted first; a closed gate gets one unlock request and otherwise fails
    /// with [`TraitloomError::Locked`] before any rendering happens.
    #[tracing::instrument(skip_all)]
    pub fn download_archive(
        &mut self,
        gate: &mut dyn UnlockGate,
        saver: &mut dyn ArchiveSaver,
        progress: impl FnMut(Progress),
        cancel: &CancelToken,
    ) -> TraitloomResult<ArchiveOutput> {
        ensure_unlocked(gate)?;
        let batch = self
            .batch
            .as_ref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| TraitloomError::config("generate previews before downloading"))?;

        let output = Archiver::new(&self.collection, &self.images)
            .with_cancel(cancel.clone())
            .build(&mut self.compositor, &batch.items, progress)?;
        saver.save(&output.file_name, &output.bytes)?;
        tracing::info!(file = %output.file_name, "archive saved");
        Ok(output)
    }

    fn invalidate_previews(&mut self) {
        if self.batch.take().is_some() {
            tracing::debug!("preview batch discarded after structural edit");
        }
    }

    fn prune_images(&mut self) {
        let live: Vec<_> = self
            .collection
            .layers()
            .iter()
            .flat_map(|l| l.variants.iter().map(|v| v.image.clone()))
            .collect();
        self.images.retain_keys(&live);
        self.compositor.clear_cache();
    }
}

fn preview_item(batch: Option<&Batch>, id: ItemId) -> TraitloomResult<&GeneratedItem> {
    batch
        .and_then(|b| b.get(id))
        .ok_or_else(|| TraitloomError::validation(format!("no preview item #{}", id.sequence())))
}

fn follow_move(active: usize, from: usize, to: usize) -> usize {
    if active == from {
        to
    } else if from < active && active <= to {
        active - 1
    } else if to <= active && active < from {
        active + 1
    } else {
        active
    }
}

#[cfg(test)]
#[path = "../tests/unit/studio.rs"]
mod tests;

use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    assets::decode::{self, PreparedImage},
    assets::store::{ImageKey, ImageStore},
    collection::model::Layer,
    engine::selection::GeneratedItem,
    foundation::core::{Canvas, Raster},
    render::composite::over_in_place,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// One image to draw, resolved from a layer and its selected variant.
pub struct DrawEntry<'a> {
    pub layer_index: usize,
    pub z_order: u32,
    pub layer_name: &'a str,
    pub variant_name: &'a str,
    pub image: &'a ImageKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What the collection overview canvas shows.
pub enum OverviewMode {
    /// First variant of every enabled layer, stacked in z-order.
    AllLayers,
    /// First variant of one layer only.
    Layer(usize),
}

/// Build the z-sorted draw list for one item.
///
/// Only layers that are enabled now, selected for this item, and whose variant index still
/// resolves are drawn. The sort is stable, so equal z-orders keep array order.
pub fn draw_queue<'a>(layers: &'a [Layer], item: &GeneratedItem) -> Vec<DrawEntry<'a>> {
    let mut queue: Vec<DrawEntry<'a>> = layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.enabled)
        .filter_map(|(i, layer)| {
            let variant = item.variant(layers, i)?;
            Some(DrawEntry {
                layer_index: i,
                z_order: layer.z_order,
                layer_name: &layer.name,
                variant_name: &variant.name,
                image: &variant.image,
            })
        })
        .collect();
    queue.sort_by_key(|e| e.z_order);
    queue
}

fn first_variant_entry(layer_index: usize, layer: &Layer) -> Option<DrawEntry<'_>> {
    layer.variants.first().map(|v| DrawEntry {
        layer_index,
        z_order: layer.z_order,
        layer_name: &layer.name,
        variant_name: &v.name,
        image: &v.image,
    })
}

fn overview_queue(layers: &[Layer], mode: OverviewMode) -> Vec<DrawEntry<'_>> {
    let mut queue: Vec<DrawEntry<'_>> = match mode {
        OverviewMode::AllLayers => layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.enabled)
            .filter_map(|(i, l)| first_variant_entry(i, l))
            .collect(),
        OverviewMode::Layer(i) => layers
            .get(i)
            .and_then(|l| first_variant_entry(i, l))
            .into_iter()
            .collect(),
    };
    queue.sort_by_key(|e| e.z_order);
    queue
}

/// Flattens selected variant images onto one reusable canvas.
///
/// Decoded, canvas-sized images are cached per [`ImageKey`]; failed decodes are cached too,
/// so each broken image is reported once and then skipped.
#[derive(Debug)]
pub struct Compositor {
    surface: Raster,
    cache: HashMap<ImageKey, Option<PreparedImage>>,
}

impl Compositor {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            surface: Raster::transparent(canvas),
            cache: HashMap::new(),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.surface.canvas()
    }

    /// Change the output size. Cached images are dropped when the size changes.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        if canvas != self.canvas() {
            self.cache.clear();
            self.surface.clear(canvas);
        }
    }

    /// Forget cached decodes (e.g. after variants were replaced).
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Render one item. The returned raster is overwritten by the next render.
    pub fn render(
        &mut self,
        layers: &[Layer],
        item: &GeneratedItem,
        images: &ImageStore,
    ) -> &Raster {
        let queue = draw_queue(layers, item);
        self.compose(&queue, images);
        &self.surface
    }

    /// Render the collection overview canvas.
    pub fn render_overview(
        &mut self,
        layers: &[Layer],
        mode: OverviewMode,
        images: &ImageStore,
    ) -> &Raster {
        let queue = overview_queue(layers, mode);
        self.compose(&queue, images);
        &self.surface
    }

    fn compose(&mut self, queue: &[DrawEntry<'_>], images: &ImageStore) {
        self.prepare(queue, images);

        let canvas = self.canvas();
        self.surface.clear(canvas);
        for entry in queue {
            let Some(Some(img)) = self.cache.get(entry.image) else {
                tracing::debug!(
                    layer = entry.layer_name,
                    variant = entry.variant_name,
                    "skipping layer without a usable image"
                );
                continue;
            };
            if let Err(err) = over_in_place(&mut self.surface.data, &img.rgba8_premul) {
                tracing::warn!(layer = entry.layer_name, error = %err, "skipping layer");
            }
        }
    }

    /// Decode every not-yet-cached image of `queue` in parallel.
    fn prepare(&mut self, queue: &[DrawEntry<'_>], images: &ImageStore) {
        let mut missing: Vec<&DrawEntry<'_>> = Vec::new();
        for entry in queue {
            if !self.cache.contains_key(entry.image)
                && !missing.iter().any(|m| m.image == entry.image)
            {
                missing.push(entry);
            }
        }
        if missing.is_empty() {
            return;
        }

        let canvas = self.canvas();
        let decoded: Vec<(ImageKey, Option<PreparedImage>)> = missing
            .par_iter()
            .map(|entry| {
                let prepared = match images.get(entry.image) {
                    None => {
                        tracing::warn!(
                            layer = entry.layer_name,
                            variant = entry.variant_name,
                            image = %entry.image,
                            "image missing from store"
                        );
                        None
                    }
                    Some(bytes) => match decode::decode_to_canvas(&bytes, canvas) {
                        Ok(img) => Some(img),
                        Err(err) => {
                            tracing::warn!(
                                layer = entry.layer_name,
                                variant = entry.variant_name,
                                error = %err,
                                "failed to load layer image"
                            );
                            None
                        }
                    },
                };
                (entry.image.clone(), prepared)
            })
            .collect();
        self.cache.extend(decoded);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

//! Traitloom is a generative trait-layer engine for image collections.
//!
//! A collection is an ordered stack of [`Layer`]s, each holding weighted [`Variant`] images.
//! Traitloom samples unique trait combinations from that stack, flattens each combination into
//! one raster, and packages a whole batch as a zip archive with a metadata table.
//!
//! # Pipeline overview
//!
//! 1. **Model**: edit a [`Collection`] (usually through a [`Studio`] session)
//! 2. **Sample**: [`Sampler::sample_batch`] draws a [`Batch`] of pairwise-distinct items
//! 3. **Composite**: [`Compositor`] layers the selected variants in ascending z-order
//! 4. **Archive**: [`Archiver`] renders every item into `nfts/` and writes `metadata.csv`
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Reproducible**: a fixed seed and collection always yield the same batch.
//! - **Termination**: sampling either fills the batch or fails up front; it never spins.
//! - **Premultiplied RGBA8** inside the compositor; PNG output is straight alpha.
#![forbid(unsafe_code)]

mod foundation {
    pub(crate) mod core;
    pub(crate) mod error;
    pub(crate) mod math;
}

mod assets {
    pub(crate) mod decode;
    pub(crate) mod store;
}

mod collection {
    pub(crate) mod manifest;
    pub(crate) mod model;
}

mod engine {
    pub(crate) mod combinatorics;
    pub(crate) mod sampler;
    pub(crate) mod selection;
    pub(crate) mod space;
}

mod render {
    pub(crate) mod composite;
    pub(crate) mod compositor;
}

mod archive {
    pub(crate) mod export;
    pub(crate) mod metadata;
    pub(crate) mod progress;
    pub(crate) mod writer;
}

mod studio;

pub use archive::export::{
    ArchiveOutput, ArchiveSaver, ArchiveStats, Archiver, DEFAULT_ARCHIVE_STEM, DirSaver,
    MemorySaver, PngEncoder, RasterEncoder, StaticGate, UnlockGate, archive_file_name,
    ensure_unlocked,
};
pub use archive::metadata::{
    DEFAULT_DESCRIPTION, IMAGE_DIR, METADATA_FILE, MetadataTable, NONE_CELL, item_file_name,
    item_title,
};
pub use archive::progress::{Progress, ProgressPhase};
pub use archive::writer::{StagedImage, write_zip};
pub use assets::decode::{PreparedImage, decode_to_canvas, encode_png, is_png};
pub use assets::store::{
    ImageKey, ImageStore, MAX_UPLOAD_BYTES_HINT, Upload, load_relative, normalize_rel_path,
};
pub use collection::manifest::{CollectionManifest, LayerManifest, VariantManifest};
pub use collection::model::{
    Collection, CollectionMeta, Layer, LayerId, MAX_RARITY, Variant, equal_split,
};
pub use engine::combinatorics::{BatchSizeCheck, ensure_batch_feasible, total_combinations};
pub use engine::sampler::{Sampler, SamplerOptions};
pub use engine::selection::{
    Batch, CombinationKey, GeneratedItem, ItemId, LayerSelection, SampleStats,
};
pub use engine::space::{CombinationSpace, ShuffledWalk};
pub use foundation::core::{CancelToken, Canvas, Raster};
pub use foundation::error::{TraitloomError, TraitloomResult};
pub use render::compositor::{Compositor, DrawEntry, OverviewMode, draw_queue};
pub use studio::Studio;

/// Re-exported so callers can pick an archive compression method.
pub use zip::CompressionMethod;

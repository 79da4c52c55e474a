use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::CompressionMethod;

use crate::{
    archive::metadata::{MetadataTable, item_file_name},
    archive::progress::{Progress, ProgressPhase},
    archive::writer::{StagedImage, write_zip},
    assets::decode,
    assets::store::ImageStore,
    collection::model::Collection,
    engine::selection::GeneratedItem,
    foundation::core::{CancelToken, Raster},
    foundation::error::{TraitloomError, TraitloomResult},
    render::compositor::Compositor,
};

/// Archive stem used when the collection name is empty.
pub const DEFAULT_ARCHIVE_STEM: &str = "nft-collection";

/// `<name>.zip` with every non-ASCII-alphanumeric character replaced by `_`, lower-cased.
pub fn archive_file_name(collection_name: &str) -> String {
    let stem: String = collection_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        format!("{DEFAULT_ARCHIVE_STEM}.zip")
    } else {
        format!("{stem}.zip")
    }
}

/// Turns a rendered raster into file bytes.
pub trait RasterEncoder {
    fn encode(&self, raster: &Raster) -> TraitloomResult<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Straight-alpha PNG encoder.
pub struct PngEncoder;

impl RasterEncoder for PngEncoder {
    fn encode(&self, raster: &Raster) -> TraitloomResult<Vec<u8>> {
        decode::encode_png(raster)
    }
}

static PNG: PngEncoder = PngEncoder;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Counters for one archive export.
pub struct ArchiveStats {
    /// Items processed (equals metadata rows).
    pub items: usize,
    /// Item images written to the archive.
    pub images_written: usize,
    /// Items whose image failed to encode and is absent from the archive.
    pub images_skipped: usize,
}

#[derive(Clone, Debug)]
/// A finished archive ready to be handed to an [`ArchiveSaver`].
pub struct ArchiveOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub table: MetadataTable,
    pub stats: ArchiveStats,
}

/// Renders a batch item by item and packs images plus metadata into a zip archive.
pub struct Archiver<'a> {
    collection: &'a Collection,
    images: &'a ImageStore,
    encoder: &'a dyn RasterEncoder,
    compression: CompressionMethod,
    cancel: CancelToken,
}

impl<'a> Archiver<'a> {
    pub fn new(collection: &'a Collection, images: &'a ImageStore) -> Self {
        Self {
            collection,
            images,
            encoder: &PNG,
            compression: CompressionMethod::Deflated,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_encoder(mut self, encoder: &'a dyn RasterEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build the archive for `items`, in order.
    ///
    /// Items are rendered sequentially on `compositor`. An item whose image fails to encode is
    /// left out of the image folder but still gets its metadata row.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn build(
        &self,
        compositor: &mut Compositor,
        items: &[GeneratedItem],
        mut progress: impl FnMut(Progress),
    ) -> TraitloomResult<ArchiveOutput> {
        let meta = &self.collection.meta;
        let layers = self.collection.layers();
        compositor.set_canvas(meta.canvas);

        let mut table = MetadataTable::new(layers);
        let mut staged = Vec::with_capacity(items.len());
        let mut stats = ArchiveStats::default();

        progress(Progress::new(ProgressPhase::Rendering, 0, items.len()));
        for (i, item) in items.iter().enumerate() {
            self.cancel.check()?;
            let file_name = item_file_name(&meta.item_prefix, item.id.sequence());
            let raster = compositor.render(layers, item, self.images);
            match self.encoder.encode(raster) {
                Ok(bytes) => {
                    staged.push(StagedImage { file_name, bytes });
                    stats.images_written += 1;
                }
                Err(err) => {
                    tracing::warn!(file = %file_name, error = %err, "item image skipped");
                    stats.images_skipped += 1;
                }
            }
            table.push_item(meta, layers, item);
            stats.items += 1;
            progress(Progress::new(ProgressPhase::Rendering, i + 1, items.len()));
        }

        let bytes = write_zip(
            &staged,
            &table,
            self.compression,
            &mut progress,
            &self.cancel,
        )?;
        tracing::info!(
            items = stats.items,
            written = stats.images_written,
            skipped = stats.images_skipped,
            bytes = bytes.len(),
            "archive built"
        );

        Ok(ArchiveOutput {
            file_name: archive_file_name(&meta.name),
            bytes,
            table,
            stats,
        })
    }
}

/// Authorization signal that must be open before an archive may be saved.
pub trait UnlockGate {
    fn is_unlocked(&self) -> bool;

    /// Ask the external authority to unlock (e.g. start a payment flow).
    fn request_unlock(&mut self) -> TraitloomResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Gate with a fixed answer; optionally grants on the first request.
pub struct StaticGate {
    unlocked: bool,
    grant_on_request: bool,
}

impl StaticGate {
    pub fn unlocked() -> Self {
        Self {
            unlocked: true,
            grant_on_request: true,
        }
    }

    pub fn locked() -> Self {
        Self::default()
    }

    /// Locked until `request_unlock` is called once.
    pub fn granting() -> Self {
        Self {
            unlocked: false,
            grant_on_request: true,
        }
    }
}

impl UnlockGate for StaticGate {
    fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    fn request_unlock(&mut self) -> TraitloomResult<()> {
        if self.grant_on_request {
            self.unlocked = true;
        }
        Ok(())
    }
}

/// Check the gate, requesting authorization once if it is closed.
pub fn ensure_unlocked(gate: &mut dyn UnlockGate) -> TraitloomResult<()> {
    if gate.is_unlocked() {
        return Ok(());
    }
    tracing::info!("archive download requires authorization; requesting unlock");
    gate.request_unlock()?;
    if gate.is_unlocked() {
        Ok(())
    } else {
        Err(TraitloomError::Locked)
    }
}

/// Destination for finished archives.
pub trait ArchiveSaver {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TraitloomResult<()>;
}

#[derive(Clone, Debug)]
/// Writes archives into a directory, creating it when needed.
pub struct DirSaver {
    dir: PathBuf,
}

impl DirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArchiveSaver for DirSaver {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TraitloomResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))
            .map_err(|e| TraitloomError::archive(format!("{e:#}")))?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("write archive '{}'", path.display()))
            .map_err(|e| TraitloomError::archive(format!("{e:#}")))?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
/// Keeps the last saved archive in memory.
pub struct MemorySaver {
    pub saved: Option<(String, Vec<u8>)>,
}

impl ArchiveSaver for MemorySaver {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TraitloomResult<()> {
        self.saved = Some((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/archive/export.rs"]
mod tests;

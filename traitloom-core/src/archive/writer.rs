use std::io::{Cursor, Write};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    archive::metadata::{IMAGE_DIR, METADATA_FILE, MetadataTable},
    archive::progress::{Progress, ProgressPhase},
    foundation::core::CancelToken,
    foundation::error::{TraitloomError, TraitloomResult},
};

#[derive(Clone, Debug)]
/// An encoded item image waiting to be compressed.
pub struct StagedImage {
    /// File name inside [`IMAGE_DIR`].
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Compress staged images plus the metadata table into one zip archive.
///
/// Progress is reported once per entry written, finishing at exactly 100.
pub fn write_zip(
    images: &[StagedImage],
    table: &MetadataTable,
    compression: CompressionMethod,
    progress: &mut dyn FnMut(Progress),
    cancel: &CancelToken,
) -> TraitloomResult<Vec<u8>> {
    let opts = SimpleFileOptions::default().compression_method(compression);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_directory(format!("{IMAGE_DIR}/"), opts)?;

    let total_entries = images.len() + 1;
    progress(Progress::new(ProgressPhase::Compressing, 0, total_entries));
    for (i, image) in images.iter().enumerate() {
        cancel.check()?;
        let name = format!("{IMAGE_DIR}/{}", image.file_name);
        zip.start_file(name.as_str(), opts)?;
        zip.write_all(&image.bytes)
            .map_err(|e| TraitloomError::archive(format!("write '{name}': {e}")))?;
        progress(Progress::new(ProgressPhase::Compressing, i + 1, total_entries));
    }

    zip.start_file(METADATA_FILE, opts)?;
    zip.write_all(table.to_csv().as_bytes())
        .map_err(|e| TraitloomError::archive(format!("write '{METADATA_FILE}': {e}")))?;
    let bytes = zip.finish()?.into_inner();
    progress(Progress::new(
        ProgressPhase::Compressing,
        total_entries,
        total_entries,
    ));
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/archive/writer.rs"]
mod tests;

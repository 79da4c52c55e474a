use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::decode,
    foundation::error::{TraitloomError, TraitloomResult},
    foundation::math::Fnv1a64,
};

/// Uploads above this size are accepted but logged; the engine does not enforce it.
pub const MAX_UPLOAD_BYTES_HINT: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Opaque handle to encoded image bytes held by an [`ImageStore`].
pub struct ImageKey(String);

impl ImageKey {
    /// Content-derived key, so identical uploads share storage.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        let mut h = Fnv1a64::new();
        h.update(&(bytes.len() as u64).to_le_bytes());
        h.update(bytes);
        Self(format!("img-{:016x}", h.digest()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
/// One user-supplied image file.
pub struct Upload {
    /// Original file name, including extension.
    pub file_name: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping its file name.
    pub fn from_path(path: &Path) -> TraitloomResult<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                TraitloomError::validation(format!("'{}' has no file name", path.display()))
            })?;
        Ok(Self { file_name, bytes })
    }

    /// Display name derived from the file name: everything before the first `.`.
    pub fn display_name(&self) -> String {
        self.file_name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Clone, Debug, Default)]
/// In-memory registry of encoded variant images.
pub struct ImageStore {
    images: HashMap<ImageKey, Arc<Vec<u8>>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an upload and return its handle. Only PNG is accepted.
    pub fn register(&mut self, upload: &Upload) -> TraitloomResult<ImageKey> {
        if !decode::is_png(&upload.bytes) {
            return Err(TraitloomError::validation(format!(
                "'{}' is not a PNG image",
                upload.file_name
            )));
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES_HINT {
            tracing::warn!(
                file = %upload.file_name,
                bytes = upload.bytes.len(),
                "upload exceeds the recommended size"
            );
        }
        Ok(self.insert_bytes(upload.bytes.clone()))
    }

    /// Store raw bytes without format checks.
    pub fn insert_bytes(&mut self, bytes: Vec<u8>) -> ImageKey {
        let key = ImageKey::for_bytes(&bytes);
        self.images.entry(key.clone()).or_insert_with(|| Arc::new(bytes));
        key
    }

    pub fn get(&self, key: &ImageKey) -> Option<Arc<Vec<u8>>> {
        self.images.get(key).cloned()
    }

    pub fn contains(&self, key: &ImageKey) -> bool {
        self.images.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop every entry not listed in `live`.
    pub fn retain_keys<'a>(&mut self, live: impl IntoIterator<Item = &'a ImageKey>) {
        let live: std::collections::HashSet<&ImageKey> = live.into_iter().collect();
        self.images.retain(|k, _| live.contains(k));
    }
}

/// Read `rel` (relative to `root`) as an [`Upload`] after normalizing the path.
pub fn load_relative(root: &Path, rel: &str) -> TraitloomResult<Upload> {
    let norm = normalize_rel_path(rel)?;
    let path: PathBuf = root.join(&norm);
    Upload::from_path(&path)
}

/// Normalize a manifest-relative path to a forward-slash form without `.`/`..` segments.
pub fn normalize_rel_path(source: &str) -> TraitloomResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(TraitloomError::validation("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(TraitloomError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(TraitloomError::validation(
                "image paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(TraitloomError::validation(
            "image path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

use crate::gallery::GalleryError;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    #[serde(other)]
    Unknown,
}

impl Orientation {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// One row of `manifest.json`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<u64>,
}

impl GalleryEntry {
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
            orientation: None,
            width: None,
            height: None,
            ratio: None,
            size_kb: None,
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.orientation == Some(Orientation::Portrait)
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reads the manifest. `Ok(None)` when the file does not exist.
pub fn read_manifest(path: &Path) -> Result<Option<Vec<GalleryEntry>>, GalleryError> {
    if !path.exists() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(path).map_err(|source| GalleryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = serde_json::from_str(&text).map_err(|source| GalleryError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(entries))
}

/// Flat listing of `dir`, filtered to image extensions and sorted by name.
/// Entries carry no dimensions or orientation.
pub fn scan_directory(dir: &Path, url_prefix: &str) -> Result<Vec<GalleryEntry>, GalleryError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| GalleryError::Scan {
            path: dir.to_path_buf(),
            source: err,
        })?;
        if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();

    debug!("Directory scan of {:?} found {} images", dir, names.len());
    Ok(names
        .into_iter()
        .map(|name| GalleryEntry::from_path(format!("{}/{}", url_prefix, name)))
        .collect())
}

/// Manifest entries when there is a manifest, otherwise the directory listing.
pub fn load_entries(
    manifest_path: &Path,
    gallery_dir: &Path,
    url_prefix: &str,
) -> Result<Vec<GalleryEntry>, GalleryError> {
    match read_manifest(manifest_path)? {
        Some(entries) => Ok(entries),
        None => {
            debug!("No manifest at {:?}, scanning directory", manifest_path);
            scan_directory(gallery_dir, url_prefix)
        }
    }
}

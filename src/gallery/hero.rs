use log::{debug, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::Path;

use crate::gallery::manifest::{GalleryEntry, read_manifest};

/// A random portrait entry if there is one, otherwise any entry.
pub fn pick_main_image<'a, R: Rng + ?Sized>(
    entries: &'a [GalleryEntry],
    rng: &mut R,
) -> Option<&'a GalleryEntry> {
    let portraits: Vec<&GalleryEntry> = entries.iter().filter(|e| e.is_portrait()).collect();
    if portraits.is_empty() {
        entries.choose(rng)
    } else {
        portraits.choose(rng).copied()
    }
}

/// Picks the hero image for one page render. Only the manifest is consulted;
/// anything short of a usable manifest yields `default_image`.
pub fn resolve_main_image<R: Rng + ?Sized>(
    manifest_path: &Path,
    default_image: &str,
    rng: &mut R,
) -> String {
    let entries = match read_manifest(manifest_path) {
        Ok(Some(entries)) => entries,
        Ok(None) => {
            debug!("No manifest for the hero image, using {}", default_image);
            return default_image.to_string();
        }
        Err(e) => {
            warn!("Ignoring manifest for the hero image: {}", e);
            return default_image.to_string();
        }
    };

    pick_main_image(&entries, rng)
        .map(|entry| entry.path.clone())
        .unwrap_or_else(|| default_image.to_string())
}

use log::error;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::content::WeddingContent;
use crate::gallery::manifest::load_entries;

pub const DEFAULT_MAX_DISPLAY: usize = 9;
pub const GALLERY_ERROR_MESSAGE: &str = "An error occurred while loading the gallery images.";

/// Fisher-Yates, from the last index down to 1.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// A uniformly random subset of at most `max_display` items, in random order.
pub fn select<T, R: Rng + ?Sized>(mut items: Vec<T>, max_display: usize, rng: &mut R) -> Vec<T> {
    shuffle(&mut items, rng);
    items.truncate(max_display);
    items
}

/// Body of `GET /api/gallery`.
#[derive(Serialize, Debug, PartialEq)]
pub struct GallerySelection {
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Where the gallery comes from, and what to show when that fails.
#[derive(Clone, Debug)]
pub struct GallerySource {
    pub manifest_path: PathBuf,
    pub gallery_dir: PathBuf,
    pub url_prefix: String,
    pub max_display: usize,
    pub fallback: Vec<String>,
}

impl GallerySource {
    pub fn new(config: &AppConfig, content: &WeddingContent) -> Self {
        Self {
            manifest_path: config.manifest_path(),
            gallery_dir: config.gallery_path(),
            url_prefix: config.gallery_url_prefix(),
            max_display: match content.gallery.max_display {
                0 => DEFAULT_MAX_DISPLAY,
                n => n,
            },
            fallback: content.gallery.images.clone(),
        }
    }

    /// Never fails: read errors degrade to the static fallback list.
    pub fn select_images<R: Rng + ?Sized>(&self, rng: &mut R) -> GallerySelection {
        match load_entries(&self.manifest_path, &self.gallery_dir, &self.url_prefix) {
            Ok(entries) => {
                let paths = entries.into_iter().map(|entry| entry.path).collect();
                GallerySelection {
                    images: select(paths, self.max_display, rng),
                    error: None,
                }
            }
            Err(e) => {
                error!("Gallery image load error: {}", e);
                GallerySelection {
                    images: self.fallback.clone(),
                    error: Some(GALLERY_ERROR_MESSAGE.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/images/gallery/{i}.jpg")).collect()
    }

    #[test]
    fn small_manifests_are_returned_whole() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..=DEFAULT_MAX_DISPLAY {
            let items = names(n);
            let picked = select(items.clone(), DEFAULT_MAX_DISPLAY, &mut rng);
            assert_eq!(picked.len(), n);
            let unique: HashSet<&String> = picked.iter().collect();
            assert_eq!(unique.len(), n);
            assert!(picked.iter().all(|p| items.contains(p)));
        }
    }

    #[test]
    fn large_manifests_are_truncated_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in [DEFAULT_MAX_DISPLAY + 1, 20, 100] {
            let items = names(n);
            for _ in 0..50 {
                let picked = select(items.clone(), DEFAULT_MAX_DISPLAY, &mut rng);
                assert_eq!(picked.len(), DEFAULT_MAX_DISPLAY);
                let unique: HashSet<&String> = picked.iter().collect();
                assert_eq!(unique.len(), DEFAULT_MAX_DISPLAY);
                assert!(picked.iter().all(|p| items.contains(p)));
            }
        }
    }

    #[test]
    fn shuffle_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(2026);
        let trials = 60_000;
        let mut counts: HashMap<Vec<u8>, usize> = HashMap::new();
        for _ in 0..trials {
            let mut items = vec![1u8, 2, 3];
            shuffle(&mut items, &mut rng);
            *counts.entry(items).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        let expected = trials / 6;
        for (perm, count) in counts {
            let deviation = count.abs_diff(expected) as f64 / expected as f64;
            assert!(deviation < 0.05, "{perm:?} seen {count} times");
        }
    }

    #[test]
    fn shuffle_keeps_every_item() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    fn source(dir: &TempDir) -> GallerySource {
        GallerySource {
            manifest_path: dir.path().join("manifest.json"),
            gallery_dir: dir.path().to_path_buf(),
            url_prefix: "/images/gallery".to_string(),
            max_display: 2,
            fallback: vec!["/images/gallery/image1.jpg".to_string()],
        }
    }

    #[test]
    fn manifest_paths_are_selected() {
        let dir = TempDir::new().expect("tempdir should be created");
        std::fs::write(
            dir.path().join("manifest.json"),
            r#"[{"path": "/a.jpg"}, {"path": "/b.jpg"}, {"path": "/c.jpg"}]"#,
        )
        .expect("manifest should be written");

        let selection = source(&dir).select_images(&mut StdRng::seed_from_u64(1));
        assert_eq!(selection.images.len(), 2);
        assert!(selection.error.is_none());
        assert!(
            selection
                .images
                .iter()
                .all(|p| ["/a.jpg", "/b.jpg", "/c.jpg"].contains(&p.as_str()))
        );
    }

    #[test]
    fn directory_listing_backs_a_missing_manifest() {
        let dir = TempDir::new().expect("tempdir should be created");
        std::fs::write(dir.path().join("one.jpg"), b"x").expect("file should be written");
        std::fs::write(dir.path().join("readme.md"), b"x").expect("file should be written");

        let selection = source(&dir).select_images(&mut StdRng::seed_from_u64(1));
        assert_eq!(selection.images, vec!["/images/gallery/one.jpg".to_string()]);
        assert!(selection.error.is_none());
    }

    #[test]
    fn empty_sources_give_an_empty_result() {
        let dir = TempDir::new().expect("tempdir should be created");
        let selection = source(&dir).select_images(&mut StdRng::seed_from_u64(1));
        assert!(selection.images.is_empty());
        assert!(selection.error.is_none());

        std::fs::write(dir.path().join("manifest.json"), "[]").expect("manifest should be written");
        let selection = source(&dir).select_images(&mut StdRng::seed_from_u64(1));
        assert!(selection.images.is_empty());
        assert!(selection.error.is_none());
    }

    #[test]
    fn read_failures_degrade_to_the_fallback_list() {
        let dir = TempDir::new().expect("tempdir should be created");
        std::fs::write(dir.path().join("manifest.json"), "oops").expect("manifest should be written");

        let selection = source(&dir).select_images(&mut StdRng::seed_from_u64(1));
        assert_eq!(selection.images, vec!["/images/gallery/image1.jpg".to_string()]);
        assert_eq!(selection.error.as_deref(), Some(GALLERY_ERROR_MESSAGE));

        let mut missing = source(&dir);
        missing.manifest_path = dir.path().join("absent/manifest.json");
        missing.gallery_dir = dir.path().join("absent");
        let selection = missing.select_images(&mut StdRng::seed_from_u64(1));
        assert_eq!(selection.error.as_deref(), Some(GALLERY_ERROR_MESSAGE));
    }
}

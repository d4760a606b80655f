use crate::asset_cache::asset::Asset;
use crate::cache::CacheTrait;
use crate::edge_color::EdgeColors;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::sync::Mutex;
use walkdir::WalkDir;

/// Images under the public directory, keyed by URL path (`/images/a.jpg`).
pub struct AssetCache {
    root: PathBuf,
    cache: HashMap<String, Asset>,
    max_cache_age_ms: i64,
}

impl CacheTrait for AssetCache {
    type Error = anyhow::Error;
    type DataSource = PathBuf;
    type Data = Asset;
    type Key = String;

    async fn insert_data(&mut self, file: &PathBuf) -> Result<String, anyhow::Error> {
        let asset_path = file.canonicalize()?;
        if !asset_path.metadata()?.is_file() {
            return Err(anyhow!("Passed a directory."));
        }

        let key = self
            .key_for(&asset_path)
            .ok_or(anyhow!("Asset is outside of scope"))?;

        let asset: Asset = {
            let path_str = asset_path
                .to_str()
                .ok_or(anyhow!("Asset path is not valid."))?;
            path_str.parse()?
        };

        debug!("Added to cache: {} => {:#?}", &key, &asset_path);
        self.cache.insert(key.clone(), asset);
        Ok(key)
    }

    async fn remove_data(&mut self, file: &PathBuf) -> Option<Asset> {
        // Removed files cannot be canonicalized, match on the stored path.
        let key = self
            .cache
            .iter()
            .find(|(_, asset)| asset.path == *file)
            .map(|(key, _)| key.to_owned())
            .or_else(|| self.key_for(file))?;

        self.cache.remove(&key)
    }

    fn get_data(&self, key: &String) -> Result<Asset, anyhow::Error> {
        self.cache
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no image found for {}", key))
    }

    fn len(&self) -> usize {
        self.cache.len()
    }

    fn directories(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    fn clean_cache(&mut self) {
        let mut cleared_assets = 0;

        for (_, asset) in self.cache.iter_mut() {
            if asset.cache_age() > self.max_cache_age_ms && !asset.is_empty() {
                asset.clear();
                cleared_assets += 1;
            }
        }

        if cleared_assets > 0 {
            debug!("Cleaned {} images from cache.", cleared_assets)
        }
    }
}

impl AssetCache {
    /// Registers every image under `root` without loading any data.
    pub async fn init(&mut self, root: impl AsRef<Path>) -> anyhow::Result<()> {
        let root = root.as_ref();
        self.root = root
            .canonicalize()
            .map_err(|e| anyhow!("Cannot open public directory {:?}: {}", root, e))?;

        let files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        for file in &files {
            if let Err(e) = self.insert_data(file).await {
                trace!("Skipping {:?}: {}", file, e);
            }
        }

        info!("Serving {} images from {:?}", self.cache.len(), self.root);
        Ok(())
    }

    /// URL key of a path under the root.
    pub fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(format!("/{}", parts.join("/")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Memoized edge colors, if the cached data they came from is still fresh.
    pub fn edge_colors(&self, key: &str) -> Option<EdgeColors> {
        let asset = self.cache.get(key)?;
        if !asset.is_fresh(self.max_cache_age_ms) {
            return None;
        }
        asset.edge_colors
    }

    /// Memoizes colors sampled from the data loaded at `loaded_at`.
    /// Skipped once the entry was reloaded or replaced since.
    pub fn remember_edge_colors(
        &mut self,
        key: &str,
        colors: EdgeColors,
        loaded_at: DateTime<Utc>,
    ) -> bool {
        match self.cache.get_mut(key) {
            Some(asset) if !asset.is_empty() && asset.loaded_at() == loaded_at => {
                asset.edge_colors = Some(colors);
                true
            }
            _ => false,
        }
    }

    /// Writes back an asset loaded from the entry stamped `checked_out`.
    /// Returns false, storing nothing, when the entry changed in between.
    pub fn store(&mut self, key: &str, mut asset: Asset, checked_out: DateTime<Utc>) -> bool {
        let Some(entry) = self.cache.get_mut(key) else {
            return false;
        };
        if entry.loaded_at() != checked_out || entry.path != asset.path {
            trace!("Not storing {}, the entry changed while loading", key);
            return false;
        }

        // Same bytes on both sides, keep what was derived meanwhile.
        if asset.loaded_at() == checked_out {
            if asset.compressed_data.is_empty() {
                asset.compressed_data = std::mem::take(&mut entry.compressed_data);
            }
            asset.edge_colors = asset.edge_colors.or(entry.edge_colors);
        }
        *entry = asset;
        true
    }
}

/// Reads and compresses on a blocking worker, away from the cache.
async fn load(mut asset: Asset, reload: bool, compress: bool) -> Result<Asset, anyhow::Error> {
    let asset = tokio::task::spawn_blocking(move || -> Result<Asset, anyhow::Error> {
        if reload {
            trace!("Fetching image from disk");
            asset.resolve()?;
        }
        if compress {
            asset.resolve_compressed()?;
        }
        Ok(asset)
    })
    .await??;
    Ok(asset)
}

/// Loads the asset at `key`. The cache is only locked to take a snapshot
/// and to store the result.
pub async fn fetch_asset(
    cache: &Mutex<AssetCache>,
    key: &str,
    compress: bool,
) -> Result<Asset, anyhow::Error> {
    let (asset, max_age) = {
        let cache_lock = cache.lock().await;
        (cache_lock.get_data(&key.to_string())?, cache_lock.max_cache_age_ms)
    };

    let fresh = asset.is_fresh(max_age);
    if fresh && (!compress || !asset.compressed_data.is_empty()) {
        trace!("Image present in cache, age {}", asset.cache_age());
        return Ok(asset);
    }

    let checked_out = asset.loaded_at();
    let asset = load(asset, !fresh, compress).await?;

    cache.lock().await.store(key, asset.clone(), checked_out);
    Ok(asset)
}

impl From<i64> for AssetCache {
    fn from(cache_max_age: i64) -> Self {
        info!(
            "Initializing a cache with a maximum TTL of {}ms",
            cache_max_age
        );

        Self {
            root: PathBuf::new(),
            cache: HashMap::new(),
            max_cache_age_ms: cache_max_age,
        }
    }
}

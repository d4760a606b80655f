use log::{debug, error, info, warn};
use notify::{
    EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// Interval between two sweeps of expired asset data.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub trait CacheTrait {
    type Error;
    type DataSource;
    type Data;
    type Key;

    async fn insert_data(&mut self, data: &Self::DataSource) -> Result<Self::Key, Self::Error>;
    async fn remove_data(&mut self, data: &Self::DataSource) -> Option<Self::Data>;
    /// Copy of the entry as it stands. Never touches the disk.
    fn get_data(&self, key: &Self::Key) -> Result<Self::Data, Self::Error>;
    fn len(&self) -> usize;
    fn directories(&self) -> Vec<PathBuf>;
    fn clean_cache(&mut self);
}

/// What a filesystem event means for the served files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileChange {
    Added,
    Removed,
    /// Rewritten in place. Anything derived from the old bytes is stale.
    Replaced,
}

impl FileChange {
    pub fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                Some(Self::Added)
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                Some(Self::Removed)
            }
            EventKind::Modify(ModifyKind::Data(_)) => Some(Self::Replaced),
            _ => None,
        }
    }
}

// Background processes
pub async fn cache_cleanup<C: CacheTrait>(cache: Arc<Mutex<C>>, interval: Duration) {
    debug!("Beginning cache clean up thread, sweeping every {:?}", interval);
    loop {
        tokio::time::sleep(interval).await;
        {
            let mut cache_lock = cache.lock().await;
            cache_lock.clean_cache();
        }
    }
}

async fn apply_change<C>(cache: &Mutex<C>, change: FileChange, paths: Vec<PathBuf>)
where
    C: CacheTrait<DataSource = PathBuf>,
    C::Error: std::fmt::Display,
{
    let mut cache_lock = cache.lock().await;
    for path in paths {
        if change != FileChange::Added && cache_lock.remove_data(&path).await.is_some() {
            info!("No longer serving {:?}", path);
        }
        if change != FileChange::Removed {
            match cache_lock.insert_data(&path).await {
                Ok(_) => info!("Now serving {:?}", path),
                Err(e) => debug!("Not serving {:?}: {}", path, e),
            }
        }
    }
    debug!("{} files in cache", cache_lock.len());
}

pub async fn directory_watcher<C>(cache: Arc<Mutex<C>>)
where
    C: CacheTrait<DataSource = PathBuf>,
    C::Error: std::fmt::Display,
{
    debug!("Starting directory watcher thread");
    let directories = {
        let cache_lock = cache.lock().await;
        cache_lock.directories()
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            if let Err(e) = tx.blocking_send(res) {
                error!("Failed to send watch event to async channel: {:?}", e);
            }
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Error creating watcher: {:?}", e);
            return;
        }
    };

    for directory in &directories {
        info!("Watching {:?} for new photos", directory);
        watcher
            .watch(directory, RecursiveMode::Recursive)
            .unwrap_or_else(|err| error!("Error watching directory {:#?} => {}", &directory, err));
    }

    while let Some(res) = rx.recv().await {
        match res {
            Ok(event) => {
                if let Some(change) = FileChange::from_event(&event.kind) {
                    apply_change(&cache, change, event.paths).await;
                }
            }
            Err(error) => warn!("Watcher error: {:?}", error),
        }
    }

    debug!("Directory watcher thread stopped.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_cache::cache::{AssetCache, fetch_asset};
    use crate::edge_color::{EdgeColor, EdgeColors};
    use crate::imaging::fixtures::{png_bytes, solid};
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    #[test]
    fn events_map_to_file_changes() {
        assert_eq!(
            FileChange::from_event(&EventKind::Create(CreateKind::File)),
            Some(FileChange::Added)
        );
        assert_eq!(
            FileChange::from_event(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(FileChange::Added)
        );
        assert_eq!(
            FileChange::from_event(&EventKind::Remove(RemoveKind::File)),
            Some(FileChange::Removed)
        );
        assert_eq!(
            FileChange::from_event(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(FileChange::Removed)
        );
        assert_eq!(
            FileChange::from_event(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileChange::Replaced)
        );
    }

    #[test]
    fn metadata_and_access_events_are_ignored() {
        assert_eq!(
            FileChange::from_event(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            None
        );
        assert_eq!(FileChange::from_event(&EventKind::Any), None);
    }

    #[tokio::test]
    async fn replaced_photos_lose_their_edge_colors() {
        let dir = TempDir::new().expect("tempdir should be created");
        let photo = dir.path().join("hero.png");
        std::fs::write(&photo, png_bytes(&solid(2, 2, [9, 9, 9, 255])))
            .expect("image should be written");

        let mut assets = AssetCache::from(60_000);
        assets.init(dir.path()).await.expect("init should succeed");
        let cache = Mutex::new(assets);
        let key = "/hero.png".to_string();
        let asset = fetch_asset(&cache, &key, false)
            .await
            .expect("image should load");
        let colors = EdgeColors {
            top: EdgeColor { r: 9, g: 9, b: 9 },
            bottom: EdgeColor { r: 9, g: 9, b: 9 },
        };
        {
            let mut assets = cache.lock().await;
            assets.remember_edge_colors(&key, colors, asset.loaded_at());
            assert_eq!(assets.edge_colors(&key), Some(colors));
        }

        let path = photo.canonicalize().expect("path should exist");
        apply_change(&cache, FileChange::Replaced, vec![path.clone()]).await;
        {
            let assets = cache.lock().await;
            assert!(assets.contains(&key));
            assert_eq!(assets.edge_colors(&key), None);
        }

        apply_change(&cache, FileChange::Removed, vec![path]).await;
        assert!(!cache.lock().await.contains(&key));
    }
}

pub mod hero;
pub mod manifest;
pub mod selector;

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum GalleryError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot list {path:?}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

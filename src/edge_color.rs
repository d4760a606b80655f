use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::asset_cache::cache::{AssetCache, fetch_asset};
use crate::imaging::decode_upright;

/// Strip height as a share of the image height.
pub const EDGE_SAMPLE_RATIO: f64 = 0.05;
/// Only every n-th pixel of a strip is averaged.
pub const SAMPLE_STEP: usize = 4;

const FADE_ALPHA: f32 = 0.6;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeColors {
    pub top: EdgeColor,
    pub bottom: EdgeColor,
}

impl EdgeColor {
    pub fn rgba(&self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl EdgeColors {
    pub fn top_fade_css(&self) -> String {
        format!(
            "linear-gradient(to bottom, {} 0%, {} 100%)",
            self.top.rgba(FADE_ALPHA),
            self.top.rgba(0.0)
        )
    }

    pub fn bottom_fade_css(&self) -> String {
        format!(
            "linear-gradient(to bottom, {} 0%, {} 100%)",
            self.bottom.rgba(0.0),
            self.bottom.rgba(FADE_ALPHA)
        )
    }
}

/// Averages RGBA bytes at `SAMPLE_STEP`, skipping fully transparent pixels.
/// `None` when no pixel was counted.
pub fn average_strip(data: &[u8]) -> Option<EdgeColor> {
    let (mut red, mut green, mut blue, mut count) = (0u64, 0u64, 0u64, 0u64);

    for pixel in data.chunks_exact(4).step_by(SAMPLE_STEP) {
        if pixel[3] == 0 {
            continue;
        }
        red += pixel[0] as u64;
        green += pixel[1] as u64;
        blue += pixel[2] as u64;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let average = |sum: u64| (sum as f64 / count as f64).round() as u8;
    Some(EdgeColor {
        r: average(red),
        g: average(green),
        b: average(blue),
    })
}

pub fn strip_height(image_height: u32) -> u32 {
    ((image_height as f64 * EDGE_SAMPLE_RATIO).floor() as u32).max(1)
}

/// Top and bottom strip colors of `image`, or `None` if either strip is empty.
pub fn sample_edges(image: &RgbaImage) -> Option<EdgeColors> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let strip = strip_height(height) as usize;
    let row = width as usize * 4;
    let raw = image.as_raw();

    let top = average_strip(&raw[..strip * row])?;
    let bottom = average_strip(&raw[(height as usize - strip) * row..])?;
    Some(EdgeColors { top, bottom })
}

/// Decodes encoded image bytes and samples them. Failures mean "no overlay".
pub fn sample_bytes(data: &[u8]) -> Option<EdgeColors> {
    match decode_upright(data) {
        Ok(img) => sample_edges(&img.to_rgba8()),
        Err(e) => {
            debug!("Cannot sample edge colors: {}", e);
            None
        }
    }
}

/// Shared flag telling a sampler whether anyone still wants its result.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held by the requester. Dropping it marks every `Liveness` clone dead.
#[derive(Debug)]
pub struct LivenessGuard(Liveness);

impl LivenessGuard {
    pub fn new() -> Self {
        Self(Liveness(Arc::new(AtomicBool::new(true))))
    }

    pub fn token(&self) -> Liveness {
        self.0.clone()
    }
}

impl Default for LivenessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}

/// Samples on a blocking worker. A result that completes after the guard
/// went away is discarded.
pub fn sample_in_background(data: Vec<u8>, liveness: Liveness) -> JoinHandle<Option<EdgeColors>> {
    tokio::task::spawn_blocking(move || {
        if !liveness.is_alive() {
            return None;
        }
        let colors = sample_bytes(&data);
        if !liveness.is_alive() {
            debug!("Discarding edge colors for an abandoned render");
            return None;
        }
        colors
    })
}

/// Edge colors of the served image at `key`, waiting at most `timeout`.
/// Images the cache does not serve have no overlay.
pub async fn edge_colors_for(
    cache: &Mutex<AssetCache>,
    key: &str,
    timeout: Duration,
) -> Option<EdgeColors> {
    if let Some(colors) = cache.lock().await.edge_colors(key) {
        return Some(colors);
    }

    let (data, loaded_at) = match fetch_asset(cache, key, false).await {
        Ok(asset) => {
            let loaded_at = asset.loaded_at();
            (asset.data, loaded_at)
        }
        Err(e) => {
            debug!("No edge colors for {}: {}", key, e);
            return None;
        }
    };

    let guard = LivenessGuard::new();
    match tokio::time::timeout(timeout, sample_in_background(data, guard.token())).await {
        Ok(Ok(Some(colors))) => {
            if !cache
                .lock()
                .await
                .remember_edge_colors(key, colors, loaded_at)
            {
                debug!("{} changed while sampling, not remembering its colors", key);
            }
            Some(colors)
        }
        Ok(Ok(None)) => None,
        Ok(Err(e)) => {
            warn!("Edge color sampler for {} failed: {}", key, e);
            None
        }
        Err(_) => {
            debug!("Edge colors for {} took longer than {:?}", key, timeout);
            None
        }
    }
}

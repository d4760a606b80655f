use actix_web::mime;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::{path::PathBuf, str::FromStr};

use crate::edge_color::EdgeColors;
use crate::imaging::decode_upright;

/// libwebp quality, 0 to 100.
const WEBP_QUALITY: f32 = 82.0;

/// An image under the public directory. Data is loaded on demand.
#[derive(Clone, Debug)]
pub struct Asset {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub compressed_data: Vec<u8>,
    pub edge_colors: Option<EdgeColors>,
    cache_time: DateTime<Utc>,
    image_type: imghdr::Type,
}

impl Asset {
    fn compress_image(data: &[u8]) -> Result<Vec<u8>, anyhow::Error> {
        // libwebp only takes 8-bit RGB(A)
        let upright = image::DynamicImage::ImageRgba8(decode_upright(data)?.to_rgba8());

        let encoder = webp::Encoder::from_image(&upright)
            .map_err(|err| anyhow!("Error parsing file: {}", err))?;

        encoder
            .encode_simple(false, WEBP_QUALITY)
            .map_err(|err| anyhow!("Error encoding data: {:#?}", err))
            .map(|mem| mem.to_vec())
    }
}

impl Asset {
    /// Returns cache age in ms
    pub fn cache_age(&self) -> i64 {
        let now = Utc::now();
        (now - self.cache_time).num_milliseconds()
    }

    /// When the current data was read from disk.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.cache_time
    }

    pub fn is_fresh(&self, max_age_ms: i64) -> bool {
        !self.is_empty() && self.cache_age() < max_age_ms
    }

    /// Reloads the file and forgets everything derived from the old bytes.
    pub fn resolve(&mut self) -> Result<(), anyhow::Error> {
        let data = std::fs::read(&self.path)
            .map_err(|e| anyhow!("Unable to read {:?}: {}", self.path, e))?;
        self.data = data;
        self.compressed_data.clear();
        self.edge_colors = None;
        self.cache_time = Utc::now();
        Ok(())
    }

    /// Produces the WebP variant from already loaded data.
    pub fn resolve_compressed(&mut self) -> Result<(), anyhow::Error> {
        if self.compressed_data.is_empty() {
            self.compressed_data = Self::compress_image(&self.data)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.compressed_data.clear();
        self.edge_colors = None;
    }

    /// Content type and body to serve, the WebP variant when `compress` is set.
    pub fn into_body(self, compress: bool) -> (String, Vec<u8>) {
        if compress {
            return ("image/webp".to_string(), self.compressed_data);
        }
        let content_type = self.content_type();
        (content_type, self.data)
    }

    pub fn content_type(&self) -> String {
        match self.image_type {
            imghdr::Type::Gif => mime::IMAGE_GIF.to_string(),
            imghdr::Type::Tiff => "image/tiff".to_string(),
            imghdr::Type::Jpeg => mime::IMAGE_JPEG.to_string(),
            imghdr::Type::Bmp => mime::IMAGE_BMP.to_string(),
            imghdr::Type::Png => mime::IMAGE_PNG.to_string(),
            imghdr::Type::Webp => "image/webp".to_string(),
            imghdr::Type::Exr => "image/exr".to_string(),
            imghdr::Type::Ico => "image/vnd.microsoft.icon".to_string(),
            _ => "application/octet-stream".to_string(),
        }
    }
}

/// Strong ETag for a response body.
pub fn etag(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("\"{}\"", hex)
}

impl FromStr for Asset {
    type Err = anyhow::Error;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let path = PathBuf::from(path).canonicalize()?;

        Ok(Self {
            image_type: imghdr::from_file(&path)?.ok_or(anyhow!("File type is not supported"))?,
            path,
            cache_time: Utc::now(),
            data: Vec::new(),
            compressed_data: Vec::new(),
            edge_colors: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::fixtures::{png_bytes, solid};
    use tempfile::TempDir;

    #[test]
    fn parse_detects_type_by_content() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, png_bytes(&solid(2, 2, [0, 0, 0, 255])))
            .expect("file should be written");

        let asset: Asset = path.to_str().expect("utf8 path").parse().expect("png should parse");
        assert_eq!(asset.content_type(), "image/png");
        assert!(asset.is_empty());

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"hello").expect("file should be written");
        assert!(text.to_str().expect("utf8 path").parse::<Asset>().is_err());
    }

    #[test]
    fn resolve_loads_and_clear_forgets() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("a.png");
        let bytes = png_bytes(&solid(3, 3, [10, 20, 30, 255]));
        std::fs::write(&path, &bytes).expect("file should be written");

        let mut asset: Asset = path.to_str().expect("utf8 path").parse().expect("png should parse");
        assert!(!asset.is_fresh(60_000));
        asset.resolve().expect("file should load");
        assert_eq!(asset.data, bytes);
        assert!(asset.is_fresh(60_000));
        assert!(!asset.is_fresh(-1));

        asset.resolve_compressed().expect("webp should encode");
        assert!(!asset.compressed_data.is_empty());

        asset.clear();
        assert!(asset.is_empty() && asset.compressed_data.is_empty());
    }

    #[test]
    fn etag_is_quoted_sha256() {
        let tag = etag(b"abc");
        assert_eq!(
            tag,
            "\"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
        );
    }
}

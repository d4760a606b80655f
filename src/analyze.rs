use anyhow::{Context, anyhow};
use image::{ImageEncoder, codecs::jpeg::JpegEncoder, imageops::FilterType};
use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::gallery::manifest::{GalleryEntry, Orientation, has_image_extension};
use crate::imaging::{decode_upright, exif_orientation, swaps_dimensions};

pub const GALLERY_TARGET: (u32, u32) = (1200, 900);
pub const JPEG_QUALITY: u8 = 85;

/// What is known about one source photo.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PhotoReport {
    pub file: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ratio: Option<f64>,
    pub orientation: ReportOrientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportOrientation {
    Portrait,
    Landscape,
    Unknown,
    Error,
}

impl std::fmt::Display for ReportOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Unknown => "unknown",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    pub copy: bool,
    pub resize: bool,
    /// Where copies and `manifest.json` go.
    pub gallery_dir: PathBuf,
    /// URL prefix recorded in the manifest.
    pub url_prefix: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Displayed dimensions of a photo, EXIF rotation included.
fn upright_dimensions(path: &Path) -> anyhow::Result<(u32, u32)> {
    let (width, height) = image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()?;
    let data = std::fs::read(path)?;
    let orientation = exif_orientation(&data).unwrap_or(1);
    if swaps_dimensions(orientation) {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}

pub fn analyze_file(path: &Path) -> PhotoReport {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    match upright_dimensions(path) {
        Ok((width, height)) if width > 0 && height > 0 => {
            let orientation = match Orientation::from_dimensions(width, height) {
                Orientation::Portrait => ReportOrientation::Portrait,
                _ => ReportOrientation::Landscape,
            };
            PhotoReport {
                file,
                width: Some(width),
                height: Some(height),
                ratio: Some(round2(width as f64 / height as f64)),
                orientation,
                error: None,
            }
        }
        Ok(_) => PhotoReport {
            file,
            width: None,
            height: None,
            ratio: None,
            orientation: ReportOrientation::Unknown,
            error: None,
        },
        Err(e) => PhotoReport {
            file,
            width: None,
            height: None,
            ratio: None,
            orientation: ReportOrientation::Error,
            error: Some(e.to_string()),
        },
    }
}

/// Image files directly inside `folder`, sorted by name.
pub fn list_photos(folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(anyhow!("Folder not found: {:?}", folder));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && has_image_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

pub fn report_table(reports: &[PhotoReport]) -> String {
    let dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut table = String::from("filename\twidth\theight\tratio\torientation\n");
    for report in reports {
        table.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            report.file,
            dash(report.width.map(|w| w.to_string())),
            dash(report.height.map(|h| h.to_string())),
            dash(report.ratio.map(|r| r.to_string())),
            report.orientation
        ));
    }
    table
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

fn write_jpeg(img: &image::DynamicImage, dest: &Path) -> anyhow::Result<()> {
    let rgb = img.to_rgb8();
    let file = std::fs::File::create(dest)?;
    let encoder = JpegEncoder::new_with_quality(std::io::BufWriter::new(file), JPEG_QUALITY);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

/// Puts `<stem>.jpg` for `source` into the gallery.
fn copy_photo(source: &Path, dest: &Path, resize: bool) -> anyhow::Result<()> {
    if !resize && is_jpeg(source) {
        std::fs::copy(source, dest)?;
        return Ok(());
    }

    let data = std::fs::read(source)?;
    let mut img = decode_upright(&data)?;
    if resize {
        img = img.resize_to_fill(GALLERY_TARGET.0, GALLERY_TARGET.1, FilterType::Lanczos3);
    }
    write_jpeg(&img, dest)
}

/// Copies analyzed photos into the gallery and writes its manifest.
pub fn build_gallery(
    folder: &Path,
    reports: &[PhotoReport],
    options: &AnalyzeOptions,
) -> anyhow::Result<Vec<GalleryEntry>> {
    std::fs::create_dir_all(&options.gallery_dir)
        .with_context(|| format!("Cannot create {:?}", options.gallery_dir))?;

    let mut manifest = Vec::new();
    for report in reports {
        if report.orientation == ReportOrientation::Error || report.width.is_none() {
            continue;
        }

        let source = folder.join(&report.file);
        let stem = Path::new(&report.file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| report.file.clone());
        let dest_name = format!("{}.jpg", stem);
        let dest = options.gallery_dir.join(&dest_name);

        if let Err(e) = copy_photo(&source, &dest, options.resize) {
            error!("Failed {}: {}", report.file, e);
            continue;
        }

        let size_kb = std::fs::metadata(&dest)
            .map(|m| (m.len() as f64 / 1024.0).round() as u64)
            .ok();
        let orientation = match report.orientation {
            ReportOrientation::Portrait => Orientation::Portrait,
            _ => Orientation::Landscape,
        };

        manifest.push(GalleryEntry {
            file: Some(dest_name.clone()),
            orientation: Some(orientation),
            width: report.width,
            height: report.height,
            ratio: report.ratio,
            size_kb,
            ..GalleryEntry::from_path(format!("{}/{}", options.url_prefix, dest_name))
        });
        info!("Copied: {}", dest_name);
    }

    let manifest_path = options.gallery_dir.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Cannot write {:?}", manifest_path))?;
    info!("Wrote {:?}", manifest_path);

    Ok(manifest)
}

pub fn run(folder: &Path, options: &AnalyzeOptions) -> anyhow::Result<Vec<PhotoReport>> {
    let photos = list_photos(folder)?;
    let reports: Vec<PhotoReport> = photos.iter().map(|p| analyze_file(p)).collect();

    println!("\n--- Photo analysis report ---\n");
    print!("{}", report_table(&reports));

    if options.copy {
        build_gallery(folder, &reports, options)?;
    }

    Ok(reports)
}

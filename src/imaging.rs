use anyhow::anyhow;
use exif::{Reader, Tag};
use image::DynamicImage;

pub fn apply_exif_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};

    match orientation {
        1 => img,
        2 => DynamicImage::ImageRgba8(flip_horizontal(&img)),
        3 => DynamicImage::ImageRgba8(rotate180(&img)),
        4 => DynamicImage::ImageRgba8(flip_vertical(&img)),
        5 => DynamicImage::ImageRgba8(rotate90(&flip_horizontal(&img))),
        6 => DynamicImage::ImageRgba8(rotate90(&img)),
        7 => DynamicImage::ImageRgba8(rotate270(&flip_horizontal(&img))),
        8 => DynamicImage::ImageRgba8(rotate270(&img)),
        _ => img,
    }
}

/// Extract EXIF orientation if present
pub fn exif_orientation(data: &[u8]) -> Result<u32, anyhow::Error> {
    let exif = Reader::new()
        .read_from_container(&mut std::io::Cursor::new(data))
        .map_err(|e| anyhow!("EXIF parse error: {}", e))?;

    let field = exif
        .get_field(Tag::Orientation, exif::In::PRIMARY)
        .ok_or_else(|| anyhow!("No Orientation tag found"))?;

    field
        .value
        .get_uint(0)
        .ok_or_else(|| anyhow!("Invalid orientation value"))
}

/// Orientations 5 to 8 swap width and height.
pub fn swaps_dimensions(orientation: u32) -> bool {
    (5..=8).contains(&orientation)
}

/// Decodes `data` the way a browser would show it, upright.
pub fn decode_upright(data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
    let img = image::load_from_memory(data)?;
    let orientation = exif_orientation(data).unwrap_or(1);
    Ok(apply_exif_orientation(img, orientation))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .expect("png should encode");
        out.into_inner()
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(width, height, Rgba(color))
    }
}

//! Shared test utilities: small in-memory images and on-disk photo trees.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_photo_tree();
//! let bytes = png_bytes(64, 48);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Encoded images
// =========================================================================

/// Opaque RGB gradient, PNG-encoded.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Striped image with transparent columns, PNG-encoded.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([200, 10, 10, if x % 2 == 0 { 0 } else { 255 }])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    out
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

// =========================================================================
// Fixture trees
// =========================================================================

pub fn write_file(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// A small photo folder in a temp directory:
///
/// ```text
/// dawn.jpg        32x24
/// logo.png        16x16, with alpha
/// notes.txt
/// trip/dusk.png   20x10
/// ```
pub fn setup_photo_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "dawn.jpg", &jpeg_bytes(32, 24));
    write_file(tmp.path(), "logo.png", &rgba_png_bytes(16, 16));
    write_file(tmp.path(), "notes.txt", b"not an image");
    write_file(tmp.path(), "trip/dusk.png", &png_bytes(20, 10));
    tmp
}

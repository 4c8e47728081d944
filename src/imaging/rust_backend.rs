//! Pure-Rust decode plus libwebp / rav1e encode.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff input format | magic bytes, then `image::guess_format` |
//! | Decode (JPEG, PNG, GIF, TIFF, BMP, WebP) | `image` crate, EXIF orientation applied |
//! | Decode (HEIC/HEIF, JPEG 2000) | rejected: no pure-Rust decoder |
//! | Encode → WebP | `webp` (libwebp), lossy or lossless |
//! | Encode → AVIF | `ravif` (rav1e) with every [`AvifOptions`] knob |
//! | Identify output | `image` for WebP, `avif-parse` container metadata for AVIF |

use super::backend::{EncodeBackend, EncodeError};
use super::options::{
    AlphaColorMode, AvifOptions, BitDepth, ColorModel, EncodeOptions, OutputFormat, WebpOptions,
};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use imgref::Img;
use rgb::{RGB8, RGBA8};
use std::io::Cursor;
use std::num::NonZeroUsize;

/// Production encoder.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// Formats we can name but not decode.
fn sniff_unsupported(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() > 12 && &bytes[4..8] == b"ftyp" {
        let brand = &bytes[8..12];
        if matches!(brand, b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"mif1") {
            return Some("HEIC/HEIF");
        }
    }
    if bytes.starts_with(b"\x00\x00\x00\x0CjP  \r\n\x87\n") || bytes.starts_with(b"\xFF\x4F\xFF\x51")
    {
        return Some("JPEG 2000");
    }
    None
}

fn detect_format(bytes: &[u8]) -> Result<ImageFormat, EncodeError> {
    if let Some(name) = sniff_unsupported(bytes) {
        return Err(EncodeError::UnsupportedInput(format!(
            "{name} images cannot be decoded by this build"
        )));
    }
    image::guess_format(bytes)
        .map_err(|_| EncodeError::Decode("unrecognized image data".to_string()))
}

/// Decode source bytes, honouring the EXIF orientation tag.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EncodeError> {
    let format = detect_format(bytes)?;
    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
        .into_decoder()
        .map_err(|e| EncodeError::Decode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| EncodeError::Decode(e.to_string()))?;
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| EncodeError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    tracing::debug!(
        format = ?format,
        width = img.width(),
        height = img.height(),
        "decoded"
    );
    Ok(img)
}

fn encode_webp(img: &DynamicImage, options: &WebpOptions) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (img.width(), img.height());
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_simple(options.lossless, options.quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height)
            .encode_simple(options.lossless, options.quality)
    };
    let memory =
        encoded.map_err(|e| EncodeError::Backend(format!("WebP encoding failed: {e:?}")))?;
    Ok(memory.to_vec())
}

fn ravif_encoder(options: &AvifOptions) -> ravif::Encoder {
    let bit_depth = match options.bit_depth {
        BitDepth::Auto => ravif::BitDepth::Auto,
        BitDepth::Eight => ravif::BitDepth::Eight,
        BitDepth::Ten => ravif::BitDepth::Ten,
    };
    let color_model = match options.color_model {
        ColorModel::YCbCr => ravif::ColorModel::YCbCr,
        ColorModel::Rgb => ravif::ColorModel::RGB,
    };
    let alpha_color_mode = match options.alpha_color_mode {
        AlphaColorMode::UnassociatedDirty => ravif::AlphaColorMode::UnassociatedDirty,
        AlphaColorMode::UnassociatedClean => ravif::AlphaColorMode::UnassociatedClean,
        AlphaColorMode::Premultiplied => ravif::AlphaColorMode::Premultiplied,
    };
    ravif::Encoder::new()
        .with_quality(options.quality)
        .with_alpha_quality(options.alpha_quality)
        .with_speed(options.speed)
        .with_bit_depth(bit_depth)
        .with_internal_color_model(color_model)
        .with_alpha_color_mode(alpha_color_mode)
        .with_num_threads(options.threads.map(NonZeroUsize::get))
}

fn encode_avif(img: &DynamicImage, options: &AvifOptions) -> Result<Vec<u8>, EncodeError> {
    let encoder = ravif_encoder(options);
    let (width, height) = (img.width() as usize, img.height() as usize);

    let encoded = if img.color().has_alpha() {
        let pixels: Vec<RGBA8> = img
            .to_rgba8()
            .pixels()
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        encoder.encode_rgba(Img::new(pixels.as_slice(), width, height))
    } else {
        let pixels: Vec<RGB8> = img
            .to_rgb8()
            .pixels()
            .map(|p| RGB8::new(p[0], p[1], p[2]))
            .collect();
        encoder.encode_rgb(Img::new(pixels.as_slice(), width, height))
    };
    let encoded = encoded.map_err(|e| EncodeError::Backend(format!("AVIF encoding failed: {e}")))?;
    Ok(encoded.avif_file)
}

/// Pixel dimensions of an encoded output file.
///
/// AVIF is read from container metadata only; there is no AVIF decoder in
/// this build.
pub fn identify(bytes: &[u8], format: OutputFormat) -> Result<(u32, u32), EncodeError> {
    match format {
        OutputFormat::Webp => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::WebP)
                .map_err(|e| EncodeError::Decode(e.to_string()))?;
            Ok((img.width(), img.height()))
        }
        OutputFormat::Avif => {
            let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
                .map_err(|e| EncodeError::Decode(format!("Failed to parse AVIF: {e:?}")))?;
            let meta = avif.primary_item_metadata().map_err(|e| {
                EncodeError::Decode(format!("Failed to read AVIF metadata: {e:?}"))
            })?;
            Ok((meta.max_frame_width.get(), meta.max_frame_height.get()))
        }
    }
}

impl EncodeBackend for RustEncoder {
    fn encode(&self, bytes: &[u8], options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
        options.validate().map_err(EncodeError::InvalidOptions)?;
        let img = decode(bytes)?;
        let out = match options {
            EncodeOptions::Webp(webp) => encode_webp(&img, webp)?,
            EncodeOptions::Avif(avif) => encode_avif(&img, avif)?,
        };
        tracing::debug!(
            format = %options.format(),
            input = bytes.len(),
            output = out.len(),
            "encoded"
        );
        Ok(out)
    }
}

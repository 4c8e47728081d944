//! Encoder option types.
//!
//! These types describe *what* to produce, not *how*. [`EncodeOptions`] is the
//! single value handed to an [`EncodeBackend`](super::EncodeBackend) per image;
//! it carries exactly one format's options, so "both set" and "neither set"
//! are unrepresentable.
//!
//! ## Types
//!
//! - [`OutputFormat`]: target container (`webp` / `avif`) and its extension.
//! - [`WebpOptions`]: quality 0–100, lossless switch.
//! - [`AvifOptions`]: quality, alpha quality, speed 0–10, bit depth, internal
//!   color model, thread count, alpha handling.
//! - [`EncodeOptions`]: the tagged union of the two.
//!
//! Ranges are checked by [`EncodeOptions::validate`], which the backend calls
//! before touching pixels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Avif,
}

impl OutputFormat {
    /// Lowercase file extension, no dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// Human label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Webp => "WebP",
            OutputFormat::Avif => "AVIF",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// WebP settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebpOptions {
    /// Lossy quality (0 = smallest, 100 = best). Ignored when `lossless`.
    pub quality: f32,
    pub lossless: bool,
}

impl Default for WebpOptions {
    fn default() -> Self {
        Self {
            quality: 80.0,
            lossless: true,
        }
    }
}

/// AVIF output bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// Let the encoder pick from the source.
    #[default]
    Auto,
    Eight,
    Ten,
}

/// Color model used inside the AVIF bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    #[default]
    YCbCr,
    Rgb,
}

/// How color channels of transparent pixels are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphaColorMode {
    /// Keep RGB under alpha = 0 untouched.
    UnassociatedDirty,
    /// Clear invisible pixels to improve compression.
    #[default]
    UnassociatedClean,
    Premultiplied,
}

/// AVIF settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvifOptions {
    pub quality: f32,
    pub bit_depth: BitDepth,
    pub alpha_quality: f32,
    /// 0 = slowest/best, 10 = fastest.
    pub speed: u8,
    pub color_model: ColorModel,
    /// Encoder threads; `None` lets the encoder decide.
    pub threads: Option<NonZeroUsize>,
    pub alpha_color_mode: AlphaColorMode,
}

impl Default for AvifOptions {
    fn default() -> Self {
        Self {
            quality: 80.0,
            bit_depth: BitDepth::Auto,
            alpha_quality: 80.0,
            speed: 5,
            color_model: ColorModel::YCbCr,
            threads: None,
            alpha_color_mode: AlphaColorMode::UnassociatedClean,
        }
    }
}

/// Options for one encode call. Exactly one format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodeOptions {
    Webp(WebpOptions),
    Avif(AvifOptions),
}

impl EncodeOptions {
    pub fn format(&self) -> OutputFormat {
        match self {
            EncodeOptions::Webp(_) => OutputFormat::Webp,
            EncodeOptions::Avif(_) => OutputFormat::Avif,
        }
    }

    /// Check every numeric field against its documented range.
    ///
    /// Returns the first violation as a human-readable message.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            EncodeOptions::Webp(webp) => check_percent("WebP quality", webp.quality),
            EncodeOptions::Avif(avif) => {
                check_percent("AVIF quality", avif.quality)?;
                check_percent("AVIF alpha quality", avif.alpha_quality)?;
                if avif.speed > 10 {
                    return Err(format!("AVIF speed must be 0-10, got {}", avif.speed));
                }
                Ok(())
            }
        }
    }
}

fn check_percent(what: &str, value: f32) -> Result<(), String> {
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("{what} must be between 0 and 100, got {value}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extensions_are_lowercase() {
        assert_eq!(OutputFormat::Webp.extension(), "webp");
        assert_eq!(OutputFormat::Avif.extension(), "avif");
        assert_eq!(OutputFormat::Avif.to_string(), "avif");
    }

    #[test]
    fn options_report_their_format() {
        assert_eq!(
            EncodeOptions::Webp(WebpOptions::default()).format(),
            OutputFormat::Webp
        );
        assert_eq!(
            EncodeOptions::Avif(AvifOptions::default()).format(),
            OutputFormat::Avif
        );
    }

    #[test]
    fn defaults_are_valid() {
        assert!(EncodeOptions::Webp(WebpOptions::default()).validate().is_ok());
        assert!(EncodeOptions::Avif(AvifOptions::default()).validate().is_ok());
    }

    #[test]
    fn quality_boundaries() {
        for q in [0.0, 100.0] {
            let opts = EncodeOptions::Webp(WebpOptions {
                quality: q,
                lossless: false,
            });
            assert!(opts.validate().is_ok(), "quality {q} should be accepted");
        }
        let opts = EncodeOptions::Webp(WebpOptions {
            quality: 100.5,
            lossless: false,
        });
        let err = opts.validate().unwrap_err();
        assert!(err.contains("WebP quality"));
    }

    #[test]
    fn nan_quality_rejected() {
        let opts = EncodeOptions::Webp(WebpOptions {
            quality: f32::NAN,
            lossless: false,
        });
        assert!(opts.validate().is_err());
    }

    #[test]
    fn avif_speed_above_ten_rejected() {
        let opts = EncodeOptions::Avif(AvifOptions {
            speed: 11,
            ..Default::default()
        });
        assert!(opts.validate().unwrap_err().contains("speed"));
    }

    #[test]
    fn avif_alpha_quality_checked() {
        let opts = EncodeOptions::Avif(AvifOptions {
            alpha_quality: -1.0,
            ..Default::default()
        });
        assert!(opts.validate().unwrap_err().contains("alpha quality"));
    }

    #[test]
    fn alpha_color_mode_serializes_kebab_case() {
        #[derive(Serialize)]
        struct Wrap {
            mode: AlphaColorMode,
        }
        let s = toml::to_string(&Wrap {
            mode: AlphaColorMode::UnassociatedClean,
        })
        .unwrap();
        assert!(s.contains("\"unassociated-clean\""));
    }
}

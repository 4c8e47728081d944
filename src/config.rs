//! Converter settings.
//!
//! Settings live in a single TOML file, by default
//! `<config dir>/dropconv/config.toml`. Resolution is layered:
//!
//! ```text
//! stock defaults  →  config.toml  →  command-line overrides
//! ```
//!
//! Each layer only needs the keys it wants to change. Unknown keys are
//! rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! [common]
//! format = "webp"          # webp | avif
//! overwrite = false        # replace existing outputs
//! delete_original = false  # remove the source after a successful write
//! recursive = false        # descend into subdirectories
//! same_directory = true    # write beside the source instead of output_dir
//! ignore_jpeg = false      # leave .jpg/.jpeg inputs alone
//! # output_dir = "/path"   # defaults to the documents directory
//!
//! [webp]
//! quality = 80
//! lossless = true
//!
//! [avif]
//! quality = 80
//! bit_depth = "auto"
//! alpha_quality = 80
//! speed = 5
//! color_model = "ycbcr"
//! alpha_color_mode = "unassociated-clean"
//!
//! [notifications]
//! sound = true
//! ```
//!
//! ## Snapshots
//!
//! The orchestrator never holds on to a [`Settings`] value across files. It
//! asks a [`SettingsSource`] for a fresh snapshot before each one, so an edit
//! to the file mid-batch applies to the files that follow it.

use crate::collect::ExtensionPattern;
use crate::imaging::{AvifOptions, EncodeOptions, OutputFormat, WebpOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Every setting the converter reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub common: CommonSettings,
    pub webp: WebpOptions,
    pub avif: AvifOptions,
    pub notifications: NotificationSettings,
}

/// Options shared by both output formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommonSettings {
    pub format: OutputFormat,
    /// Replace an existing output file. When off, such files are skipped.
    pub overwrite: bool,
    /// Remove the source once its output has been written.
    pub delete_original: bool,
    pub recursive: bool,
    /// Write next to the source. When off, outputs go to `output_dir`.
    pub same_directory: bool,
    pub ignore_jpeg: bool,
    pub output_dir: Option<PathBuf>,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            overwrite: false,
            delete_original: false,
            recursive: false,
            same_directory: true,
            ignore_jpeg: false,
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationSettings {
    /// Play a sound cue on success and failure.
    pub sound: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { sound: true }
    }
}

impl Settings {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        EncodeOptions::Webp(self.webp)
            .validate()
            .map_err(ConfigError::Validation)?;
        EncodeOptions::Avif(self.avif)
            .validate()
            .map_err(ConfigError::Validation)?;
        if let Some(dir) = &self.common.output_dir
            && dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "common.output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Options for the selected output format.
    pub fn encode_options(&self) -> EncodeOptions {
        match self.common.format {
            OutputFormat::Webp => EncodeOptions::Webp(self.webp),
            OutputFormat::Avif => EncodeOptions::Avif(self.avif),
        }
    }

    pub fn pattern(&self) -> ExtensionPattern {
        ExtensionPattern::new(self.common.ignore_jpeg)
    }

    /// Directory for outputs that don't go beside their source, and for
    /// pasted images. Falls back to the platform documents directory.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.common.output_dir.clone().or_else(dirs::document_dir)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Default location of the settings file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dropconv").join("config.toml"))
}

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Settings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path` on top of the stock defaults.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(path)?)
}

/// Where the orchestrator gets a settings snapshot for each file.
pub trait SettingsSource: Sync {
    fn snapshot(&self) -> Result<Settings, ConfigError>;
}

/// A fixed settings value.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub Settings);

impl SettingsSource for StaticSettings {
    fn snapshot(&self) -> Result<Settings, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Settings re-read from a TOML file on every snapshot, with command-line
/// overrides merged on top.
#[derive(Debug, Clone, Default)]
pub struct FileSettings {
    path: Option<PathBuf>,
    overrides: Option<toml::Value>,
}

impl FileSettings {
    /// `path = None` means stock defaults plus overrides only.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: toml::Value) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SettingsSource for FileSettings {
    fn snapshot(&self) -> Result<Settings, ConfigError> {
        let file = match &self.path {
            Some(path) => load_raw_config(path)?,
            None => None,
        };
        resolve_config(
            stock_defaults_value()?,
            file.into_iter().chain(self.overrides.clone()),
        )
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# dropconv configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--format, --quality, ...) override this file for a
# single run. The file is re-read before every image, so edits made during a
# long batch apply to the images that follow.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Common
# ---------------------------------------------------------------------------
[common]
# Output format: "webp" or "avif".
format = "webp"

# Replace an output file that already exists. When false the image is skipped.
overwrite = false

# Delete the source image after its output has been written.
delete_original = false

# Descend into subdirectories of dropped or selected folders.
recursive = false

# Write each output next to its source. When false, outputs go to output_dir.
same_directory = true

# Leave .jpg / .jpeg inputs alone.
ignore_jpeg = false

# Destination for outputs when same_directory is false, and for pasted
# images. Defaults to your documents directory.
# output_dir = "/home/me/Pictures/converted"

# ---------------------------------------------------------------------------
# WebP
# ---------------------------------------------------------------------------
[webp]
# Lossy quality (0 = smallest, 100 = best). Ignored when lossless is true.
quality = 80

# Lossless encoding.
lossless = true

# ---------------------------------------------------------------------------
# AVIF
# ---------------------------------------------------------------------------
[avif]
# Color quality (0 = worst, 100 = best).
quality = 80

# "auto", "eight" or "ten".
bit_depth = "auto"

# Quality of the alpha channel (0-100).
alpha_quality = 80

# Encoder speed: 0 = slowest/smallest, 10 = fastest.
speed = 5

# Internal color model: "ycbcr" or "rgb".
color_model = "ycbcr"

# Encoder threads. Omit to let the encoder decide.
# threads = 4

# Color of fully transparent pixels: "unassociated-dirty",
# "unassociated-clean" or "premultiplied".
alpha_color_mode = "unassociated-clean"

# ---------------------------------------------------------------------------
# Notifications
# ---------------------------------------------------------------------------
[notifications]
# Play a sound when a batch finishes or fails.
sound = true
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{AlphaColorMode, BitDepth};
    use std::num::NonZeroUsize;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    // =========================================================================
    // Defaults and parsing
    // =========================================================================

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert_eq!(s.common.format, OutputFormat::Webp);
        assert!(s.common.same_directory);
        assert!(!s.common.overwrite);
        assert!(!s.common.recursive);
        assert_eq!(s.webp.quality, 80.0);
        assert!(s.webp.lossless);
        assert_eq!(s.avif.speed, 5);
        assert!(s.notifications.sound);
    }

    #[test]
    fn parse_partial_config() {
        let s: Settings = toml::from_str(
            r#"
            [common]
            format = "avif"
            "#,
        )
        .unwrap();
        assert_eq!(s.common.format, OutputFormat::Avif);
        assert!(s.common.same_directory);
        assert_eq!(s.avif, AvifOptions::default());
    }

    #[test]
    fn parse_avif_settings() {
        let s: Settings = toml::from_str(
            r#"
            [avif]
            quality = 60
            bit_depth = "ten"
            threads = 2
            alpha_color_mode = "premultiplied"
            "#,
        )
        .unwrap();
        assert_eq!(s.avif.quality, 60.0);
        assert_eq!(s.avif.bit_depth, BitDepth::Ten);
        assert_eq!(s.avif.threads, NonZeroUsize::new(2));
        assert_eq!(s.avif.alpha_color_mode, AlphaColorMode::Premultiplied);
    }

    #[test]
    fn zero_threads_rejected() {
        let result: Result<Settings, _> = toml::from_str("[avif]\nthreads = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Settings, _> = toml::from_str("[common]\nfromat = \"avif\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Settings, _> = toml::from_str("[jpeg]\nquality = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn encode_options_follow_format() {
        let mut s = Settings::default();
        assert_eq!(s.encode_options(), EncodeOptions::Webp(s.webp));
        s.common.format = OutputFormat::Avif;
        assert_eq!(s.encode_options(), EncodeOptions::Avif(s.avif));
    }

    #[test]
    fn pattern_follows_ignore_jpeg() {
        let mut s = Settings::default();
        assert!(s.pattern().matches(Path::new("a.jpg")));
        s.common.ignore_jpeg = true;
        assert!(!s.pattern().matches(Path::new("a.jpg")));
    }

    #[test]
    fn explicit_output_dir_wins() {
        let mut s = Settings::default();
        s.common.output_dir = Some(PathBuf::from("/out"));
        assert_eq!(s.output_dir(), Some(PathBuf::from("/out")));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn validate_webp_quality_too_high() {
        let mut s = Settings::default();
        s.webp.quality = 101.0;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_avif_speed_too_high() {
        let mut s = Settings::default();
        s.avif.speed = 11;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("speed"));
    }

    #[test]
    fn validate_empty_output_dir() {
        let mut s = Settings::default();
        s.common.output_dir = Some(PathBuf::new());
        assert!(s.validate().is_err());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge_preserves_siblings() {
        let base: toml::Value = toml::from_str("[webp]\nquality = 80\nlossless = true").unwrap();
        let overlay: toml::Value = toml::from_str("[webp]\nlossless = false").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["webp"]["quality"].as_integer(), Some(80));
        assert_eq!(merged["webp"]["lossless"].as_bool(), Some(false));
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let s = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[common]\nrecursive = true\n[webp]\nquality = 55\n");
        let s = load_config(&path).unwrap();
        assert!(s.common.recursive);
        assert_eq!(s.webp.quality, 55.0);
        assert!(s.webp.lossless);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[common\nformat = ");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[avif]\nquality = 400\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn resolve_config_applies_overlays_in_order() {
        let file: toml::Value = toml::from_str("[common]\nformat = \"avif\"").unwrap();
        let cli: toml::Value = toml::from_str("[common]\nformat = \"webp\"").unwrap();
        let s = resolve_config(stock_defaults_value().unwrap(), [file, cli]).unwrap();
        assert_eq!(s.common.format, OutputFormat::Webp);
    }

    // =========================================================================
    // Settings sources
    // =========================================================================

    #[test]
    fn file_settings_without_path_uses_defaults() {
        let s = FileSettings::new(None).snapshot().unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn file_settings_overrides_beat_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[common]\nformat = \"avif\"\nrecursive = true\n");
        let overrides: toml::Value = toml::from_str("[common]\nformat = \"webp\"").unwrap();

        let s = FileSettings::new(Some(path))
            .with_overrides(overrides)
            .snapshot()
            .unwrap();
        assert_eq!(s.common.format, OutputFormat::Webp);
        assert!(s.common.recursive);
    }

    #[test]
    fn file_settings_rereads_on_every_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[common]\nformat = \"webp\"\n");
        let source = FileSettings::new(Some(path.clone()));

        assert_eq!(source.snapshot().unwrap().common.format, OutputFormat::Webp);
        fs::write(&path, "[common]\nformat = \"avif\"\n").unwrap();
        assert_eq!(source.snapshot().unwrap().common.format, OutputFormat::Avif);
    }

    #[test]
    fn static_settings_returns_clone() {
        let mut inner = Settings::default();
        inner.common.overwrite = true;
        let s = StaticSettings(inner.clone()).snapshot().unwrap();
        assert_eq!(s, inner);
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let s: Settings = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        for section in ["common", "webp", "avif", "notifications"] {
            assert!(table.contains_key(section), "missing [{section}]");
        }
    }

    #[test]
    fn default_config_path_ends_with_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("dropconv/config.toml"));
        }
    }
}

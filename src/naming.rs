//! Output file naming.
//!
//! The extension of the source name (text after the last dot) is stripped
//! once and the lowercase target extension appended:
//!
//! - `photo.JPG` → `photo.webp`
//! - `holiday.final.png` → `holiday.final.avif`
//! - `scan` → `scan.webp`
//! - `.png` → `.png.webp` (a leading dot is part of the stem)
//!
//! The output lands beside the source, or in the configured output directory.

use crate::imaging::OutputFormat;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Output file name for `source` in `format`.
///
/// Works on the raw `OsStr`, so names that are not valid UTF-8 survive.
pub fn output_file_name(source: &Path, format: OutputFormat) -> OsString {
    let mut name = source.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(format.extension());
    name
}

/// Full destination path for `source`.
///
/// With `output_dir = None` the output goes beside the source.
pub fn destination_path(source: &Path, format: OutputFormat, output_dir: Option<&Path>) -> PathBuf {
    let name = output_file_name(source, format);
    match output_dir.or_else(|| source.parent()) {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Suggested name for the `index`-th pasted image (1-based).
pub fn pasted_file_name(index: usize, format: OutputFormat) -> String {
    format!("pasted-image-{index}.{}", format.extension())
}

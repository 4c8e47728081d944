//! Path/file collector.
//!
//! Turns a mixed list of files and directories into the flat list of image
//! files a batch will convert. Inputs are resolved in order:
//!
//! 1. An input whose own name matches the [`ExtensionPattern`] is taken as-is,
//!    without an existence check.
//! 2. Anything else is listed as a directory. Matching files directly inside
//!    it come first, in listing order; with `recursive` each subdirectory is
//!    then descended into, also in listing order.
//!
//! A non-matching regular file contributes nothing. Any other listing failure
//! (missing path, permission denied) is returned to the caller.

use crate::fs::{FileSystem, FsError, parse_path};
use std::path::{Path, PathBuf};

/// Extensions the converter recognises as image inputs.
///
/// HEIC/HEIF and JPEG 2000 are listed so they surface as visible failures
/// rather than being silently ignored.
pub const BASE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "heic", "heif", "jp2", "j2k",
];

/// Filter offered by the native multi-file picker.
pub const DIALOG_EXTENSIONS: &[&str] = &[
    "png", "jpeg", "jpg", "tif", "tiff", "gif", "bmp", "heic", "heif", "jp2", "j2k",
];

/// Case-insensitive set of recognised extensions.
///
/// Built from a settings snapshot and thrown away afterwards; never cache
/// one across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPattern {
    extensions: Vec<&'static str>,
}

impl ExtensionPattern {
    pub fn new(ignore_jpeg: bool) -> Self {
        let extensions = BASE_EXTENSIONS
            .iter()
            .copied()
            .filter(|ext| !(ignore_jpeg && matches!(*ext, "jpg" | "jpeg")))
            .collect();
        Self { extensions }
    }

    /// Whether the final segment of `path` ends in a recognised extension.
    pub fn matches(&self, path: &Path) -> bool {
        let parts = parse_path(path);
        if parts.extension.is_empty() {
            return false;
        }
        let ext = parts.extension.to_ascii_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }
}

impl Default for ExtensionPattern {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Resolve `inputs` into the ordered list of image files to convert.
pub fn collect_files(
    fs: &dyn FileSystem,
    inputs: &[PathBuf],
    pattern: &ExtensionPattern,
    recursive: bool,
) -> Result<Vec<PathBuf>, FsError> {
    let mut files = Vec::new();
    for input in inputs {
        if pattern.matches(input) {
            files.push(input.clone());
            continue;
        }
        match collect_dir(fs, input, pattern, recursive, &mut files) {
            Ok(()) => {}
            Err(FsError::NotADirectory(path)) => {
                tracing::debug!(path = %path.display(), "not an image or directory, ignored");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(files)
}

fn collect_dir(
    fs: &dyn FileSystem,
    dir: &Path,
    pattern: &ExtensionPattern,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> Result<(), FsError> {
    let entries = fs.list_dir(dir)?;
    tracing::debug!(dir = %dir.display(), entries = entries.len(), "collecting");

    let mut subdirs = Vec::new();
    for entry in &entries {
        let path = dir.join(&entry.name);
        if entry.is_file && pattern.matches(&path) {
            files.push(path);
        } else if entry.is_dir && recursive {
            subdirs.push(path);
        }
    }
    for sub in subdirs {
        collect_dir(fs, &sub, pattern, recursive, files)?;
    }
    Ok(())
}

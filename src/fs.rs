//! Binary I/O gateway.
//!
//! Every byte the converter reads or writes goes through the [`FileSystem`]
//! trait. The production implementation is [`StdFileSystem`]; tests use the
//! in-memory [`tests::MemoryFileSystem`] so batch logic can be exercised
//! without touching disk.
//!
//! | Operation | Failure |
//! |---|---|
//! | [`read`](FileSystem::read) | [`FsError::NotFound`] when absent, [`FsError::Io`] otherwise |
//! | [`save`](FileSystem::save) | [`FsError::Io`]; a failed save leaves the target undefined |
//! | [`exists`](FileSystem::exists) | never fails; probe errors read as "absent" |
//! | [`delete`](FileSystem::delete) | [`FsError::Io`]; a missing target is success |
//! | [`list_dir`](FileSystem::list_dir) | [`FsError::NotFound`], [`FsError::NotADirectory`], [`FsError::Io`] |
//!
//! [`parse_path`] is pure string work and lives here as a free function.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf, is_separator};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path.to_path_buf())
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// One entry of a directory listing.
///
/// `name` is the raw file name, so joining it back onto the listed directory
/// always reaches the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub is_file: bool,
    pub is_dir: bool,
}

/// Filesystem primitives the converter depends on.
///
/// `Sync` so a single gateway can be shared with the printer/signal threads
/// of the binary.
pub trait FileSystem: Sync {
    /// Read the whole file into memory.
    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Create or overwrite `path` with `bytes`.
    fn save(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError>;

    /// Whether `path` exists. Errors while probing count as "no".
    fn exists(&self, path: &Path) -> bool;

    /// Remove a file. Deleting something that is already gone succeeds.
    fn delete(&self, path: &Path) -> Result<(), FsError>;

    /// Direct children of a directory, in a stable order.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;
}

/// Components of a path as the converter sees them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParts {
    /// Last segment, extension included.
    pub file_name: String,
    /// Text after the last dot of `file_name`; empty when there is none.
    pub extension: String,
    /// Everything before the final separator; empty for a bare name.
    pub parent_dir: String,
}

/// Split a path into file name, extension and parent directory.
///
/// The parts are lossy UTF-8, fit for display and extension matching. Build
/// paths from `Path` methods instead.
///
/// - `/photos/IMG_1.JPG` → (`IMG_1.JPG`, `JPG`, `/photos`)
/// - `notes` → (`notes`, ``, ``)
/// - `/root.png` → (`root.png`, `png`, `/`)
pub fn parse_path(path: &Path) -> PathParts {
    let text = path.to_string_lossy();
    let (parent_dir, file_name) = match text.rfind(is_separator) {
        // A leading separator is the root itself, not an empty parent.
        Some(0) => (text[..1].to_string(), text[1..].to_string()),
        Some(pos) => (text[..pos].to_string(), text[pos + 1..].to_string()),
        None => (String::new(), text.to_string()),
    };
    let extension = file_name
        .rfind('.')
        .map(|dot| file_name[dot + 1..].to_string())
        .unwrap_or_default();
    PathParts {
        file_name,
        extension,
        parent_dir,
    }
}

/// Gateway backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl StdFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for StdFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        match std::fs::read(path) {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "read");
                Ok(bytes)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "read failed");
                Err(FsError::from_io(path, e))
            }
        }
    }

    fn save(&self, path: &Path, bytes: &[u8]) -> Result<(), FsError> {
        match std::fs::write(path, bytes) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved");
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "save failed");
                // A missing parent directory is still a write failure, not a
                // missing source.
                Err(FsError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn delete(&self, path: &Path) -> Result<(), FsError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let meta = std::fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(path.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk failed"));
                FsError::from_io(path, source)
            })?;
            let file_type = entry.file_type();
            entries.push(DirEntry {
                name: entry.file_name().to_os_string(),
                is_file: file_type.is_file(),
                is_dir: file_type.is_dir(),
            });
        }
        tracing::debug!(path = %path.display(), entries = entries.len(), "listed");
        Ok(entries)
    }
}

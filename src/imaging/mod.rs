//! Image encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` (JPEG, PNG, GIF, TIFF, BMP, WebP) |
//! | **Encode → WebP** | `webp` (libwebp) |
//! | **Encode → AVIF** | `ravif` (rav1e) |
//! | **Identify output** | `image` / `avif-parse` |
//!
//! The module is split into:
//! - **Options**: what to produce ([`EncodeOptions`] and its parts)
//! - **Backend**: the [`EncodeBackend`] trait, the seam the orchestrator mocks
//! - **Rust backend**: [`RustEncoder`], the production implementation

pub mod backend;
mod options;
pub mod rust_backend;

pub use backend::{EncodeBackend, EncodeError};
pub use options::{
    AlphaColorMode, AvifOptions, BitDepth, ColorModel, EncodeOptions, OutputFormat, WebpOptions,
};
pub use rust_backend::{RustEncoder, identify};

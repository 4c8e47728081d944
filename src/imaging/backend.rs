//! Encode backend trait and error type.
//!
//! The [`EncodeBackend`] trait is the seam between the batch orchestrator and
//! the codec. It receives raw source bytes and one [`EncodeOptions`] value and
//! returns the encoded file bytes. It never touches the filesystem: callers
//! read input and persist output through the [`fs`](crate::fs) gateway.
//!
//! The production implementation is
//! [`RustEncoder`](super::rust_backend::RustEncoder). Encoding can take
//! hundreds of milliseconds per image, so callers keep it off any thread that
//! has to stay responsive.

use super::options::EncodeOptions;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported input format: {0}")]
    UnsupportedInput(String),
    #[error("Invalid encode options: {0}")]
    InvalidOptions(String),
    #[error("Failed to encode image: {0}")]
    Backend(String),
}

/// Converts raw image bytes into the requested output format.
pub trait EncodeBackend: Sync {
    fn encode(&self, bytes: &[u8], options: &EncodeOptions) -> Result<Vec<u8>, EncodeError>;
}

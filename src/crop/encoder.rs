//! Crop encoder trait and shared types.
//!
//! The [`CropEncoder`] trait is the seam between the session (which decides
//! *when* and *what* to render) and the pixel work (copying the crop out of
//! the source and encoding it). The production implementation is
//! [`RustEncoder`](super::render::RustEncoder); tests substitute recording or
//! gated encoders to observe calls and to hold a render in flight.

use super::geometry::CropPixelRect;
use super::params::OutputEncoding;
use super::source::SourceImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The chosen file is not a decodable image.
    #[error("Decode failed: {0}")]
    Decode(String),
    /// The surface could not be created or the encoder produced nothing.
    /// Recoverable: the user can adjust and try again.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl CropError {
    /// Whether the session can stay open and the user retry the commit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CropError::Encoding(_))
    }
}

/// An encoded crop, ready for the upload step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Renders a crop rectangle of a source image into encoded bytes.
///
/// Implementations run on a worker thread while the session stays responsive,
/// hence `Send + Sync`.
pub trait CropEncoder: Send + Sync {
    fn encode(
        &self,
        source: &SourceImage,
        rect: CropPixelRect,
        encoding: OutputEncoding,
    ) -> Result<EncodedImage, CropError>;
}

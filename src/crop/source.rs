//! Decoded source rasters.
//!
//! A [`SourceImage`] is immutable once loaded. The crop session owns it and
//! shares it read-only (behind an `Arc`) with an in-flight render.

use super::encoder::CropError;
use super::geometry::{CropPixelRect, Dimensions, ViewportState, compute_crop_rect};
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// In-memory decoded raster with its natural (pixel) size.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: DynamicImage,
}

impl SourceImage {
    /// Decode an image from raw file bytes, guessing the format from content.
    pub fn decode(bytes: &[u8]) -> Result<Self, CropError> {
        let pixels = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(CropError::Io)?
            .decode()
            .map_err(|e| CropError::Decode(format!("not a decodable image: {e}")))?;
        Ok(Self::from_image(pixels))
    }

    /// Load and decode an image from disk.
    pub fn open(path: &Path) -> Result<Self, CropError> {
        let pixels = ImageReader::open(path)
            .map_err(CropError::Io)?
            .with_guessed_format()
            .map_err(CropError::Io)?
            .decode()
            .map_err(|e| {
                CropError::Decode(format!("Failed to decode {}: {}", path.display(), e))
            })?;
        Ok(Self::from_image(pixels))
    }

    pub fn from_image(pixels: DynamicImage) -> Self {
        Self { pixels }
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.natural_width(), self.natural_height())
    }

    /// The rectangle a viewport addresses on this image.
    pub fn crop_rect(&self, viewport: &ViewportState) -> CropPixelRect {
        compute_crop_rect(viewport, self.dimensions())
    }

    pub(crate) fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, gradient_image};

    #[test]
    fn decode_png_bytes() {
        let bytes = encode_png(&gradient_image(64, 48));
        let source = SourceImage::decode(&bytes).unwrap();
        assert_eq!(source.dimensions(), Dimensions::new(64, 48));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let result = SourceImage::decode(b"definitely not an image");
        assert!(matches!(result, Err(CropError::Decode(_))));
    }

    #[test]
    fn decode_empty_is_decode_error() {
        assert!(matches!(SourceImage::decode(&[]), Err(CropError::Decode(_))));
    }

    #[test]
    fn open_reads_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("avatar.png");
        std::fs::write(&path, encode_png(&gradient_image(30, 20))).unwrap();

        let source = SourceImage::open(&path).unwrap();
        assert_eq!(source.natural_width(), 30);
        assert_eq!(source.natural_height(), 20);
    }

    #[test]
    fn open_nonexistent_file_is_io_error() {
        let result = SourceImage::open(Path::new("/nonexistent/avatar.png"));
        assert!(matches!(result, Err(CropError::Io(_))));
    }

    #[test]
    fn crop_rect_uses_natural_dimensions() {
        let source = SourceImage::from_image(gradient_image(200, 100));
        let rect = source.crop_rect(&ViewportState::new(1.0));
        assert_eq!(rect, CropPixelRect::new(50, 0, 100, 100));
    }
}

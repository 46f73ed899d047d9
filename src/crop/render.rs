//! Crop rendering with the `image` crate, pure Rust, statically linked.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Surface | `DynamicImage::crop_imm` (owned copy of the crop, no scaling) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB8, quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! The output resolution always equals the crop rectangle's pixel size, so
//! the upload keeps the source's pixel density.

use super::encoder::{CropEncoder, CropError, EncodedImage};
use super::geometry::CropPixelRect;
use super::params::{OutputEncoding, OutputFormat};
use super::source::SourceImage;
use image::DynamicImage;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

/// Production encoder over the `image` crate.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CropEncoder for RustEncoder {
    fn encode(
        &self,
        source: &SourceImage,
        rect: CropPixelRect,
        encoding: OutputEncoding,
    ) -> Result<EncodedImage, CropError> {
        render_crop(source, rect, encoding)
    }
}

/// Draw the sub-image addressed by `rect` onto a fresh surface and encode it.
///
/// Fails with [`CropError::Encoding`] when the surface cannot be created
/// (empty rect, rect outside the source) or the encoder yields no data.
pub fn render_crop(
    source: &SourceImage,
    rect: CropPixelRect,
    encoding: OutputEncoding,
) -> Result<EncodedImage, CropError> {
    let surface = Surface::acquire(source, rect)?;
    surface.encode(encoding)
}

/// Off-screen raster sized exactly to the crop rectangle.
///
/// Owned for the duration of one render; its buffer is freed when it goes out
/// of scope, whichever way the render ends.
struct Surface {
    pixels: DynamicImage,
}

impl Surface {
    fn acquire(source: &SourceImage, rect: CropPixelRect) -> Result<Self, CropError> {
        if rect.is_empty() {
            return Err(CropError::Encoding(format!(
                "cannot create a {}x{} surface",
                rect.width, rect.height
            )));
        }
        let natural = source.dimensions();
        if !rect.fits_within(natural) {
            return Err(CropError::Encoding(format!(
                "crop {}x{}+{}+{} exceeds source {}x{}",
                rect.width, rect.height, rect.x, rect.y, natural.width, natural.height
            )));
        }
        let pixels = source
            .pixels()
            .crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(Self { pixels })
    }

    fn encode(self, encoding: OutputEncoding) -> Result<EncodedImage, CropError> {
        let width = self.pixels.width();
        let height = self.pixels.height();
        let quality = encoding.quality.as_u8();
        let mut bytes = Vec::new();

        let written = match encoding.format {
            // JPEG has no alpha channel
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(self.pixels.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality)),
            OutputFormat::Png => self.pixels.write_with_encoder(PngEncoder::new(&mut bytes)),
            OutputFormat::Webp => DynamicImage::ImageRgba8(self.pixels.to_rgba8())
                .write_with_encoder(WebPEncoder::new_lossless(&mut bytes)),
            OutputFormat::Avif => DynamicImage::ImageRgba8(self.pixels.to_rgba8())
                .write_with_encoder(AvifEncoder::new_with_speed_quality(&mut bytes, 6, quality)),
        };
        written.map_err(|e| CropError::Encoding(format!("{} encode failed: {e}", encoding.format)))?;

        if bytes.is_empty() {
            return Err(CropError::Encoding(format!(
                "{} encoder produced no data",
                encoding.format
            )));
        }

        Ok(EncodedImage {
            bytes,
            mime_type: encoding.mime_type(),
            width,
            height,
        })
    }
}

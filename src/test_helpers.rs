//! Shared test utilities for the profile-media test suite.
//!
//! Images are generated in code rather than read from fixtures, so every test
//! knows exactly which pixel sits where.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient_image(64, 48);
//! let bytes = encode_png(&img);
//! let source = SourceImage::decode(&bytes).unwrap();
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image whose pixel `(x, y)` is `[x % 256, y % 256, 128]`.
///
/// Lets crop tests check which source pixel ended up at the output origin.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Encode an image as PNG bytes, the way a file picker would hand them over.
pub fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

//! Parameter types for crop output.
//!
//! These describe *what* the encoded crop should look like, not *how* it is
//! produced. The session and the CLI build an [`OutputEncoding`] from config;
//! the [`encoder`](super::encoder) turns pixels into bytes according to it.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 92). Clamped on construction.
//! - [`OutputFormat`]: container/codec of the encoded blob.
//! - [`OutputEncoding`]: format + quality, with the MIME type handed to the uploader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the `image` encoders take.
    pub(crate) fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    /// Matches the canvas `toBlob` default of 0.92.
    fn default() -> Self {
        Self(92)
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless WebP; the `image` crate has no lossy WebP encoder.
    Webp,
    Avif,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// Whether the encoder honors [`Quality`].
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Avif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(format!(
                "unknown output format '{other}' (expected jpeg, png, webp or avif)"
            )),
        }
    }
}

/// Format and quality for one rendered crop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputEncoding {
    pub format: OutputFormat,
    pub quality: Quality,
}

impl OutputEncoding {
    pub fn new(format: OutputFormat, quality: Quality) -> Self {
        Self { format, quality }
    }

    pub fn mime_type(self) -> &'static str {
        self.format.mime_type()
    }
}

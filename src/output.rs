//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! Plain mode prints one resolved URL per input line, empty for references
//! that resolve to nothing, so it can be piped. `--explain` shows each input
//! with its classification:
//!
//! ```text
//! 001 http://localhost:8080/uploads/a.png
//!     legacy-absolute → /uploads/a.png
//! 002 https://cdn.example.com/x.png
//!     direct → https://cdn.example.com/x.png
//! 003 (empty)
//!     none
//! ```
//!
//! ## Crop
//!
//! ```text
//! Source: photo.jpg (4032x3024)
//!     Target: avatar (1:1)
//!     Crop: 3024x3024 at (504, 0)
//! Output: avatar.jpg
//!     image/jpeg, 3024x3024, 812345 bytes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O.

use crate::crop::{CropPixelRect, Dimensions, EncodedImage};
use crate::media::MediaReference;
use crate::types::MediaTarget;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Resolve
// ============================================================================

/// One line per input: the resolved URL, or an empty line for none.
pub fn format_resolutions(results: &[Option<MediaReference<'_>>]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.map(|r| r.canonical().to_string()).unwrap_or_default())
        .collect()
}

/// Each input with its classification and result.
pub fn format_explained_resolutions(
    inputs: &[&str],
    results: &[Option<MediaReference<'_>>],
) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (raw, result)) in inputs.iter().zip(results).enumerate() {
        let shown = if raw.is_empty() { "(empty)" } else { raw };
        lines.push(format!("{} {}", format_index(i + 1), shown));
        match result {
            Some(r) => lines.push(format!("{}{} → {}", indent(1), r.kind(), r.canonical())),
            None => lines.push(format!("{}none", indent(1))),
        }
    }
    lines
}

pub fn print_resolutions(inputs: &[&str], results: &[Option<MediaReference<'_>>], explain: bool) {
    let lines = if explain {
        format_explained_resolutions(inputs, results)
    } else {
        format_resolutions(results)
    };
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Crop
// ============================================================================

/// Inputs and results of one crop.
pub struct CropReport<'a> {
    pub source_path: &'a Path,
    pub natural: Dimensions,
    pub target: MediaTarget,
    pub ratio: [u32; 2],
    pub rect: CropPixelRect,
    pub output_path: &'a Path,
    pub blob: &'a EncodedImage,
}

pub fn format_crop_output(report: &CropReport<'_>) -> Vec<String> {
    vec![
        format!(
            "Source: {} ({}x{})",
            report.source_path.display(),
            report.natural.width,
            report.natural.height
        ),
        format!(
            "{}Target: {} ({}:{})",
            indent(1),
            report.target,
            report.ratio[0],
            report.ratio[1]
        ),
        format!(
            "{}Crop: {}x{} at ({}, {})",
            indent(1),
            report.rect.width,
            report.rect.height,
            report.rect.x,
            report.rect.y
        ),
        format!("Output: {}", report.output_path.display()),
        format!(
            "{}{}, {}x{}, {} bytes",
            indent(1),
            report.blob.mime_type,
            report.blob.width,
            report.blob.height,
            report.blob.len()
        ),
    ]
}

pub fn print_crop_output(report: &CropReport<'_>) {
    for line in format_crop_output(report) {
        println!("{}", line);
    }
}

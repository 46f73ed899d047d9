//! Interactive cropping: pan/zoom geometry and encoded output.
//!
//! | Step | Where |
//! |---|---|
//! | **Geometry** | [`compute_crop_rect`]: viewport → source pixel rectangle (pure) |
//! | **Decode** | [`SourceImage`]: `image` crate, format guessed from content |
//! | **Render** | [`render_crop`]: crop-sized surface → JPEG / PNG / WebP / AVIF |
//! | **Session** | [`CropSession`]: load → adjust → commit state machine |
//!
//! The module is split into:
//! - **Geometry**: Pure functions for crop math (unit testable)
//! - **Parameters**: Output format and quality
//! - **Encoder**: [`CropEncoder`] trait + [`RustEncoder`]
//! - **Session**: One edit dialog's state, cancellation included

pub mod encoder;
mod geometry;
mod params;
pub mod render;
pub mod session;
mod source;

pub use encoder::{CropEncoder, CropError, EncodedImage};
pub use geometry::{
    CropPixelRect, Dimensions, DisplaySize, Pan, ViewportState, aspect_from_ratio,
    compute_crop_rect,
};
pub use params::{OutputEncoding, OutputFormat, Quality};
pub use render::{RustEncoder, render_crop};
pub use session::{CommitOutcome, CropSession, PendingRender, SessionError, SessionState};
pub use source::SourceImage;

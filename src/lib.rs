//! # Profile Media
//!
//! The media core of a profile/social web front end: cropping a picked image
//! to the shape of an avatar, banner or post picture, and turning whatever a
//! stored media reference happens to contain into one URL the browser can
//! fetch.
//!
//! # Architecture: Two Independent Components
//!
//! ```text
//! crop    image bytes + pan/zoom  →  CropPixelRect  →  encoded blob  → (upload, external)
//! media   stored reference string →  classification →  fetchable URL
//! ```
//!
//! The two never exchange data. They meet only at call sites: an edit dialog
//! shows the current avatar through the resolver, crops a new one, and the
//! excluded upload step turns the blob into a new stored reference.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`crop`] | Crop geometry, rendering/encoding, and the edit-session state machine |
//! | [`media`] | Stored-reference classification and resolution |
//! | [`config`] | `config.toml` loading, env override, validation, stock config |
//! | [`types`] | Media fields of API responses, media targets |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Geometry Is Pure, Rounded Once
//!
//! [`crop::compute_crop_rect`] is a pure function of the viewport and the
//! source size. Degenerate input is clamped rather than rejected, and values
//! are rounded to whole pixels only when the final rectangle is built, so a
//! long drag does not accumulate drift.
//!
//! ## Output Resolution Equals the Crop
//!
//! The rendered blob is exactly `rect.width × rect.height`. Downscaling for
//! display is the job of whoever serves the image, not of the crop.
//!
//! ## Explicit Sessions, Generation-Checked Renders
//!
//! Each edit dialog owns a [`crop::CropSession`]. Encoding runs on the rayon
//! pool so the dialog stays responsive; every render ticket carries the
//! session generation, and a result from a cancelled or superseded session is
//! discarded instead of applied.
//!
//! ## Resolution Never Fails
//!
//! [`media::resolve`] is total. A reference it does not understand is passed
//! through unchanged: a broken image is better than a profile page that fails
//! to render because of one odd legacy record.
//!
//! ## Legacy Origins Are Configuration
//!
//! Absolute URLs under old API hosts are rewritten through a single
//! `api.legacy_origins` list rather than hard-coded literals, so the rule can
//! be dropped once stored data is migrated.

pub mod config;
pub mod crop;
pub mod media;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

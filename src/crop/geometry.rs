//! Pure crop geometry: viewport state in, source pixel rectangle out.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Model
//!
//! At zoom 1 the crop frame is the largest rectangle of the target aspect that
//! fits inside the source. Zooming divides the frame size by `zoom`. Panning
//! moves the image under the frame; a pan of `+x` display units drags the
//! image right, which moves the frame's source center left by
//!
//! ```text
//! x × (natural_width / display_width) / zoom
//! ```
//!
//! Everything stays in `f64` until [`compute_crop_rect`] builds the final
//! [`CropPixelRect`]; that is the only place values are rounded, so repeated
//! pan events never accumulate rounding drift.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Offset of the image inside the crop viewport, in display units.
///
/// `(0, 0)` is centered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

impl Pan {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size the whole source image is drawn at when zoom is 1, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Interactive pan/zoom state of one crop session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub pan: Pan,
    /// Scalar ≥ 1. Values below 1 are treated as 1.
    pub zoom: f64,
    /// Width / height of the crop frame. Fixed for the session.
    pub target_aspect: f64,
    /// `None` means one display unit per source pixel.
    pub display: Option<DisplaySize>,
}

impl ViewportState {
    /// Centered, unzoomed viewport for the given aspect.
    pub fn new(target_aspect: f64) -> Self {
        Self {
            pan: Pan::default(),
            zoom: 1.0,
            target_aspect,
            display: None,
        }
    }

    pub fn with_display(mut self, display: DisplaySize) -> Self {
        self.display = Some(display);
        self
    }

    /// Bring zoom into `[1, max_zoom]` and pan into the range where the crop
    /// frame still lies inside the source.
    ///
    /// [`compute_crop_rect`] clamps on its own; normalizing the stored state as
    /// well keeps a drag past the edge from building up an overshoot the user
    /// would have to drag back through.
    pub fn normalized(&self, natural: Dimensions, max_zoom: Option<f64>) -> ViewportState {
        let mut zoom = effective_zoom(self.zoom);
        if let Some(max) = max_zoom.filter(|m| m.is_finite() && *m >= 1.0) {
            zoom = zoom.min(max);
        }
        if natural.is_empty() {
            return ViewportState {
                pan: Pan::default(),
                zoom,
                ..*self
            };
        }

        let aspect = effective_aspect(self.target_aspect, natural);
        let (frame_w, frame_h) = frame_size(aspect, natural, zoom);
        let (scale_x, scale_y) = display_scale(self.display, natural);

        let max_pan_x = slack(natural.width, frame_w) / 2.0 * zoom / scale_x;
        let max_pan_y = slack(natural.height, frame_h) / 2.0 * zoom / scale_y;

        ViewportState {
            pan: Pan {
                x: finite_or_zero(self.pan.x).clamp(-max_pan_x, max_pan_x),
                y: finite_or_zero(self.pan.y).clamp(-max_pan_y, max_pan_y),
            },
            zoom,
            ..*self
        }
    }
}

/// Crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropPixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropPixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Whether the rectangle lies entirely inside an image of the given size.
    pub fn fits_within(&self, natural: Dimensions) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(natural.width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(natural.height)
    }
}

/// Compute the source rectangle addressed by a viewport.
///
/// Never fails. Degenerate input is corrected rather than rejected:
/// - `zoom < 1` or non-finite → 1
/// - non-finite pan → centered on that axis
/// - non-positive or non-finite aspect → the source's own aspect
/// - a pan that would push the frame outside the source → frame clamped to the edge
///
/// A zero-area source yields an empty rectangle, which rendering rejects.
///
/// # Examples
/// ```
/// # use profile_media::crop::{compute_crop_rect, CropPixelRect, Dimensions, ViewportState};
/// // Square crop of a 4:3 landscape, centered → 600x600 at x=100
/// let rect = compute_crop_rect(&ViewportState::new(1.0), Dimensions::new(800, 600));
/// assert_eq!(rect, CropPixelRect::new(100, 0, 600, 600));
/// ```
pub fn compute_crop_rect(viewport: &ViewportState, natural: Dimensions) -> CropPixelRect {
    if natural.is_empty() {
        return CropPixelRect::default();
    }

    let nat_w = natural.width as f64;
    let nat_h = natural.height as f64;
    let aspect = effective_aspect(viewport.target_aspect, natural);
    let zoom = effective_zoom(viewport.zoom);
    let (frame_w, frame_h) = frame_size(aspect, natural, zoom);
    let (scale_x, scale_y) = display_scale(viewport.display, natural);

    let center_x = nat_w / 2.0 - finite_or_zero(viewport.pan.x) * scale_x / zoom;
    let center_y = nat_h / 2.0 - finite_or_zero(viewport.pan.y) * scale_y / zoom;

    let raw_x = center_x - frame_w / 2.0;
    let raw_y = center_y - frame_h / 2.0;
    let x = raw_x.clamp(0.0, slack(natural.width, frame_w));
    let y = raw_y.clamp(0.0, slack(natural.height, frame_h));
    if x != raw_x || y != raw_y {
        log::trace!("crop frame clamped from ({raw_x:.2}, {raw_y:.2}) to ({x:.2}, {y:.2})");
    }

    // Single rounding step. Height follows the rounded width so the ratio
    // error stays under one pixel of height.
    let mut width = (frame_w.round() as u32).clamp(1, natural.width);
    let mut height = ((width as f64 / aspect).round() as u32).max(1);
    if height > natural.height {
        // Rounding the width up overshot a height-limited frame. Take the
        // widest width whose derived height still fits.
        width = ((natural.height as f64 * aspect).floor() as u32).clamp(1, natural.width);
        height = ((width as f64 / aspect).round() as u32).clamp(1, natural.height);
    }

    CropPixelRect {
        x: (x.round() as u32).min(natural.width - width),
        y: (y.round() as u32).min(natural.height - height),
        width,
        height,
    }
}

/// Aspect ratio from a `[width, height]` pair as written in config.
pub fn aspect_from_ratio(ratio: [u32; 2]) -> f64 {
    ratio[0] as f64 / ratio[1] as f64
}

fn effective_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > 1.0 {
        zoom
    } else {
        1.0
    }
}

fn effective_aspect(aspect: f64, natural: Dimensions) -> f64 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        natural.aspect()
    }
}

/// Room left for the frame to move along one axis. Never negative, so it is
/// always a valid `clamp` bound even when float error makes the frame a hair
/// larger than the source.
fn slack(natural: u32, frame: f64) -> f64 {
    (natural as f64 - frame).max(0.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Frame size in source pixels: largest `aspect` rectangle inside the source,
/// shrunk by `zoom`.
fn frame_size(aspect: f64, natural: Dimensions, zoom: f64) -> (f64, f64) {
    let nat_w = natural.width as f64;
    let nat_h = natural.height as f64;

    let (w, h) = if nat_w / nat_h > aspect {
        // Source is wider: height is the limit
        (nat_h * aspect, nat_h)
    } else {
        // Source is taller (or equal): width is the limit
        (nat_w, nat_w / aspect)
    };
    (w / zoom, h / zoom)
}

/// Source pixels per display unit on each axis.
fn display_scale(display: Option<DisplaySize>, natural: Dimensions) -> (f64, f64) {
    let axis = |natural: u32, shown: f64| {
        if shown.is_finite() && shown > 0.0 {
            natural as f64 / shown
        } else {
            1.0
        }
    };
    match display {
        Some(d) => (axis(natural.width, d.width), axis(natural.height, d.height)),
        None => (1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDSCAPE: Dimensions = Dimensions {
        width: 800,
        height: 600,
    };

    fn square() -> ViewportState {
        ViewportState::new(1.0)
    }

    // =========================================================================
    // compute_crop_rect: centered and zoomed
    // =========================================================================

    #[test]
    fn centered_square_on_landscape() {
        let rect = compute_crop_rect(&square(), LANDSCAPE);
        assert_eq!(rect, CropPixelRect::new(100, 0, 600, 600));
    }

    #[test]
    fn centered_landscape_banner_on_portrait() {
        // 3:1 on 600x800 → width limited: 600x200, centered vertically
        let vp = ViewportState::new(3.0);
        let rect = compute_crop_rect(&vp, Dimensions::new(600, 800));
        assert_eq!(rect, CropPixelRect::new(0, 300, 600, 200));
    }

    #[test]
    fn zoom_shrinks_frame_around_center() {
        let vp = ViewportState {
            zoom: 2.0,
            ..square()
        };
        let rect = compute_crop_rect(&vp, LANDSCAPE);
        assert_eq!(rect, CropPixelRect::new(250, 150, 300, 300));
    }

    #[test]
    fn zoom_below_one_is_treated_as_one() {
        let vp = ViewportState {
            zoom: 0.25,
            ..square()
        };
        assert_eq!(
            compute_crop_rect(&vp, LANDSCAPE),
            compute_crop_rect(&square(), LANDSCAPE)
        );
    }

    #[test]
    fn non_finite_zoom_is_treated_as_one() {
        let vp = ViewportState {
            zoom: f64::NAN,
            ..square()
        };
        assert_eq!(
            compute_crop_rect(&vp, LANDSCAPE),
            compute_crop_rect(&square(), LANDSCAPE)
        );
    }

    #[test]
    fn invalid_aspect_falls_back_to_source_aspect() {
        let vp = ViewportState::new(0.0);
        assert_eq!(
            compute_crop_rect(&vp, LANDSCAPE),
            CropPixelRect::new(0, 0, 800, 600)
        );
    }

    #[test]
    fn rounds_once_at_construction() {
        // 16:9 on 6000x4000 → 6000x3375, y = 312.5 → 313
        let vp = ViewportState::new(16.0 / 9.0);
        let rect = compute_crop_rect(&vp, Dimensions::new(6000, 4000));
        assert_eq!(rect, CropPixelRect::new(0, 313, 6000, 3375));
    }

    // =========================================================================
    // compute_crop_rect: panning
    // =========================================================================

    #[test]
    fn pan_right_moves_frame_left_in_source() {
        let vp = ViewportState {
            zoom: 2.0,
            pan: Pan::new(100.0, 0.0),
            ..square()
        };
        // 100 display units at scale 1, zoom 2 → 50 source px
        let rect = compute_crop_rect(&vp, LANDSCAPE);
        assert_eq!(rect, CropPixelRect::new(200, 150, 300, 300));
    }

    #[test]
    fn pan_uses_display_scale_per_axis() {
        // Displayed at half size → 2 source px per display unit
        let vp = ViewportState {
            zoom: 2.0,
            pan: Pan::new(50.0, -25.0),
            ..square()
        }
        .with_display(DisplaySize::new(400.0, 300.0));
        let rect = compute_crop_rect(&vp, LANDSCAPE);
        // x: 250 - 50*2/2 = 200; y: 150 + 25*2/2 = 175
        assert_eq!(rect, CropPixelRect::new(200, 175, 300, 300));
    }

    #[test]
    fn pan_past_edge_clamps_to_edge() {
        let vp = ViewportState {
            zoom: 2.0,
            pan: Pan::new(10_000.0, -10_000.0),
            ..square()
        };
        let rect = compute_crop_rect(&vp, LANDSCAPE);
        assert_eq!(rect, CropPixelRect::new(0, 300, 300, 300));
        assert!(rect.fits_within(LANDSCAPE));
    }

    #[test]
    fn pan_on_unconstrained_axis_is_clamped_at_zoom_one() {
        // Square on landscape at zoom 1 can move horizontally but not vertically
        let vp = ViewportState {
            pan: Pan::new(0.0, 500.0),
            ..square()
        };
        assert_eq!(
            compute_crop_rect(&vp, LANDSCAPE),
            CropPixelRect::new(100, 0, 600, 600)
        );
    }

    #[test]
    fn non_finite_pan_centers() {
        let vp = ViewportState {
            pan: Pan::new(f64::INFINITY, f64::NAN),
            ..square()
        };
        assert_eq!(
            compute_crop_rect(&vp, LANDSCAPE),
            compute_crop_rect(&square(), LANDSCAPE)
        );
    }

    #[test]
    fn zero_area_source_yields_empty_rect() {
        let rect = compute_crop_rect(&square(), Dimensions::new(0, 600));
        assert!(rect.is_empty());
    }

    #[test]
    fn tiny_source_keeps_one_pixel_minimum() {
        let vp = ViewportState {
            zoom: 50.0,
            ..square()
        };
        let rect = compute_crop_rect(&vp, Dimensions::new(3, 3));
        assert_eq!((rect.width, rect.height), (1, 1));
        assert!(rect.fits_within(Dimensions::new(3, 3)));
    }

    // =========================================================================
    // Properties over a sampled grid
    // =========================================================================

    #[test]
    fn sampled_viewports_keep_aspect_and_containment() {
        let large = [
            Dimensions::new(6000, 4000),
            Dimensions::new(3024, 4032),
            Dimensions::new(4000, 4000),
        ];
        let aspects = [1.0, 16.0 / 9.0, 3.0, 4.0 / 5.0, 9.0 / 16.0, 0.2];
        // Height-limited sources where the rounded width can overshoot
        let tall = [Dimensions::new(1000, 1003), Dimensions::new(1081, 1921)];
        let narrow = [9.0 / 16.0, 0.2];
        let cases = large
            .iter()
            .flat_map(|n| aspects.iter().map(move |a| (*n, *a)))
            .chain(tall.iter().flat_map(|n| narrow.iter().map(move |a| (*n, *a))));
        // Integer rounding bounds the ratio error by 0.5 / height, so the
        // grid stays at crop heights of a few hundred pixels or more.
        let zooms = [1.0, 1.37, 1.8];
        let pans = [-5000.0, -123.4, 0.0, 77.7, 5000.0];

        for (natural, aspect) in cases {
            for zoom in zooms {
                for px in pans {
                    for py in pans {
                        let vp = ViewportState {
                            pan: Pan::new(px, py),
                            zoom,
                            target_aspect: aspect,
                            display: Some(DisplaySize::new(480.0, 360.0)),
                        };
                        let rect = compute_crop_rect(&vp, natural);
                        assert!(
                            rect.fits_within(natural),
                            "{rect:?} escapes {natural:?} for {vp:?}"
                        );
                        let rel = (rect.aspect() - aspect).abs() / aspect;
                        assert!(rel < 1e-3, "aspect off by {rel} for {vp:?} on {natural:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn narrow_aspect_on_height_limited_source_keeps_ratio() {
        // 0.2 × 1003 = 200.6 rounds to 201, whose height (1005) would not fit
        let rect = compute_crop_rect(&ViewportState::new(0.2), Dimensions::new(1000, 1003));
        assert_eq!(rect, CropPixelRect::new(400, 0, 200, 1000));

        let story = compute_crop_rect(&ViewportState::new(9.0 / 16.0), Dimensions::new(1081, 1921));
        assert!(story.fits_within(Dimensions::new(1081, 1921)));
        assert!((story.aspect() - 9.0 / 16.0).abs() / (9.0 / 16.0) < 1e-3, "{story:?}");
    }

    // =========================================================================
    // ViewportState::normalized
    // =========================================================================

    #[test]
    fn normalized_clamps_zoom_to_policy_range() {
        let vp = ViewportState {
            zoom: 12.0,
            ..square()
        };
        assert_eq!(vp.normalized(LANDSCAPE, Some(3.0)).zoom, 3.0);
        assert_eq!(vp.normalized(LANDSCAPE, None).zoom, 12.0);

        let low = ViewportState {
            zoom: 0.5,
            ..square()
        };
        assert_eq!(low.normalized(LANDSCAPE, Some(3.0)).zoom, 1.0);
    }

    #[test]
    fn normalized_pan_reaches_exactly_the_edge() {
        let vp = ViewportState {
            zoom: 2.0,
            pan: Pan::new(10_000.0, 0.0),
            ..square()
        };
        let n = vp.normalized(LANDSCAPE, None);
        // (800 - 300) / 2 * zoom 2 = 500 display units
        assert_eq!(n.pan.x, 500.0);
        assert_eq!(compute_crop_rect(&n, LANDSCAPE).x, 0);
    }

    #[test]
    fn normalized_keeps_rect_unchanged_inside_range() {
        let vp = ViewportState {
            zoom: 2.0,
            pan: Pan::new(40.0, -30.0),
            ..square()
        };
        let n = vp.normalized(LANDSCAPE, Some(4.0));
        assert_eq!(n, vp);
    }

    #[test]
    fn aspect_from_ratio_divides() {
        assert_eq!(aspect_from_ratio([3, 1]), 3.0);
        assert_eq!(aspect_from_ratio([4, 5]), 0.8);
    }
}

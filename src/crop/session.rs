//! Crop session: the state of one edit dialog, from image load to blob.
//!
//! ```text
//!            load                 pan / zoom
//!   Idle ──────────▶ Previewing ─────────────▶ Adjusting ◀─┐
//!    ▲                   │                        │        │ encode failed
//!    │                   └──────── commit ────────┤        │
//!    │                                            ▼        │
//!    └───────────── blob handed over ──────── Committing ──┘
//!
//!   cancel: Previewing | Adjusting | Committing → Idle
//! ```
//!
//! Pan and zoom never fail; out-of-range input is clamped. Only a commit can
//! fail, and a failed commit returns the session to `Adjusting` so the user
//! can retry.
//!
//! ## Cancellation
//!
//! `commit` bumps the session's generation, hands the encode to the rayon
//! pool and returns a [`PendingRender`] ticket stamped with that generation.
//! `cancel` (and loading another image) bumps it again, as does a retry
//! after a failed commit. When a ticket is settled
//! its generation is checked first: a stale result is dropped and reported as
//! [`CommitOutcome::Discarded`], so a render that finishes after the dialog
//! was cancelled can never reach the upload step.

use super::encoder::{CropEncoder, CropError, EncodedImage};
use super::geometry::{CropPixelRect, DisplaySize, Pan, ViewportState, aspect_from_ratio};
use super::params::OutputEncoding;
use super::source::SourceImage;
use crate::config::MediaConfig;
use crate::types::MediaTarget;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Previewing,
    Adjusting,
    /// A render is in flight.
    Committing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Previewing => "previewing",
            SessionState::Adjusting => "adjusting",
            SessionState::Committing => "committing",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error("cannot {action} while {state}")]
    InvalidState {
        state: SessionState,
        action: &'static str,
    },
    #[error("render worker exited without a result")]
    Disconnected,
}

/// What settling a [`PendingRender`] produced.
#[derive(Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The crop is encoded; hand it to the upload step.
    Committed(EncodedImage),
    /// The session was cancelled or moved on; the result was dropped.
    Discarded,
}

/// Ticket for a render started by [`CropSession::commit`].
#[derive(Debug)]
pub struct PendingRender {
    generation: u64,
    rect: CropPixelRect,
    receiver: Receiver<Result<EncodedImage, CropError>>,
}

impl PendingRender {
    /// Rectangle being rendered.
    pub fn rect(&self) -> CropPixelRect {
        self.rect
    }
}

/// One crop edit, owned by the dialog that shows it.
///
/// Sessions share nothing mutable; an avatar edit and a banner edit are two
/// independent values.
pub struct CropSession<E: CropEncoder + 'static> {
    encoder: Arc<E>,
    target_aspect: f64,
    max_zoom: Option<f64>,
    encoding: OutputEncoding,
    state: SessionState,
    source: Option<Arc<SourceImage>>,
    viewport: ViewportState,
    rect: CropPixelRect,
    generation: u64,
}

impl<E: CropEncoder + 'static> CropSession<E> {
    pub fn new(encoder: Arc<E>, target_aspect: f64) -> Self {
        Self {
            encoder,
            target_aspect,
            max_zoom: None,
            encoding: OutputEncoding::default(),
            state: SessionState::Idle,
            source: None,
            viewport: ViewportState::new(target_aspect),
            rect: CropPixelRect::default(),
            generation: 0,
        }
    }

    /// Session for one media field, with aspect, zoom policy and output
    /// encoding taken from config.
    pub fn for_target(encoder: Arc<E>, target: MediaTarget, config: &MediaConfig) -> Self {
        let aspect = aspect_from_ratio(config.crop.targets.ratio(target));
        Self::new(encoder, aspect)
            .with_max_zoom(Some(config.crop.max_zoom))
            .with_encoding(config.output.encoding())
    }

    pub fn with_max_zoom(mut self, max_zoom: Option<f64>) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target_aspect(&self) -> f64 {
        self.target_aspect
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    /// Current crop rectangle; `None` while no image is loaded.
    pub fn crop_rect(&self) -> Option<CropPixelRect> {
        self.source.as_ref().map(|_| self.rect)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Decode image bytes and start previewing them.
    ///
    /// On a decode error the session keeps whatever state it had.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.ensure_loadable()?;
        let source = SourceImage::decode(bytes)?;
        self.install(source);
        Ok(())
    }

    pub fn load_path(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_loadable()?;
        let source = SourceImage::open(path)?;
        self.install(source);
        Ok(())
    }

    pub fn load_image(&mut self, source: SourceImage) -> Result<(), SessionError> {
        self.ensure_loadable()?;
        self.install(source);
        Ok(())
    }

    fn ensure_loadable(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Committing => Err(self.invalid("load an image")),
            _ => Ok(()),
        }
    }

    fn install(&mut self, source: SourceImage) {
        self.generation += 1;
        self.viewport = ViewportState::new(self.target_aspect);
        self.rect = source.crop_rect(&self.viewport);
        log::debug!(
            "crop session loaded {}x{} source, initial rect {:?}",
            source.natural_width(),
            source.natural_height(),
            self.rect
        );
        self.source = Some(Arc::new(source));
        self.state = SessionState::Previewing;
    }

    // =========================================================================
    // Viewport input
    // =========================================================================

    /// Tell the session how large the image is drawn at zoom 1.
    ///
    /// Layout, not user input: the state does not change.
    pub fn set_display_size(&mut self, display: DisplaySize) -> Result<(), SessionError> {
        self.ensure_adjustable("resize the viewport")?;
        self.viewport.display = Some(display);
        self.refresh();
        Ok(())
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<CropPixelRect, SessionError> {
        self.ensure_adjustable("pan")?;
        self.viewport.pan.x += dx;
        self.viewport.pan.y += dy;
        Ok(self.adjusted())
    }

    pub fn pan_to(&mut self, pan: Pan) -> Result<CropPixelRect, SessionError> {
        self.ensure_adjustable("pan")?;
        self.viewport.pan = pan;
        Ok(self.adjusted())
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<CropPixelRect, SessionError> {
        self.ensure_adjustable("zoom")?;
        self.viewport.zoom = zoom;
        Ok(self.adjusted())
    }

    fn ensure_adjustable(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Previewing | SessionState::Adjusting => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn adjusted(&mut self) -> CropPixelRect {
        self.state = SessionState::Adjusting;
        self.refresh();
        self.rect
    }

    /// Renormalize the viewport and recompute the rectangle.
    fn refresh(&mut self) {
        if let Some(source) = &self.source {
            let natural = source.dimensions();
            self.viewport = self.viewport.normalized(natural, self.max_zoom);
            self.rect = source.crop_rect(&self.viewport);
        }
    }

    // =========================================================================
    // Commit / cancel
    // =========================================================================

    /// Start rendering the current rectangle on the worker pool.
    pub fn commit(&mut self) -> Result<PendingRender, SessionError> {
        self.ensure_adjustable("commit")?;
        let Some(source) = self.source.as_ref().map(Arc::clone) else {
            return Err(self.invalid("commit"));
        };

        // Each commit gets its own generation so only the newest ticket can
        // settle the session.
        self.generation += 1;
        let (tx, receiver) = mpsc::channel();
        let encoder = Arc::clone(&self.encoder);
        let rect = self.rect;
        let encoding = self.encoding;
        rayon::spawn(move || {
            let result = encoder.encode(&source, rect, encoding);
            // The session may already have dropped the ticket.
            let _ = tx.send(result);
        });

        log::debug!(
            "crop session committing {rect:?} as {} (generation {})",
            encoding.mime_type(),
            self.generation
        );
        self.state = SessionState::Committing;
        Ok(PendingRender {
            generation: self.generation,
            rect,
            receiver,
        })
    }

    /// Wait for a render and settle it.
    pub fn complete(&mut self, pending: PendingRender) -> Result<CommitOutcome, SessionError> {
        match pending.receiver.recv() {
            Ok(result) => self.settle(pending.generation, Some(result)),
            Err(_) => self.settle(pending.generation, None),
        }
    }

    /// Settle a render if it has finished; `None` while it is still running.
    ///
    /// Once a result has been taken, later polls of the same ticket report
    /// [`SessionError::Disconnected`] (or `Discarded` for a stale ticket).
    pub fn poll(
        &mut self,
        pending: &PendingRender,
    ) -> Option<Result<CommitOutcome, SessionError>> {
        match pending.receiver.try_recv() {
            Ok(result) => Some(self.settle(pending.generation, Some(result))),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.settle(pending.generation, None)),
        }
    }

    fn settle(
        &mut self,
        generation: u64,
        result: Option<Result<EncodedImage, CropError>>,
    ) -> Result<CommitOutcome, SessionError> {
        if generation != self.generation || self.state != SessionState::Committing {
            log::info!(
                "dropping render result from generation {generation} (session at {}, {})",
                self.generation,
                self.state
            );
            return Ok(CommitOutcome::Discarded);
        }

        match result {
            Some(Ok(blob)) => {
                log::debug!(
                    "crop committed: {}x{} {} ({} bytes)",
                    blob.width,
                    blob.height,
                    blob.mime_type,
                    blob.len()
                );
                self.reset();
                Ok(CommitOutcome::Committed(blob))
            }
            Some(Err(e)) => {
                log::warn!("crop render failed, back to adjusting: {e}");
                self.state = SessionState::Adjusting;
                Err(SessionError::Crop(e))
            }
            None => {
                log::warn!("crop render worker exited without a result");
                self.state = SessionState::Adjusting;
                Err(SessionError::Disconnected)
            }
        }
    }

    /// Discard the source and viewport and return to `Idle`.
    ///
    /// Safe while a render is in flight: its result will be discarded.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Err(self.invalid("cancel")),
            _ => {
                log::debug!("crop session cancelled while {}", self.state);
                self.generation += 1;
                self.reset();
                Ok(())
            }
        }
    }

    fn reset(&mut self) {
        self.source = None;
        self.viewport = ViewportState::new(self.target_aspect);
        self.rect = CropPixelRect::default();
        self.state = SessionState::Idle;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            state: self.state,
            action,
        }
    }
}

//! Domain-specific error types for the snapwire pipeline.
//!
//! All fallible operations return `Result<T, SnapError>`.
//! Every failure a pipeline run can hit is a typed variant here; the
//! orchestrator maps them to a terminal outcome instead of letting
//! anything escape its background task.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the snapwire pipeline.
#[derive(Debug, Error)]
pub enum SnapError {
    // ── Capture Errors ───────────────────────────────────────────
    /// The capture device failed to produce an image.
    #[error("capture failed: {0}")]
    Capture(String),

    // ── Transform Errors ─────────────────────────────────────────
    /// The captured data could not be decoded or re-encoded.
    #[error("image transform failed: {0}")]
    Transform(#[from] image::ImageError),

    // ── Framing Errors ───────────────────────────────────────────
    /// The payload exceeds what one frame can carry.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An incoming frame advertised a length over the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The stream ended before the advertised payload arrived.
    #[error("truncated frame: expected {expected} payload bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    // ── Transport Errors ─────────────────────────────────────────
    /// The TCP layer reported an error during connect or send.
    #[error("transport error: {0}")]
    Transport(std::io::Error),

    /// Connect or write exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Configuration Errors ─────────────────────────────────────
    /// An endpoint could not be built from the given host/port.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // ── Internal Errors ──────────────────────────────────────────
    /// Local file I/O failed (spool directory, capture files).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An mpsc/oneshot channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// A pipeline run attempted an illegal phase transition.
    #[error("phase violation: {0}")]
    PhaseViolation(String),

    /// A spawned background task died before completing.
    #[error("background task failed: {0}")]
    Background(String),
}

impl SnapError {
    /// Whether this failure came from the network send itself.
    ///
    /// Only transport-class failures are offered a user-initiated
    /// retry; capture and transform failures terminate the run without
    /// one.
    pub fn is_transport(&self) -> bool {
        matches!(self, SnapError::Transport(_) | SnapError::Timeout(_))
    }
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SnapError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        SnapError::ChannelClosed
    }
}

impl From<tokio::task::JoinError> for SnapError {
    fn from(e: tokio::task::JoinError) -> Self {
        SnapError::Background(e.to_string())
    }
}

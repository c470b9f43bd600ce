//! Capture-side collaborator boundary.
//!
//! The capture device itself lives outside the pipeline. It is reached
//! through [`CaptureSource`], which fires exactly once per triggered
//! capture: either a [`RawCapture`] or an error, never both.

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use image::ImageReader;

use crate::error::SnapError;

// ── RawCapture ───────────────────────────────────────────────────

/// One still image as it came off the capture device, pre-transform.
///
/// Holds the encoded bytes plus the pixel dimensions read from the
/// image header. Owned exclusively by the pipeline run that received
/// it; the decoded bitmap is only materialised inside the transformer
/// and both are gone when the run ends.
#[derive(Debug)]
pub struct RawCapture {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RawCapture {
    /// Wrap encoded image bytes, probing width/height from the header.
    ///
    /// Bytes that do not even carry a readable image header are
    /// rejected as a transform-class failure: the device produced
    /// something, it just cannot be decoded.
    pub fn from_encoded(data: Vec<u8>) -> Result<Self, SnapError> {
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| SnapError::Capture(format!("unreadable capture: {e}")))?
            .into_dimensions()?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

// ── CaptureSource ────────────────────────────────────────────────

/// The capture subsystem seam.
///
/// Implementations own the capture device and its internal state. One
/// call to [`acquire`](Self::acquire) corresponds to one triggered
/// capture and resolves exactly once.
#[async_trait]
pub trait CaptureSource: Send + Sync + 'static {
    async fn acquire(&self) -> Result<RawCapture, SnapError>;
}

// ── FileCaptureSource ────────────────────────────────────────────

/// Capture device backed by image files on disk.
///
/// Each `acquire` consumes the next queued file, so N queued files
/// serve N triggered captures. An empty queue is a capture failure,
/// the same as a camera with nothing to give.
#[derive(Debug)]
pub struct FileCaptureSource {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl FileCaptureSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            queue: Mutex::new(paths.into_iter().collect()),
        }
    }

    fn next_path(&self) -> Result<PathBuf, SnapError> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| SnapError::Capture("capture queue poisoned".into()))?;
        queue
            .pop_front()
            .ok_or_else(|| SnapError::Capture("no image queued".into()))
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn acquire(&self) -> Result<RawCapture, SnapError> {
        let path = self.next_path()?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| SnapError::Capture(format!("read {}: {e}", path.display())))?;
        RawCapture::from_encoded(data)
    }
}

// ── Tests ────────────────────────────────────────────────────────

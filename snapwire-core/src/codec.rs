//! Length-prefixed wire framing for image payloads.
//!
//! ## Wire format
//!
//! ```text
//! byte 0..3   : payload length, unsigned 32-bit, big-endian
//! byte 4..N-1 : payload bytes (compressed raster image)
//! ```
//!
//! No magic number, no checksum, no padding. The sender writes exactly
//! one frame per connection; the receiver decodes the same format back.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::SnapError;

// ── Constants ────────────────────────────────────────────────────

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX: usize = 4;

/// Default cap on a single payload (64 MiB). Far above any JPEG the
/// transformer emits, low enough to refuse nonsense lengths from a
/// misbehaving peer.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

// ── FrameCodec ───────────────────────────────────────────────────

/// Encoder/decoder for the length-prefixed frame format.
///
/// A payload longer than the configured maximum is a defect in the
/// caller, not a runtime condition: encoding fails with a typed error
/// and never silently truncates the length field.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the payload cap (both directions).
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self {
            max_payload: MAX_PAYLOAD_SIZE,
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = SnapError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.max_payload.min(u32::MAX as usize);
        if item.len() > max {
            return Err(SnapError::PayloadTooLarge {
                size: item.len(),
                max,
            });
        }
        dst.reserve(LENGTH_PREFIX + item.len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = SnapError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;

        if len > self.max_payload {
            return Err(SnapError::FrameTooLarge {
                size: len,
                max: self.max_payload,
            });
        }

        if src.len() < LENGTH_PREFIX + len {
            // Not all payload bytes have arrived yet.
            src.reserve(LENGTH_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX);
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => {
                // The peer hung up mid-frame.
                let expected = if src.len() >= LENGTH_PREFIX {
                    let mut prefix = [0u8; LENGTH_PREFIX];
                    prefix.copy_from_slice(&src[..LENGTH_PREFIX]);
                    u32::from_be_bytes(prefix) as usize
                } else {
                    0
                };
                Err(SnapError::TruncatedFrame {
                    expected,
                    actual: src.len().saturating_sub(LENGTH_PREFIX),
                })
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

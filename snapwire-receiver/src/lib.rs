//! # snapwire-receiver — still-image receiving peer
//!
//! Listens for sender connections, decodes the single length-prefixed
//! frame each connection carries, and writes the image to disk under a
//! sequential name. The inverse of the sender's wire format:
//!
//! ```text
//! byte 0..3   : payload length, unsigned 32-bit, big-endian
//! byte 4..N-1 : payload bytes (JPEG)
//! ```

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use snapwire_core::{FrameCodec, SnapError};

/// Read the one frame a sender connection carries.
///
/// `Ok(None)` means the sender closed without sending anything; a
/// close mid-frame surfaces as a truncation error.
pub async fn recv_frame<R>(io: R) -> Result<Option<Bytes>, SnapError>
where
    R: AsyncRead + Unpin,
{
    let mut framed = FramedRead::new(io, FrameCodec::default());
    framed.next().await.transpose()
}

/// Validate and store one received payload as `received-<seq>.jpg`.
///
/// The payload bytes are written verbatim; validation only checks they
/// decode as an image so junk never lands in the output directory.
pub async fn store_image(dir: &Path, seq: u64, payload: &[u8]) -> Result<PathBuf, SnapError> {
    image::load_from_memory(payload)?;
    let path = dir.join(format!("received-{seq}.jpg"));
    tokio::fs::write(&path, payload).await?;
    Ok(path)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::io::Cursor;
    use tokio::io::AsyncWriteExt;

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([200, 100, 50]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(payload);
        buf.to_vec()
    }

    #[tokio::test]
    async fn decodes_one_frame() {
        let payload = jpeg_bytes();
        let (mut tx, rx) = tokio::io::duplex(64 * 1024);
        let wire = framed(&payload);
        tokio::spawn(async move {
            tx.write_all(&wire).await.unwrap();
            tx.shutdown().await.unwrap();
        });

        let frame = recv_frame(rx).await.unwrap().unwrap();
        assert_eq!(&frame[..], &payload[..]);
    }

    #[tokio::test]
    async fn empty_connection_yields_none() {
        let (tx, rx) = tokio::io::duplex(64);
        drop(tx);
        assert!(recv_frame(rx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hangup_mid_frame_is_an_error() {
        let wire = framed(b"partial payload");
        let (mut tx, rx) = tokio::io::duplex(64);
        tokio::spawn(async move {
            tx.write_all(&wire[..8]).await.unwrap();
            // Drop without the rest.
        });

        let err = recv_frame(rx).await.unwrap_err();
        assert!(matches!(err, SnapError::TruncatedFrame { .. }));
    }

    #[tokio::test]
    async fn stores_valid_images_and_rejects_junk() {
        let dir = std::env::temp_dir().join(format!("snapwire-recv-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let path = store_image(&dir, 1, &jpeg_bytes()).await.unwrap();
        assert!(path.ends_with("received-1.jpg"));
        assert!(path.exists());

        assert!(store_image(&dir, 2, b"not an image").await.is_err());
        assert!(!dir.join("received-2.jpg").exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

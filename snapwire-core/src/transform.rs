//! Bandwidth-appropriate image transform.
//!
//! Downscales captures wider than the target width and re-encodes them
//! as JPEG at a fixed quality, producing the exact byte sequence that
//! goes on the wire.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::capture::RawCapture;
use crate::error::SnapError;

// ── Constants ────────────────────────────────────────────────────

/// Captures wider than this are scaled down; narrower ones pass through.
pub const MAX_WIDTH: u32 = 1280;

/// JPEG quality on the 0–100 scale.
pub const JPEG_QUALITY: u8 = 80;

// ── ProcessedImage ───────────────────────────────────────────────

/// The resized, recompressed byte sequence actually transmitted.
///
/// Transient: exists only for the duration of framing and transmission
/// of one pipeline run, never persisted beyond it.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    data: Bytes,
    width: u32,
    height: u32,
}

impl ProcessedImage {
    /// The JPEG bytes. Cheap to clone; backed by shared storage.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

// ── ImageTransformer ─────────────────────────────────────────────

/// Pure capture-to-payload transform.
///
/// Same input bytes always yield byte-identical output; no I/O, no
/// shared state. Fails only when the capture's pixel data cannot be
/// decoded.
#[derive(Debug, Clone)]
pub struct ImageTransformer {
    max_width: u32,
    quality: u8,
}

impl Default for ImageTransformer {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            quality: JPEG_QUALITY,
        }
    }
}

impl ImageTransformer {
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// Decode, conditionally downscale, and re-encode one capture.
    ///
    /// A capture wider than the target width keeps its aspect ratio:
    /// the height is scaled by `max_width / width` and rounded to the
    /// nearest pixel. Narrower captures keep their dimensions; the
    /// quality-80 re-encode is applied either way.
    pub fn transform(&self, raw: &RawCapture) -> Result<ProcessedImage, SnapError> {
        let img = image::load_from_memory(raw.data())?;

        let (width, height) = (img.width(), img.height());
        let img = if width > self.max_width {
            let ratio = self.max_width as f32 / width as f32;
            let new_height = (height as f32 * ratio).round() as u32;
            img.resize_exact(self.max_width, new_height.max(1), FilterType::Triangle)
        } else {
            img
        };

        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality).encode_image(&rgb)?;

        Ok(ProcessedImage {
            data: Bytes::from(buf),
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawCapture;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    /// Build an in-memory PNG capture with a simple gradient so the
    /// JPEG encoder has real content to chew on.
    fn capture(width: u32, height: u32) -> RawCapture {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        RawCapture::from_encoded(buf).unwrap()
    }

    fn decode_dims(processed: &ProcessedImage) -> (u32, u32) {
        let img = image::load_from_memory(&processed.bytes()).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn wide_capture_is_scaled_to_1280() {
        let raw = capture(1920, 1080);
        let processed = ImageTransformer::default().transform(&raw).unwrap();

        assert_eq!(processed.width(), 1280);
        assert_eq!(processed.height(), 720);
        assert_eq!(decode_dims(&processed), (1280, 720));
    }

    #[test]
    fn height_rounds_to_nearest_pixel() {
        // 1500 × 997: ratio 1280/1500, height 997 × 0.85333 = 850.77 → 851.
        let raw = capture(1500, 997);
        let processed = ImageTransformer::default().transform(&raw).unwrap();

        assert_eq!(processed.width(), 1280);
        assert_eq!(processed.height(), 851);
    }

    #[test]
    fn small_capture_keeps_dimensions() {
        let raw = capture(800, 600);
        let processed = ImageTransformer::default().transform(&raw).unwrap();

        // No upscaling, but the JPEG re-encode still happens.
        assert_eq!(processed.width(), 800);
        assert_eq!(processed.height(), 600);
        assert_eq!(decode_dims(&processed), (800, 600));
        assert!(!processed.is_empty());
    }

    #[test]
    fn exact_boundary_width_passes_through() {
        let raw = capture(1280, 500);
        let processed = ImageTransformer::default().transform(&raw).unwrap();
        assert_eq!(processed.width(), 1280);
        assert_eq!(processed.height(), 500);
    }

    #[test]
    fn output_is_jpeg() {
        let raw = capture(64, 64);
        let processed = ImageTransformer::default().transform(&raw).unwrap();
        // SOI marker.
        assert_eq!(&processed.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn transform_is_deterministic() {
        let raw = capture(640, 480);
        let transformer = ImageTransformer::default();
        let a = transformer.transform(&raw).unwrap();
        let b = transformer.transform(&raw).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn corrupt_pixels_fail_as_transform_error() {
        // A valid PNG header with garbage pixel data behind it decodes
        // its dimensions but not its pixels.
        let good = {
            let img = RgbImage::from_pixel(32, 32, Rgb([1, 2, 3]));
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .unwrap();
            buf
        };
        let mut corrupt = good.clone();
        corrupt.truncate(40); // header survives, pixel stream does not
        let raw = RawCapture::from_encoded(corrupt).unwrap();

        let err = ImageTransformer::default().transform(&raw).unwrap_err();
        assert!(matches!(err, SnapError::Transform(_)));
    }
}

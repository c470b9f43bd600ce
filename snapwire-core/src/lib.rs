//! # snapwire-core
//!
//! Core library for the snapwire still-image delivery pipeline.
//!
//! A triggered capture flows strictly forward: the capture source
//! produces a [`RawCapture`], the [`ImageTransformer`] downscales and
//! re-encodes it, the [`TransferClient`] frames the bytes with a
//! 4-byte big-endian length prefix and writes them over one TCP
//! connection, and the [`CapturePipeline`] orchestrates the whole run
//! on background tasks, cleaning up every temporary artifact before
//! reporting the outcome.
//!
//! This crate contains:
//! - **Endpoint**: `EndpointConfig` — the receiving peer for one send
//! - **Capture**: `CaptureSource` seam and the `RawCapture` handle
//! - **Transform**: `ImageTransformer` — downscale + JPEG re-encode
//! - **Codec**: `FrameCodec` for framed TCP I/O via `tokio_util`
//! - **Transport**: `TransferClient` — one connection, one frame, close
//! - **Pipeline**: `CapturePipeline` orchestrator and `RunPhase` states
//! - **Spool**: temp-artifact guards and the single-worker spool writer
//! - **Error**: `SnapError` — typed, `thiserror`-based error hierarchy

pub mod capture;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod settings;
pub mod spool;
pub mod transform;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{CaptureSource, FileCaptureSource, RawCapture};
pub use codec::{FrameCodec, LENGTH_PREFIX, MAX_PAYLOAD_SIZE};
pub use endpoint::{DEFAULT_HOST, DEFAULT_PORT, EndpointConfig};
pub use error::SnapError;
pub use notify::{LogNotifier, Notifier, TransferOutcome};
pub use pipeline::{CapturePipeline, PipelineHandle, RunPhase};
pub use settings::{SettingsStore, SharedSettings, StaticSettings};
pub use spool::{SpoolDir, SpoolWriter, TempArtifact};
pub use transform::{ImageTransformer, JPEG_QUALITY, MAX_WIDTH, ProcessedImage};
pub use transport::{TransferClient, TransportConfig};

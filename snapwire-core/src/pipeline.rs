//! Capture pipeline orchestrator.
//!
//! Sequences one triggered capture through capture → transform → send
//! on background tasks, releases every temporary artifact on every
//! exit path, and reports the terminal outcome to the notification
//! channel.
//!
//! Triggers arrive as messages on an mpsc channel; each one becomes an
//! independent run in its own task. Runs are not serialised against
//! each other: two rapid triggers each open their own connection, and
//! no ordering is promised for which frame the peer sees first.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capture::CaptureSource;
use crate::error::SnapError;
use crate::notify::{Notifier, TransferOutcome};
use crate::settings::SettingsStore;
use crate::spool::{SpoolDir, SpoolWriter};
use crate::transform::ImageTransformer;
use crate::transport::TransferClient;

// ── RunPhase ─────────────────────────────────────────────────────

/// Progress of a single pipeline run.
///
/// ```text
/// Idle ──► Capturing ──► Captured ──► Transforming ──► Sending ──► Sent
///             │              │              │              │
///             └──────────────┴──────────────┴──────────────┴────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Capturing,
    Captured,
    Transforming,
    Sending,
    Sent,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Capturing => "Capturing",
            Self::Captured => "Captured",
            Self::Transforming => "Transforming",
            Self::Sending => "Sending",
            Self::Sent => "Sent",
            Self::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

impl RunPhase {
    /// Whether `next` is a legal successor of this phase.
    fn allows(self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            (Idle, Capturing)
            | (Capturing, Captured)
            | (Captured, Transforming)
            | (Transforming, Sending)
            | (Sending, Sent) => true,
            (from, Failed) => !matches!(from, Sent | Failed),
            _ => false,
        }
    }

    /// Advance to `next`, rejecting transitions the pipeline never makes.
    pub fn advance(&mut self, next: RunPhase) -> Result<(), SnapError> {
        if self.allows(next) {
            *self = next;
            Ok(())
        } else {
            Err(SnapError::PhaseViolation(format!("{self} -> {next}")))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Sent | RunPhase::Failed)
    }
}

// ── PipelineHandle ───────────────────────────────────────────────

/// Cloneable trigger for the pipeline.
///
/// Posting a trigger starts one independent run from capture; the
/// caller is never blocked on the run itself. The retry action handed
/// to the notifier is one of these, so retrying re-captures rather
/// than resending the failed attempt's bytes.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl PipelineHandle {
    /// Start a new pipeline run.
    pub fn trigger(&self) -> Result<(), SnapError> {
        self.tx.send(()).map_err(|_| SnapError::ChannelClosed)
    }
}

// ── CapturePipeline ──────────────────────────────────────────────

struct Inner<S, C, N> {
    source: S,
    settings: C,
    notifier: N,
    transformer: ImageTransformer,
    client: TransferClient,
    spool: SpoolDir,
    writer: SpoolWriter,
    run_seq: AtomicU64,
}

/// Orchestrates capture → transform → send → cleanup per trigger.
pub struct CapturePipeline<S, C, N> {
    inner: Arc<Inner<S, C, N>>,
    trigger_tx: mpsc::UnboundedSender<()>,
    trigger_rx: mpsc::UnboundedReceiver<()>,
}

impl<S, C, N> CapturePipeline<S, C, N>
where
    S: CaptureSource,
    C: SettingsStore,
    N: Notifier,
{
    /// Assemble a pipeline. Spawns the spool writer worker; the
    /// trigger loop itself starts with [`run`](Self::run).
    pub fn new(
        source: S,
        settings: C,
        notifier: N,
        transformer: ImageTransformer,
        client: TransferClient,
        spool: SpoolDir,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                source,
                settings,
                notifier,
                transformer,
                client,
                spool,
                writer: SpoolWriter::spawn(),
                run_seq: AtomicU64::new(0),
            }),
            trigger_tx,
            trigger_rx,
        }
    }

    /// A trigger handle; clone freely.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Drive the trigger loop until every handle is dropped.
    ///
    /// Each trigger spawns one run on the runtime's background pool.
    pub async fn run(self) {
        let CapturePipeline {
            inner,
            trigger_tx,
            mut trigger_rx,
        } = self;

        // Hold only a weak sender here, so the loop ends once every
        // external handle (including retry handles) is gone.
        let retry_tx = trigger_tx.downgrade();
        drop(trigger_tx);

        while let Some(()) = trigger_rx.recv().await {
            let Some(tx) = retry_tx.upgrade() else { break };
            let inner = Arc::clone(&inner);
            let retry = PipelineHandle { tx };
            tokio::spawn(async move {
                run_once(inner, retry).await;
            });
        }
    }
}

// ── Run execution ────────────────────────────────────────────────

async fn run_once<S, C, N>(inner: Arc<Inner<S, C, N>>, retry: PipelineHandle)
where
    S: CaptureSource,
    C: SettingsStore,
    N: Notifier,
{
    let run = inner.run_seq.fetch_add(1, Ordering::Relaxed);
    let outcome = match execute(&inner, run).await {
        Ok(()) => TransferOutcome::Sent,
        Err(e) => {
            warn!(run, error = %e, "pipeline run failed");
            let retry = e.is_transport().then_some(retry);
            TransferOutcome::Failed {
                reason: e.to_string(),
                retry,
            }
        }
    };
    inner.notifier.notify(outcome).await;
}

async fn execute<S, C, N>(inner: &Inner<S, C, N>, run: u64) -> Result<(), SnapError>
where
    S: CaptureSource,
    C: SettingsStore,
    N: Notifier,
{
    let mut phase = RunPhase::Idle;

    // Capture. A device error ends the run here: nothing has been
    // written to the spool yet, so there is nothing to clean up.
    phase.advance(RunPhase::Capturing)?;
    let raw = inner.source.acquire().await?;
    phase.advance(RunPhase::Captured)?;
    debug!(run, %phase, width = raw.width(), height = raw.height(), "capture acquired");

    // Persist the raw shot through the single spool worker.
    let raw_path = inner.spool.unique_path("capture-", "img");
    let mut raw_file = inner
        .writer
        .write(&raw_path, Bytes::copy_from_slice(raw.data()))
        .await?;

    // Transform on the blocking pool; decode and re-encode are CPU
    // bound and must not stall the runtime workers.
    phase.advance(RunPhase::Transforming)?;
    let transformer = inner.transformer.clone();
    let processed = tokio::task::spawn_blocking(move || transformer.transform(&raw)).await??;
    debug!(
        run,
        %phase,
        width = processed.width(),
        height = processed.height(),
        bytes = processed.len(),
        "transform complete"
    );

    let processed_path = SpoolDir::processed_variant(&raw_path);
    let mut processed_file = inner.writer.write(&processed_path, processed.bytes()).await?;

    // Send. The endpoint is read fresh once per run; a settings change
    // mid-flight affects the next run, not this one.
    phase.advance(RunPhase::Sending)?;
    let endpoint = inner.settings.endpoint();
    info!(run, %endpoint, bytes = processed.len(), "sending frame");
    let sent = inner.client.send(processed.bytes(), &endpoint).await;

    // Cleanup runs before the outcome is reported, success or failure.
    raw_file.remove();
    processed_file.remove();
    sent?;

    phase.advance(RunPhase::Sent)?;
    info!(run, %phase, "frame delivered");
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

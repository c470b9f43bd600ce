//! Terminal outcome reporting.
//!
//! The pipeline calls into a [`Notifier`] exactly once per run with the
//! terminal [`TransferOutcome`]. Presentation — snackbars, logs, exit
//! codes — is the collaborator's business, not the pipeline's.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::pipeline::PipelineHandle;

// ── TransferOutcome ──────────────────────────────────────────────

/// Terminal result of one pipeline run.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// The frame was written in full and the connection closed.
    Sent,
    /// The run failed. `retry` starts a brand-new capture when the
    /// failure class warrants offering one; it never resends the
    /// failed attempt's bytes, which are already cleaned up.
    Failed {
        /// Human-readable reason, suitable for showing the operator.
        reason: String,
        /// Present only for transport-class failures.
        retry: Option<PipelineHandle>,
    },
}

impl TransferOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, TransferOutcome::Sent)
    }
}

// ── Notifier ─────────────────────────────────────────────────────

/// The notification channel seam.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, outcome: TransferOutcome);
}

/// Notifier that reports outcomes to the log and drops the retry
/// action — the default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Sent => info!("image delivered"),
            TransferOutcome::Failed { reason, retry } => {
                warn!(retryable = retry.is_some(), "delivery failed: {reason}");
            }
        }
    }
}

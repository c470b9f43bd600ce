//! Temporary on-disk artifacts for in-flight captures.
//!
//! Every pipeline run persists the raw shot and the processed image to
//! a spool directory while they are in flight, and deletes both before
//! reporting its outcome. [`TempArtifact`] guards each file so no exit
//! path can leak one; [`SpoolWriter`] serialises the writes through a
//! single background worker so capture-file I/O never runs on the
//! triggering task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::error::SnapError;

// ── SpoolDir ─────────────────────────────────────────────────────

/// Directory holding in-flight capture files.
#[derive(Debug, Clone)]
pub struct SpoolDir {
    dir: PathBuf,
    seq: Arc<AtomicU64>,
}

impl SpoolDir {
    /// Open (creating if needed) the spool directory.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, SnapError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            seq: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// A collision-free path for a new artifact: wall-clock millis plus
    /// a per-directory sequence number, in the spirit of the timestamped
    /// names cameras give their shots.
    pub fn unique_path(&self, prefix: &str, ext: &str) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{prefix}{millis}-{seq}.{ext}"))
    }

    /// The sibling path for the processed rendition of `raw`.
    pub fn processed_variant(raw: &Path) -> PathBuf {
        let name = raw
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string());
        raw.with_file_name(format!("processed_{name}"))
    }
}

// ── TempArtifact ─────────────────────────────────────────────────

/// RAII guard for one temporary file.
///
/// [`remove`](Self::remove) deletes the file exactly once and may be
/// called again harmlessly; dropping an un-removed guard deletes the
/// file as a backstop.
#[derive(Debug)]
pub struct TempArtifact {
    path: Option<PathBuf>,
}

impl TempArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Where the artifact lives, until it has been removed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Delete the file now. Idempotent.
    pub fn remove(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove spool file");
                }
            }
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

// ── SpoolWriter ──────────────────────────────────────────────────

struct WriteJob {
    path: PathBuf,
    data: Bytes,
    done: oneshot::Sender<std::io::Result<()>>,
}

/// Single-worker writer for spool files.
///
/// All writes go through one background task and land on disk in the
/// order they were submitted.
#[derive(Debug, Clone)]
pub struct SpoolWriter {
    tx: mpsc::Sender<WriteJob>,
}

impl SpoolWriter {
    /// Spawn the worker task on the current runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<WriteJob>(32);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let res = tokio::fs::write(&job.path, &job.data).await;
                let _ = job.done.send(res);
            }
        });
        Self { tx }
    }

    /// Write `data` to `path` via the worker.
    ///
    /// Resolves once the bytes are on disk, returning the guard that
    /// owns the file from here on.
    pub async fn write(&self, path: &Path, data: Bytes) -> Result<TempArtifact, SnapError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(WriteJob {
                path: path.to_path_buf(),
                data,
                done: done_tx,
            })
            .await
            .map_err(|_| SnapError::ChannelClosed)?;
        done_rx.await.map_err(|_| SnapError::ChannelClosed)??;
        Ok(TempArtifact::new(path.to_path_buf()))
    }
}

impl std::fmt::Debug for WriteJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteJob")
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_dir(tag: &str) -> SpoolDir {
        let dir = std::env::temp_dir().join(format!("snapwire-spool-{tag}-{}", std::process::id()));
        SpoolDir::create(&dir).await.unwrap()
    }

    #[tokio::test]
    async fn writes_land_and_guards_clean_up() {
        let spool = scratch_dir("basic").await;
        let writer = SpoolWriter::spawn();

        let path = spool.unique_path("capture-", "jpg");
        let mut artifact = writer
            .write(&path, Bytes::from_static(b"shot"))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"shot");

        artifact.remove();
        assert!(!path.exists());
        // Second remove is a no-op.
        artifact.remove();

        std::fs::remove_dir_all(spool.path()).unwrap();
    }

    #[tokio::test]
    async fn drop_removes_unclaimed_artifact() {
        let spool = scratch_dir("drop").await;
        let writer = SpoolWriter::spawn();

        let path = spool.unique_path("capture-", "jpg");
        {
            let _artifact = writer
                .write(&path, Bytes::from_static(b"leaky?"))
                .await
                .unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());

        std::fs::remove_dir_all(spool.path()).unwrap();
    }

    #[tokio::test]
    async fn unique_paths_do_not_collide() {
        let spool = scratch_dir("unique").await;
        let a = spool.unique_path("capture-", "jpg");
        let b = spool.unique_path("capture-", "jpg");
        assert_ne!(a, b);
        std::fs::remove_dir_all(spool.path()).unwrap();
    }

    #[test]
    fn processed_variant_prefixes_file_name() {
        let raw = PathBuf::from("/spool/capture-17-0.jpg");
        assert_eq!(
            SpoolDir::processed_variant(&raw),
            PathBuf::from("/spool/processed_capture-17-0.jpg")
        );
    }
}

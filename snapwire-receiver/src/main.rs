//! snapwire receiver — entry point.
//!
//! ```text
//! snapwire-receiver                          Listen on 0.0.0.0:4400
//! snapwire-receiver --listen 0.0.0.0:5500    Listen elsewhere
//! snapwire-receiver --output-dir shots       Store images under ./shots
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snapwire_receiver::{recv_frame, store_image};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "snapwire-receiver", about = "snapwire still-image receiving peer")]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:4400")]
    listen: String,

    /// Directory to store received images in.
    #[arg(short, long, default_value = "received")]
    output_dir: PathBuf,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tokio::fs::create_dir_all(&cli.output_dir).await?;

    let listener = TcpListener::bind(&cli.listen).await?;
    info!("snapwire-receiver v{}", env!("CARGO_PKG_VERSION"));
    info!("listening on {}", listener.local_addr()?);
    info!("storing images under {}", cli.output_dir.display());

    let counter = Arc::new(AtomicU64::new(1));
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "sender connected");

        let dir = cli.output_dir.clone();
        let counter = Arc::clone(&counter);
        tokio::spawn(async move {
            handle_sender(stream, dir, counter).await;
        });
    }
}

/// One frame per connection; the sender hangs up after it.
async fn handle_sender(stream: TcpStream, dir: PathBuf, counter: Arc<AtomicU64>) {
    match recv_frame(stream).await {
        Ok(Some(payload)) => {
            info!(bytes = payload.len(), "frame received");
            let seq = counter.fetch_add(1, Ordering::SeqCst);
            match store_image(&dir, seq, &payload).await {
                Ok(path) => info!("image stored at {}", path.display()),
                Err(e) => warn!("discarding payload: {e}"),
            }
        }
        Ok(None) => warn!("sender closed without sending a frame"),
        Err(e) => warn!("frame receive failed: {e}"),
    }
}

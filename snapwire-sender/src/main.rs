//! snapwire sender — entry point.
//!
//! ```text
//! snapwire-sender photo.jpg                Send one image
//! snapwire-sender a.jpg b.jpg c.jpg        Send several (concurrent runs)
//! snapwire-sender --server 10.0.0.5:4400   Override the configured receiver
//! snapwire-sender --config <path>          Load a custom config TOML
//! snapwire-sender --gen-config             Write default config to stdout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snapwire_core::{
    CapturePipeline, FileCaptureSource, ImageTransformer, Notifier, SpoolDir, StaticSettings,
    TransferClient, TransferOutcome,
};
use snapwire_sender::config::SenderConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "snapwire-sender", about = "snapwire still-image delivery client")]
struct Cli {
    /// Image files to send, one pipeline run each.
    #[arg(required_unless_present = "gen_config")]
    images: Vec<PathBuf>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "snapwire.toml")]
    config: PathBuf,

    /// Override the configured receiver (host:port).
    #[arg(short, long)]
    server: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Outcome reporting ────────────────────────────────────────────

/// Forwards each terminal outcome to the main task so it can count
/// completions and pick an exit code.
struct CliNotifier {
    tx: mpsc::UnboundedSender<TransferOutcome>,
}

#[async_trait]
impl Notifier for CliNotifier {
    async fn notify(&self, outcome: TransferOutcome) {
        let _ = self.tx.send(outcome);
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        match toml::to_string_pretty(&SenderConfig::default()) {
            Ok(text) => {
                println!("{text}");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("failed to render default config: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    // First run: leave a config file behind for the operator to edit.
    let first_run = !cli.config.exists();
    if first_run {
        if let Err(e) = SenderConfig::write_default(&cli.config) {
            eprintln!("failed to write {}: {e}", cli.config.display());
        }
    }

    let config = SenderConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if first_run {
        info!(
            "wrote default config to {}; edit it to set your receiver",
            cli.config.display()
        );
    }

    match run(cli, config).await {
        Ok(failures) if failures == 0 => ExitCode::SUCCESS,
        Ok(failures) => {
            warn!("{failures} image(s) were not delivered");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: SenderConfig) -> Result<usize, Box<dyn std::error::Error>> {
    let endpoint = match &cli.server {
        Some(s) => s.parse()?,
        None => config.endpoint()?,
    };

    info!("snapwire-sender v{}", env!("CARGO_PKG_VERSION"));
    info!("receiver: {endpoint}");
    info!("images queued: {}", cli.images.len());

    let spool = SpoolDir::create(&config.spool.dir).await?;
    let (tx, mut outcomes) = mpsc::unbounded_channel();

    let pipeline = CapturePipeline::new(
        FileCaptureSource::new(cli.images.clone()),
        StaticSettings::new(endpoint),
        CliNotifier { tx },
        ImageTransformer::default(),
        TransferClient::new(config.transport_config()),
        spool,
    );
    let handle = pipeline.handle();
    tokio::spawn(pipeline.run());

    for image in &cli.images {
        info!("capturing {}", image.display());
        handle.trigger()?;
    }
    // The pipeline shuts down once the last handle is gone.
    drop(handle);

    let mut failures = 0usize;
    for _ in 0..cli.images.len() {
        match outcomes.recv().await {
            Some(TransferOutcome::Sent) => info!("image delivered"),
            Some(TransferOutcome::Failed { reason, retry }) => {
                failures += 1;
                // The CLI queue is consumed; surface the failure and
                // let the operator re-run instead of auto-retrying.
                drop(retry);
                warn!("delivery failed: {reason}");
            }
            None => break,
        }
    }

    Ok(failures)
}

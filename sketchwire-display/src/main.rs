//! sketchwire display daemon — entry point.
//!
//! ```text
//! sketchwire-display                    Listen with defaults
//! sketchwire-display --config <path>    Use custom config TOML
//! sketchwire-display --gen-config       Dump default config and exit
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sketchwire_core::{DisplayService, FileStore, PackedBitmap};

mod config;
use config::DisplayConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sketchwire-display", about = "sketchwire display-side daemon")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "sketchwire-display.toml")]
    config: PathBuf,

    /// Listen address (overrides config). Example: 0.0.0.0:7411
    #[arg(short, long)]
    bind: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if cli.gen_config {
        DisplayConfig::write_default(&cli.config)?;
        println!("wrote default config to {}", cli.config.display());
        return Ok(());
    }

    let mut cfg = DisplayConfig::load(&cli.config);
    if let Some(bind) = cli.bind {
        cfg.network.bind_addr = bind;
    }

    let store = FileStore::new(&cfg.storage.bitmap_path);
    let service = DisplayService::bind(&cfg.network.bind_addr, store).await?;
    info!(addr = %service.local_addr()?, "display daemon up");

    if cfg.storage.preload_saved {
        match service.preload_saved().await {
            Ok(true) => info!("restored saved drawing"),
            Ok(false) => info!("no saved drawing to restore"),
            Err(e) => error!(error = %e, "could not restore saved drawing"),
        }
    }

    // Log each new frame; an actual panel driver would subscribe here.
    let mut frames = service.frame_receiver();
    tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            if let Some(bitmap) = frames.borrow_and_update().clone() {
                log_frame(&bitmap);
            }
        }
    });

    service.run().await?;
    Ok(())
}

fn log_frame(bitmap: &PackedBitmap) {
    let lit: u32 = bitmap.as_bytes().iter().map(|b| b.count_ones()).sum();
    info!(lit_pixels = lit, "frame updated");
}

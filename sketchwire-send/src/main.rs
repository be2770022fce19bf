//! sketchwire send — command-line client.
//!
//! ```text
//! sketchwire-send push <file>        Stream a 1024-byte bitmap live
//! sketchwire-send push --pattern     Stream a built-in test drawing
//! sketchwire-send store <file>       Persist a bitmap on the device
//! sketchwire-send retrieve <file>    Fetch the saved bitmap to a file
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sketchwire_core::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CanvasPoint, PackedBitmap, Rasterizer, Session, SessionConfig,
    SketchError,
};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sketchwire-send", about = "Push drawings to a sketchwire display")]
struct Cli {
    /// Device address (`ip:port`).
    #[arg(short, long, default_value = "127.0.0.1:7411")]
    addr: String,

    /// Deadline in seconds for connects and request replies.
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a bitmap over the live channel.
    Push {
        /// Raw 1024-byte bitmap file.
        file: Option<PathBuf>,

        /// Send a built-in test drawing instead of a file.
        #[arg(long, conflicts_with = "file")]
        pattern: bool,
    },
    /// Store a bitmap in the device's persistent slot.
    Store {
        /// Raw 1024-byte bitmap file.
        file: PathBuf,
    },
    /// Retrieve the stored bitmap and write it to a file.
    Retrieve {
        /// Output path for the raw 1024-byte bitmap.
        file: PathBuf,
    },
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = SessionConfig {
        device_addr: cli.addr,
        request_timeout: Duration::from_secs(cli.timeout),
        ..Default::default()
    };

    match cli.command {
        Command::Push { file, pattern } => {
            let bitmap = if pattern {
                test_pattern()
            } else {
                let path = file.ok_or("push needs a file or --pattern")?;
                read_bitmap(&path).await?
            };
            push(config, &bitmap).await?;
        }

        Command::Store { file } => {
            let bitmap = read_bitmap(&file).await?;
            let session = Session::connect(config);
            session.store(&bitmap).await?;
            info!("drawing stored on device");
        }

        Command::Retrieve { file } => {
            let session = Session::connect(config);
            match session.retrieve().await {
                Ok(bitmap) => {
                    tokio::fs::write(&file, bitmap.as_bytes()).await?;
                    info!(path = %file.display(), "saved drawing written");
                }
                Err(SketchError::NotStored) => {
                    eprintln!("device has no saved drawing");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

/// Open the live channel, wait for it, and send one frame.
async fn push(config: SessionConfig, bitmap: &PackedBitmap) -> Result<(), SketchError> {
    let deadline = config.request_timeout;
    let session = Session::connect(config);

    let mut state = session.subscribe_state();
    tokio::time::timeout(deadline, state.wait_for(|s| s.is_open()))
        .await
        .map_err(|_| SketchError::Timeout(deadline))?
        .map_err(|_| SketchError::ChannelClosed)?;

    let sent = session.send_bitmap(bitmap)?;
    info!(bytes = sent, "frame queued");

    // Give the channel task a moment to flush before the session drops.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

async fn read_bitmap(path: &PathBuf) -> Result<PackedBitmap, Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(PackedBitmap::from_bytes(&bytes)?)
}

/// A diagonal cross with a border, enough to eyeball orientation.
fn test_pattern() -> PackedBitmap {
    let mut r = Rasterizer::new();

    r.begin(CanvasPoint::clamped(0, 0));
    r.extend(CanvasPoint::clamped(CANVAS_WIDTH as i32 - 1, 0));
    r.extend(CanvasPoint::clamped(
        CANVAS_WIDTH as i32 - 1,
        CANVAS_HEIGHT as i32 - 1,
    ));
    r.extend(CanvasPoint::clamped(0, CANVAS_HEIGHT as i32 - 1));
    r.extend(CanvasPoint::clamped(0, 0));
    r.end();

    r.begin(CanvasPoint::clamped(0, 0));
    r.extend(CanvasPoint::clamped(
        CANVAS_WIDTH as i32 - 1,
        CANVAS_HEIGHT as i32 - 1,
    ));
    r.end();
    r.begin(CanvasPoint::clamped(CANVAS_WIDTH as i32 - 1, 0));
    r.extend(CanvasPoint::clamped(0, CANVAS_HEIGHT as i32 - 1));
    r.end();

    PackedBitmap::pack(r.canvas())
}

// ── Tests ────────────────────────────────────────────────────────

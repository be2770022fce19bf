//! # sketchwire-core
//!
//! Capture, encode, transport, and persist a freehand monochrome
//! sketch for a 128×64 pixel display device.
//!
//! Pipeline:
//!
//! ```text
//! pointer events ──► Rasterizer ──► PackedBitmap ──┬─► rle ──► Session::send_bitmap   (live push)
//!                                                  └─────────► Session::store/retrieve (raw, persisted)
//!
//! DisplayService ◄── wire::Message ◄── TCP                      (device side)
//! ```
//!
//! This crate contains:
//! - **Raster**: `Canvas`, `Brush`, `Rasterizer` — gesture to pixel state
//! - **Bitmap**: `PackedBitmap` — luminance-threshold 1-bpp packing
//! - **Rle**: byte-oriented run-length codec for live frames
//! - **Wire**: `Message` + `WireCodec` for framed TCP I/O via `tokio_util`
//! - **Session**: reconnecting live channel + one-shot store/retrieve
//! - **Device**: `DisplayService` — the receiving end, with pluggable
//!   `BitmapStore` persistence
//! - **Error**: `SketchError` — typed, `thiserror`-based error hierarchy

pub mod bitmap;
pub mod device;
pub mod error;
pub mod raster;
pub mod rle;
pub mod session;
pub mod state;
pub mod storage;
pub mod wire;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use bitmap::{BITMAP_SIZE, PackedBitmap};
pub use device::DisplayService;
pub use error::SketchError;
pub use raster::{
    Brush, BrushMode, CANVAS_HEIGHT, CANVAS_WIDTH, Canvas, CanvasPoint, Rasterizer,
};
pub use session::{Session, SessionConfig};
pub use state::ChannelState;
pub use storage::{BitmapStore, FileStore, MemoryStore};
pub use wire::{Message, MessageKind, WireCodec};

//! Domain-specific error types for the sketchwire pipeline.
//!
//! All fallible operations return `Result<T, SketchError>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the sketchwire pipeline.
#[derive(Debug, Error)]
pub enum SketchError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// Received bytes that do not start with the SKW0 magic sequence.
    #[error("invalid magic bytes: expected SKW0")]
    InvalidMagic,

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// The wire payload failed checksum verification.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// A peer violated the wire protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The payload exceeds the configured maximum frame size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Codec Errors ─────────────────────────────────────────────
    /// A run-length stream could not be decoded.
    #[error("malformed run-length stream: {0}")]
    MalformedRle(&'static str),

    /// A packed bitmap had the wrong byte length.
    #[error("invalid bitmap length: expected {expected}, got {actual}")]
    InvalidBitmapLength { expected: usize, actual: usize },

    // ── Session Errors ───────────────────────────────────────────
    /// The live channel is not open; the frame was not queued.
    #[error("channel not ready")]
    NotReady,

    /// The device has no stored bitmap to retrieve.
    #[error("no saved drawing on the device")]
    NotStored,

    /// The device refused a store request.
    #[error("store rejected by device: {0}")]
    StoreRejected(String),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for SketchError {
    fn from(s: String) -> Self {
        SketchError::Other(s)
    }
}

impl From<&str> for SketchError {
    fn from(s: &str) -> Self {
        SketchError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SketchError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        SketchError::ChannelClosed
    }
}

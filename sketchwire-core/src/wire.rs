//! Wire framing for the device link.
//!
//! Every message — live frames and the store/retrieve exchanges — is
//! carried as a small fixed header plus an opaque payload:
//!
//! ```text
//! magic:        [u8; 4]  b"SKW0"
//! checksum:     u32      first 4 bytes of blake3(payload), 0 if empty
//! kind:         u8       MessageKind discriminant
//! payload_len:  u32
//! payload:      [u8]     payload_len bytes
//! ```
//!
//! All integers are little-endian. [`WireCodec`] adapts the layout to
//! `tokio_util`'s [`Framed`](tokio_util::codec::Framed) I/O.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::bitmap::PackedBitmap;
use crate::error::SketchError;

/// Header length on the wire.
pub const HEADER_SIZE: usize = 13;

/// Maximum payload length. The largest legitimate payload is the
/// worst-case run-length frame: 2 × 1024 bytes.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

const MAGIC: [u8; 4] = *b"SKW0";

// ── MessageKind ──────────────────────────────────────────────────

/// All message kinds understood by the device link.
///
/// - `0x0x` — live channel (client → device, best effort)
/// - `0x1x` — store exchange
/// - `0x2x` — retrieve exchange
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A run-length encoded frame pushed on the live channel.
    Frame = 0x01,

    /// Persist the attached raw bitmap on the device.
    Store = 0x10,
    /// The bitmap was written successfully.
    StoreAck = 0x11,

    /// Fetch the persisted bitmap.
    Load = 0x20,
    /// The persisted raw bitmap.
    Bitmap = 0x21,
    /// Nothing has ever been stored.
    Missing = 0x22,

    /// The request failed; payload carries a human-readable reason.
    Error = 0x7F,
}

impl TryFrom<u8> for MessageKind {
    type Error = SketchError;

    fn try_from(value: u8) -> Result<Self, SketchError> {
        match value {
            0x01 => Ok(MessageKind::Frame),
            0x10 => Ok(MessageKind::Store),
            0x11 => Ok(MessageKind::StoreAck),
            0x20 => Ok(MessageKind::Load),
            0x21 => Ok(MessageKind::Bitmap),
            0x22 => Ok(MessageKind::Missing),
            0x7F => Ok(MessageKind::Error),
            _ => Err(SketchError::UnknownVariant {
                type_name: "MessageKind",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── Message ──────────────────────────────────────────────────────

/// A framed message: kind plus opaque payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    payload: Vec<u8>,
}

impl Message {
    /// A live frame carrying run-length encoded bytes.
    pub fn frame(rle: Vec<u8>) -> Self {
        Self {
            kind: MessageKind::Frame,
            payload: rle,
        }
    }

    /// A store request carrying the raw packed bitmap.
    pub fn store(bitmap: &PackedBitmap) -> Self {
        Self {
            kind: MessageKind::Store,
            payload: bitmap.as_bytes().to_vec(),
        }
    }

    pub fn store_ack() -> Self {
        Self {
            kind: MessageKind::StoreAck,
            payload: Vec::new(),
        }
    }

    pub fn load() -> Self {
        Self {
            kind: MessageKind::Load,
            payload: Vec::new(),
        }
    }

    /// A retrieve response carrying the raw packed bitmap.
    pub fn bitmap(bitmap: &PackedBitmap) -> Self {
        Self {
            kind: MessageKind::Bitmap,
            payload: bitmap.as_bytes().to_vec(),
        }
    }

    pub fn missing() -> Self {
        Self {
            kind: MessageKind::Missing,
            payload: Vec::new(),
        }
    }

    /// A failure reply with a human-readable reason.
    pub fn error(reason: &str) -> Self {
        Self {
            kind: MessageKind::Error,
            payload: reason.as_bytes().to_vec(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload as lossy UTF-8 (used for `Error` replies).
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Truncated blake3 checksum of the payload; 0 for empty payloads.
    fn checksum(&self) -> u32 {
        if self.payload.is_empty() {
            return 0;
        }
        let hash = blake3::hash(&self.payload);
        u32::from_le_bytes(hash.as_bytes()[0..4].try_into().unwrap_or([0; 4]))
    }
}

// ── WireCodec ────────────────────────────────────────────────────

/// Framed codec: [`Message`] ⇄ wire bytes.
#[derive(Debug, Default)]
pub struct WireCodec;

impl WireCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Message> for WireCodec {
    type Error = SketchError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), SketchError> {
        if item.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(SketchError::PayloadTooLarge {
                size: item.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        dst.reserve(HEADER_SIZE + item.payload.len());
        dst.put_slice(&MAGIC);
        dst.put_u32_le(item.checksum());
        dst.put_u8(item.kind as u8);
        dst.put_u32_le(item.payload.len() as u32);
        dst.put_slice(&item.payload);
        Ok(())
    }
}

impl Decoder for WireCodec {
    type Item = Message;
    type Error = SketchError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, SketchError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        if src[0..4] != MAGIC {
            return Err(SketchError::InvalidMagic);
        }

        let checksum = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
        let kind_byte = src[8];
        let payload_len = u32::from_le_bytes([src[9], src[10], src[11], src[12]]) as usize;

        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(SketchError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        if src.len() < HEADER_SIZE + payload_len {
            src.reserve(HEADER_SIZE + payload_len - src.len());
            return Ok(None);
        }

        let kind = MessageKind::try_from(kind_byte)?;

        src.advance(HEADER_SIZE);
        let payload = src.split_to(payload_len).to_vec();

        let message = Message { kind, payload };
        if !message.payload.is_empty() && message.checksum() != checksum {
            return Err(SketchError::ChecksumMismatch);
        }

        Ok(Some(message))
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! Luminance-threshold bit packing.
//!
//! Reduces the canvas to the display panel's native format: 1 bit per
//! pixel, row-major, 16 bytes per row. Within each byte, bit 0 is the
//! leftmost pixel of its 8-pixel group and bit 7 the rightmost, i.e.
//! byte `i`, bit `b` corresponds to pixel
//! `(x = (i % 16) * 8 + b, y = i / 16)`. A pixel packs to 1 iff its
//! luminance is strictly greater than 127 — no dithering.

use std::fmt;

use crate::error::SketchError;
use crate::raster::canvas::{CANVAS_HEIGHT, CANVAS_WIDTH, Canvas, CanvasPoint, LUM_OFF, LUM_ON};

/// Packed size of a full canvas in bytes.
pub const BITMAP_SIZE: usize = CANVAS_WIDTH * CANVAS_HEIGHT / 8;

/// Bytes per packed row. Relies on the width being a multiple of 8,
/// which is an invariant of the fixed canvas size.
const ROW_BYTES: usize = CANVAS_WIDTH / 8;

// ── PackedBitmap ─────────────────────────────────────────────────

/// A 1-bpp, byte-packed snapshot of the canvas — always exactly
/// [`BITMAP_SIZE`] bytes. Produced fresh on every export and never
/// mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedBitmap {
    bytes: [u8; BITMAP_SIZE],
}

impl PackedBitmap {
    /// Pack a canvas snapshot. Deterministic: the same canvas state
    /// always yields identical bytes.
    pub fn pack(canvas: &Canvas) -> Self {
        let mut bytes = [0u8; BITMAP_SIZE];
        let pixels = canvas.pixels();

        for y in 0..CANVAS_HEIGHT {
            for bx in 0..ROW_BYTES {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = bx * 8 + bit;
                    let on = pixels[y * CANVAS_WIDTH + x] > 127;
                    byte |= (on as u8) << bit;
                }
                bytes[y * ROW_BYTES + bx] = byte;
            }
        }

        Self { bytes }
    }

    /// Wrap raw bytes, validating the length. Used on the retrieve
    /// path, where a mismatched length is a protocol error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SketchError> {
        if bytes.len() != BITMAP_SIZE {
            return Err(SketchError::InvalidBitmapLength {
                expected: BITMAP_SIZE,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; BITMAP_SIZE];
        out.copy_from_slice(bytes);
        Ok(Self { bytes: out })
    }

    /// A bitmap with every pixel off.
    pub fn blank() -> Self {
        Self {
            bytes: [0u8; BITMAP_SIZE],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the packed pixel at `(x, y)` is on.
    pub fn bit(&self, x: usize, y: usize) -> bool {
        let byte = self.bytes[y * ROW_BYTES + x / 8];
        (byte >> (x % 8)) & 1 == 1
    }

    /// Expand this bitmap back onto a canvas: set bits become full
    /// luminance, clear bits become off.
    pub fn apply_to(&self, canvas: &mut Canvas) {
        for y in 0..CANVAS_HEIGHT {
            for x in 0..CANVAS_WIDTH {
                let lum = if self.bit(x, y) { LUM_ON } else { LUM_OFF };
                canvas.set(CanvasPoint::clamped(x as i32, y as i32), lum);
            }
        }
    }
}

impl fmt::Debug for PackedBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit: u32 = self.bytes.iter().map(|b| b.count_ones()).sum();
        f.debug_struct("PackedBitmap")
            .field("bytes", &BITMAP_SIZE)
            .field("lit_pixels", &lit)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────

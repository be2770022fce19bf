//! Byte-oriented run-length codec for live frame transport.
//!
//! The wire form is a sequence of `(run, value)` byte pairs: each pair
//! expands to `run` repetitions of `value`. Runs are capped at 255, so
//! a longer run is split into multiple pairs. Worst case (no repeated
//! bytes) doubles the input; a uniform 1024-byte bitmap shrinks to a
//! handful of pairs.
//!
//! This codec is only used for the live-transport path. Persisted
//! bitmaps are stored and retrieved raw — the asymmetry is deliberate.

use crate::error::SketchError;

/// Longest run expressible in a single pair.
const MAX_RUN: usize = 255;

/// Compress `bytes` into `(run, value)` pairs.
///
/// Every byte belongs to exactly one run, so a run length of zero is
/// never emitted.
pub fn encode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() / 4);
    let mut i = 0;

    while i < bytes.len() {
        let value = bytes[i];
        let mut run = 1usize;
        i += 1;
        while i < bytes.len() && bytes[i] == value && run < MAX_RUN {
            run += 1;
            i += 1;
        }
        out.push(run as u8);
        out.push(value);
    }

    out
}

/// Expand a `(run, value)` pair stream back into bytes.
///
/// A stream of odd length has a truncated final pair; a zero run
/// length can never be produced by [`encode`]. Both are malformed.
pub fn decode(stream: &[u8]) -> Result<Vec<u8>, SketchError> {
    if stream.len() % 2 != 0 {
        return Err(SketchError::MalformedRle("truncated final pair"));
    }

    let mut out = Vec::with_capacity(stream.len());
    for pair in stream.chunks_exact(2) {
        let (run, value) = (pair[0], pair[1]);
        if run == 0 {
            return Err(SketchError::MalformedRle("zero run length"));
        }
        out.resize(out.len() + run as usize, value);
    }

    Ok(out)
}

// ── Tests ────────────────────────────────────────────────────────

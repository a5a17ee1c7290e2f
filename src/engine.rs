// High-level diff/patch entry points.
//
// Ties the edit-script source to the patch codec: compute runs, translate
// them through a PatchEncoder, or apply a patch stream back onto the
// original bytes. The codec is independent of how the runs were produced;
// any sequence that partitions both inputs serializes correctly.

use std::io::{self, Write};

use log::debug;

use crate::patch::decoder::{self, DecodeError};
use crate::patch::encoder::PatchEncoder;
use crate::script;

/// Encode a patch transforming `original` into `new`, writing to `sink`.
///
/// Returns the sink after the escape tail has been flushed. Encoding never
/// fails on valid input; only sink I/O errors are propagated.
pub fn encode<W: Write>(original: &[u8], new: &[u8], sink: W) -> io::Result<W> {
    let runs = script::diff_runs(original, new);
    debug!(
        "encoding {} -> {} bytes, {} runs",
        original.len(),
        new.len(),
        runs.len()
    );
    let mut enc = PatchEncoder::new(sink);
    enc.write_script(&runs, new)?;
    enc.finish()
}

/// Encode a patch into a freshly allocated buffer.
pub fn encode_to_vec(original: &[u8], new: &[u8]) -> io::Result<Vec<u8>> {
    encode(original, new, Vec::new())
}

/// Reconstruct the new byte sequence from `original` and `patch`.
pub fn decode(original: &[u8], patch: &[u8]) -> Result<Vec<u8>, DecodeError> {
    decoder::apply(original, patch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

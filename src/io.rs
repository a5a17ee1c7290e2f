// File-level helpers for creating and applying patches.
//
// Provides `diff_file()` and `patch_file()` convenience functions around the
// in-memory engine, with buffered output and encode/apply statistics.
// Optionally computes SHA-256 digests of the inputs and outputs
// (feature-gated behind `file-io`).
//
// Both inputs are read fully into memory: the edit-script source needs
// random access to the whole of each sequence, and the original jdiff works
// the same way.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::engine;
use crate::patch::decoder::DecodeError;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `diff_file()`.
#[derive(Debug, Clone)]
pub struct DiffStats {
    /// Original file size in bytes.
    pub original_size: u64,
    /// New file size in bytes.
    pub new_size: u64,
    /// Patch output size in bytes.
    pub patch_size: u64,
    /// SHA-256 of the original file (if `file-io` feature is enabled).
    pub original_sha256: Option<[u8; 32]>,
    /// SHA-256 of the new file (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    /// Original file size in bytes.
    pub original_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level operations.
#[derive(Debug)]
pub enum IoError {
    /// I/O error (file open, read, write).
    Io(io::Error),
    /// Patch decoding error.
    Decode(DecodeError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<io::Error> for IoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DecodeError> for IoError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    let mut h = sha2::Sha256::new();
    h.update(data);
    Some(h.finalize().into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// diff_file
// ---------------------------------------------------------------------------

/// Encode a patch between `original_path` and `new_path` into `patch_path`.
pub fn diff_file(
    original_path: &Path,
    new_path: &Path,
    patch_path: &Path,
) -> Result<DiffStats, IoError> {
    let original = std::fs::read(original_path)?;
    let new = std::fs::read(new_path)?;

    let patch_file = File::create(patch_path)?;
    let writer = BufWriter::with_capacity(BUF_SIZE, patch_file);
    let writer = engine::encode(&original, &new, writer)?;
    let patch_size = writer.into_inner().map_err(|e| e.into_error())?.metadata()?.len();

    Ok(DiffStats {
        original_size: original.len() as u64,
        new_size: new.len() as u64,
        patch_size,
        original_sha256: sha256(&original),
        new_sha256: sha256(&new),
    })
}

/// Encode a patch between `original_path` and `new_path` to an arbitrary
/// sink (used by the CLI for stdout output). Returns the patch size.
pub fn diff_to_writer<W: Write>(
    original_path: &Path,
    new_path: &Path,
    sink: W,
) -> Result<(DiffStats, W), IoError> {
    let original = std::fs::read(original_path)?;
    let new = std::fs::read(new_path)?;

    let patch = engine::encode_to_vec(&original, &new)?;
    let mut sink = sink;
    sink.write_all(&patch)?;

    let stats = DiffStats {
        original_size: original.len() as u64,
        new_size: new.len() as u64,
        patch_size: patch.len() as u64,
        original_sha256: sha256(&original),
        new_sha256: sha256(&new),
    };
    Ok((stats, sink))
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply the patch at `patch_path` to `original_path`, writing the
/// reconstructed output to `output_path`.
pub fn patch_file(
    original_path: &Path,
    patch_path: &Path,
    output_path: &Path,
) -> Result<PatchStats, IoError> {
    let original = std::fs::read(original_path)?;
    let patch = std::fs::read(patch_path)?;

    let output = engine::decode(&original, &patch)?;

    let output_file = File::create(output_path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, output_file);
    writer.write_all(&output)?;
    writer.flush()?;

    Ok(PatchStats {
        original_size: original.len() as u64,
        patch_size: patch.len() as u64,
        output_size: output.len() as u64,
        output_sha256: sha256(&output),
    })
}

/// Apply a patch, writing the output to an arbitrary sink.
pub fn patch_to_writer<W: Write>(
    original_path: &Path,
    patch_path: &Path,
    sink: W,
) -> Result<(PatchStats, W), IoError> {
    let original = std::fs::read(original_path)?;
    let patch = std::fs::read(patch_path)?;

    let output = engine::decode(&original, &patch)?;
    let mut sink = sink;
    sink.write_all(&output)?;

    let stats = PatchStats {
        original_size: original.len() as u64,
        patch_size: patch.len() as u64,
        output_size: output.len() as u64,
        output_sha256: sha256(&output),
    };
    Ok((stats, sink))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

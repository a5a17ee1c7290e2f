//! Jojodiff: JojoDiff-compatible binary diff/patch in Rust.
//!
//! The crate provides:
//! - The JojoDiff patch stream codec (`patch`)
//! - A SequenceMatcher-style edit-script source (`script`)
//! - High-level encode/decode APIs (`engine`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! let original = b"hello old world";
//! let new = b"hello new world";
//!
//! let patch = jojodiff::engine::encode_to_vec(original, new).unwrap();
//! let restored = jojodiff::engine::decode(original, &patch).unwrap();
//! assert_eq!(restored, new);
//! ```

pub mod engine;
pub mod io;
pub mod patch;
pub mod script;

#[cfg(feature = "cli")]
pub mod cli;

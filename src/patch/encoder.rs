// Patch encoder: instruction emission and data-byte escaping.
//
// This module handles the format-level encoding: taking equal/delete/insert/
// replace runs and producing a valid JojoDiff patch stream. The edit-script
// computation (finding the runs) lives in the script module; this module is
// concerned only with the wire format.
//
// The one piece of cross-instruction state is `out_esc`: a literal 0xA7 data
// byte is never written immediately. Its emission is deferred until the next
// data byte (or end of stream) reveals whether a doubled-escape disambiguator
// is needed. The flag spans instruction boundaries, so a deferred byte's
// framing can land after a following instruction's header; the decoder
// mirrors the same state machine.

use std::io::{self, Write};

use super::length;
use super::opcode::{self, DEL, EQL, ESC, INS, MOD};
use crate::script::Run;

// ---------------------------------------------------------------------------
// Patch encoder
// ---------------------------------------------------------------------------

/// Streaming encoder for one patch stream.
///
/// One encoder serves exactly one stream: the escape state is reset at
/// construction and flushed by [`PatchEncoder::finish`], which must be called
/// to produce a decodable stream.
pub struct PatchEncoder<W: Write> {
    sink: W,
    /// Previous data byte was a literal ESC whose emission is still deferred.
    out_esc: bool,
}

impl<W: Write> PatchEncoder<W> {
    /// Create an encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            out_esc: false,
        }
    }

    /// Emit the instruction prefix: a raw ESC byte plus the marker.
    fn put_marker(&mut self, marker: u8) -> io::Result<()> {
        self.sink.write_all(&[ESC, marker])
    }

    /// Write a single data byte, escaping as the format requires.
    fn put_data(&mut self, byte: u8) -> io::Result<()> {
        if self.out_esc {
            self.out_esc = false;
            // A data byte in the marker range needs the doubled-escape
            // disambiguator before the deferred ESC itself.
            if opcode::is_marker(byte) {
                self.sink.write_all(&[ESC])?;
            }
            self.sink.write_all(&[ESC])?;
        }
        if byte == ESC {
            self.out_esc = true;
            Ok(())
        } else {
            self.sink.write_all(&[byte])
        }
    }

    /// `ESC EQL <length>`: copy `len` original bytes to the output.
    pub fn write_equal(&mut self, len: u64) -> io::Result<()> {
        self.put_marker(EQL)?;
        length::write(&mut self.sink, len)
    }

    /// `ESC DEL <length>`: skip `len` original bytes.
    pub fn write_delete(&mut self, len: u64) -> io::Result<()> {
        self.put_marker(DEL)?;
        length::write(&mut self.sink, len)
    }

    /// `ESC INS <escaped byte>`: append one byte without consuming input.
    pub fn write_insert(&mut self, byte: u8) -> io::Result<()> {
        self.put_marker(INS)?;
        self.put_data(byte)
    }

    /// `ESC MOD <escaped byte>`: replace one original byte with `byte`.
    pub fn write_mod(&mut self, byte: u8) -> io::Result<()> {
        self.put_marker(MOD)?;
        self.put_data(byte)
    }

    /// Translate one edit-script run into instructions.
    ///
    /// Zero-length equal and delete runs are dropped. An equal-length replace
    /// becomes MOD bytes in lockstep; any other replace becomes one DEL (when
    /// the old side is non-empty) followed by per-byte INS.
    pub fn write_run(&mut self, run: &Run, new: &[u8]) -> io::Result<()> {
        match *run {
            Run::Equal { old_start, old_end, .. } => {
                if old_end > old_start {
                    self.write_equal((old_end - old_start) as u64)?;
                }
            }
            Run::Delete { old_start, old_end } => {
                if old_end > old_start {
                    self.write_delete((old_end - old_start) as u64)?;
                }
            }
            Run::Insert { new_start, new_end } => {
                for &b in &new[new_start..new_end] {
                    self.write_insert(b)?;
                }
            }
            Run::Replace {
                old_start,
                old_end,
                new_start,
                new_end,
            } => {
                let dels = old_end - old_start;
                let inserts = new_end - new_start;
                if dels == inserts && dels > 0 {
                    for &b in &new[new_start..new_end] {
                        self.write_mod(b)?;
                    }
                } else {
                    if dels > 0 {
                        self.write_delete(dels as u64)?;
                    }
                    for &b in &new[new_start..new_end] {
                        self.write_insert(b)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Translate a whole edit script in run order.
    pub fn write_script<'a, I>(&mut self, runs: I, new: &[u8]) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a Run>,
    {
        for run in runs {
            self.write_run(run, new)?;
        }
        Ok(())
    }

    /// Flush the escape tail and the sink, returning the inner writer.
    ///
    /// A pending literal ESC is emitted as a doubled `ESC ESC` so the decoder
    /// can resolve it at end of stream; skipping this flush would truncate
    /// the final data byte.
    pub fn finish(mut self) -> io::Result<W> {
        if self.out_esc {
            self.out_esc = false;
            self.sink.write_all(&[ESC, ESC])?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Patch decoder: instruction parsing and output reconstruction.
//
// Exact dual of the encoder. The parser mirrors the encoder's escape state:
// `pending` is true while a previously deferred literal-ESC operand still has
// framing bytes on the wire. Deferral itself pins the operand value (only
// 0xA7 is ever deferred), so the instruction can be yielded in stream order
// even though its framing may arrive after later EQL/DEL instructions.
//
// End of stream is terminal, not an error, provided it does not land inside
// an instruction. The format carries no redundancy; any malformed byte
// aborts the decode with its offset.

use thiserror::Error;

use super::length;
use super::opcode::{self, BKT, DEL, EQL, ESC, INS, Instruction, MOD};

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A length tier selector declared more operand bytes than remain.
    #[error("malformed length at byte {offset}: operand truncated")]
    MalformedLength { offset: usize },

    /// The byte following an ESC is neither a marker nor valid escape
    /// framing.
    #[error("unexpected marker {byte:#04x} at byte {offset}")]
    UnexpectedMarker { offset: usize, byte: u8 },

    /// An INS/MOD operand (or its escape framing) is cut off at stream end.
    #[error("truncated operand at byte {offset}")]
    TruncatedOperand { offset: usize },

    /// An instruction would advance the original cursor past its end.
    #[error(
        "cursor overrun at byte {offset}: instruction consumes {requested} \
         original bytes but only {available} remain past offset {cursor}"
    )]
    CursorOverrun {
        offset: usize,
        cursor: usize,
        requested: u64,
        available: usize,
    },

    /// A raw data byte where an escaped instruction was required.
    #[error("stray data byte {byte:#04x} at byte {offset}")]
    StrayData { offset: usize, byte: u8 },
}

// ---------------------------------------------------------------------------
// Instruction iterator
// ---------------------------------------------------------------------------

/// Iterates over the instructions of a patch stream.
///
/// Yields instructions in application order. After yielding an error the
/// iterator is fused.
pub struct InstructionIterator<'a> {
    patch: &'a [u8],
    pos: usize,
    /// Mirror of the encoder's escape flag: a deferred literal-ESC operand
    /// was already yielded, but its framing bytes are still on the wire.
    pending: bool,
    done: bool,
}

impl<'a> InstructionIterator<'a> {
    pub fn new(patch: &'a [u8]) -> Self {
        Self {
            patch,
            pos: 0,
            pending: false,
            done: false,
        }
    }

    /// Current byte offset into the patch (start of the next instruction).
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn read_length(&mut self) -> Result<u64, DecodeError> {
        let offset = self.pos;
        let (len, consumed) = length::read(&self.patch[self.pos..])
            .map_err(|_| DecodeError::MalformedLength { offset })?;
        self.pos += consumed;
        Ok(len)
    }

    /// Read the single escaped-byte operand of an INS/MOD instruction.
    ///
    /// With `pending` set, the previous deferred operand's framing comes
    /// first: one ESC when this operand is a plain byte, a doubled ESC when
    /// it falls in the marker range (or is itself a deferred literal ESC).
    fn read_operand(&mut self) -> Result<u8, DecodeError> {
        if self.pending {
            let Some(&x) = self.patch.get(self.pos) else {
                return Err(DecodeError::TruncatedOperand { offset: self.pos });
            };
            if x != ESC {
                return Err(DecodeError::StrayData {
                    offset: self.pos,
                    byte: x,
                });
            }
            self.pos += 1;
            let Some(&y) = self.patch.get(self.pos) else {
                return Err(DecodeError::TruncatedOperand { offset: self.pos });
            };
            if y != ESC {
                // Single-ESC framing: the operand follows directly and must
                // be outside the marker range.
                if opcode::is_marker(y) {
                    return Err(DecodeError::UnexpectedMarker {
                        offset: self.pos,
                        byte: y,
                    });
                }
                self.pos += 1;
                self.pending = false;
                return Ok(y);
            }
            // Doubled-ESC framing consumed; the operand is next.
            self.pos += 1;
            match self.patch.get(self.pos) {
                None => Err(DecodeError::TruncatedOperand { offset: self.pos }),
                Some(&ESC) => {
                    // Deferred again; the byte stays on the wire as the next
                    // structure's escape.
                    Ok(ESC)
                }
                Some(&z) if opcode::is_marker(z) => {
                    self.pos += 1;
                    self.pending = false;
                    Ok(z)
                }
                Some(&z) => Err(DecodeError::UnexpectedMarker {
                    offset: self.pos,
                    byte: z,
                }),
            }
        } else {
            match self.patch.get(self.pos) {
                None => Err(DecodeError::TruncatedOperand { offset: self.pos }),
                Some(&ESC) => {
                    // Emission deferred by the encoder: the operand is a
                    // literal ESC and this byte belongs to what follows.
                    self.pending = true;
                    Ok(ESC)
                }
                Some(&b) => {
                    self.pos += 1;
                    Ok(b)
                }
            }
        }
    }

    fn next_instruction(&mut self) -> Result<Option<Instruction>, DecodeError> {
        loop {
            if self.pos >= self.patch.len() {
                if self.pending {
                    // The encoder always flushes a deferred ESC before
                    // closing; a missing tail is a truncated stream.
                    return Err(DecodeError::TruncatedOperand { offset: self.pos });
                }
                return Ok(None);
            }
            let esc_offset = self.pos;
            let b = self.patch[self.pos];
            if b != ESC {
                return Err(DecodeError::StrayData {
                    offset: esc_offset,
                    byte: b,
                });
            }
            self.pos += 1;
            let Some(&marker) = self.patch.get(self.pos) else {
                return Err(DecodeError::TruncatedOperand { offset: esc_offset });
            };
            self.pos += 1;
            return match marker {
                EQL => Ok(Some(Instruction::Equal(self.read_length()?))),
                DEL => Ok(Some(Instruction::Delete(self.read_length()?))),
                INS => Ok(Some(Instruction::Insert(self.read_operand()?))),
                MOD => Ok(Some(Instruction::Mod(self.read_operand()?))),
                BKT => Ok(Some(Instruction::Backtrace(self.read_length()?))),
                ESC if self.pending => {
                    // End-of-stream flush of a deferred literal ESC; the
                    // instruction itself was already yielded.
                    self.pending = false;
                    continue;
                }
                other => Err(DecodeError::UnexpectedMarker {
                    offset: esc_offset + 1,
                    byte: other,
                }),
            };
        }
    }
}

impl Iterator for InstructionIterator<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_instruction() {
            Ok(Some(inst)) => Some(Ok(inst)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Patch application
// ---------------------------------------------------------------------------

/// Reconstruct the new byte sequence from `original` and `patch`.
pub fn apply(original: &[u8], patch: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut output = Vec::with_capacity(original.len());
    let mut cursor = 0usize;
    let mut iter = InstructionIterator::new(patch);

    loop {
        let offset = iter.offset();
        let Some(item) = iter.next() else { break };
        match item? {
            Instruction::Equal(len) => {
                let available = original.len() - cursor;
                if len > available as u64 {
                    return Err(DecodeError::CursorOverrun {
                        offset,
                        cursor,
                        requested: len,
                        available,
                    });
                }
                let len = len as usize;
                output.extend_from_slice(&original[cursor..cursor + len]);
                cursor += len;
            }
            Instruction::Delete(len) => {
                let available = original.len() - cursor;
                if len > available as u64 {
                    return Err(DecodeError::CursorOverrun {
                        offset,
                        cursor,
                        requested: len,
                        available,
                    });
                }
                cursor += len as usize;
            }
            Instruction::Insert(b) => output.push(b),
            Instruction::Mod(b) => {
                if cursor >= original.len() {
                    return Err(DecodeError::CursorOverrun {
                        offset,
                        cursor,
                        requested: 1,
                        available: 0,
                    });
                }
                output.push(b);
                cursor += 1;
            }
            // Reserved; no cursor or output effect.
            Instruction::Backtrace(_) => {}
        }
    }

    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn instructions(patch: &[u8]) -> Vec<Instruction> {
        InstructionIterator::new(patch)
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn parses_length_instructions() {
        let patch = [0xA7, 0xA3, 0x04, 0xA7, 0xA4, 252, 0x2F];
        assert_eq!(
            instructions(&patch),
            [Instruction::Equal(5), Instruction::Delete(300)]
        );
    }

    #[test]
    fn parses_plain_operands() {
        let patch = [0xA7, 0xA5, 0x41, 0xA7, 0xA6, 0xA3];
        assert_eq!(
            instructions(&patch),
            [Instruction::Insert(0x41), Instruction::Mod(0xA3)]
        );
    }

    #[test]
    fn resolves_trailing_literal_escape() {
        let patch = [0xA7, 0xA5, 0xA7, 0xA7];
        assert_eq!(instructions(&patch), [Instruction::Insert(0xA7)]);
    }

    #[test]
    fn resolves_literal_escape_before_plain_byte() {
        let patch = [0xA7, 0xA5, 0xA7, 0xA5, 0xA7, 0x41];
        assert_eq!(
            instructions(&patch),
            [Instruction::Insert(0xA7), Instruction::Insert(0x41)]
        );
    }

    #[test]
    fn resolves_literal_escape_before_marker_range_byte() {
        let patch = [0xA7, 0xA5, 0xA7, 0xA5, 0xA7, 0xA7, 0xA3];
        assert_eq!(
            instructions(&patch),
            [Instruction::Insert(0xA7), Instruction::Insert(0xA3)]
        );
    }

    #[test]
    fn deferred_operand_keeps_stream_order() {
        // INS 0xA7 followed by EQL 3; the escape framing trails the EQL but
        // the insert is yielded first.
        let patch = [0xA7, 0xA5, 0xA7, 0xA3, 0x02, 0xA7, 0xA7];
        assert_eq!(
            instructions(&patch),
            [Instruction::Insert(0xA7), Instruction::Equal(3)]
        );
    }

    #[test]
    fn consecutive_literal_escapes() {
        let patch = [0xA7, 0xA5, 0xA7, 0xA5, 0xA7, 0xA7, 0xA7, 0xA7];
        assert_eq!(
            instructions(&patch),
            [Instruction::Insert(0xA7), Instruction::Insert(0xA7)]
        );
    }

    #[test]
    fn backtrace_is_parsed_and_inert() {
        let patch = [0xA7, 0xA2, 0x05, 0xA7, 0xA3, 0x01];
        assert_eq!(
            instructions(&patch),
            [Instruction::Backtrace(6), Instruction::Equal(2)]
        );
        assert_eq!(apply(b"ab", &patch).unwrap(), b"ab");
    }

    #[test]
    fn empty_patch_is_empty_output() {
        assert!(instructions(&[]).is_empty());
        assert_eq!(apply(b"anything", &[]).unwrap(), b"");
    }

    #[test]
    fn applies_all_instruction_kinds() {
        // orig "abcdef": keep "ab", skip "c", mod 'd'->'X', insert 'Y',
        // keep "ef".
        let patch = [
            0xA7, 0xA3, 0x01, // EQL 2
            0xA7, 0xA4, 0x00, // DEL 1
            0xA7, 0xA6, b'X', // MOD
            0xA7, 0xA5, b'Y', // INS
            0xA7, 0xA3, 0x01, // EQL 2
        ];
        assert_eq!(apply(b"abcdef", &patch).unwrap(), b"abXYef");
    }

    #[test]
    fn dangling_escape_is_truncated_operand() {
        let err = instructions_err(&[0xA7]);
        assert!(matches!(err, DecodeError::TruncatedOperand { offset: 0 }));

        // Deferred insert operand with no flush before EOF.
        let err = instructions_err(&[0xA7, 0xA5, 0xA7]);
        assert!(matches!(err, DecodeError::TruncatedOperand { .. }));
    }

    #[test]
    fn missing_operand_is_truncated() {
        let err = instructions_err(&[0xA7, 0xA5]);
        assert!(matches!(err, DecodeError::TruncatedOperand { offset: 2 }));
    }

    #[test]
    fn truncated_length_reports_offset() {
        let err = instructions_err(&[0xA7, 0xA3, 253, 0x01]);
        assert!(matches!(err, DecodeError::MalformedLength { offset: 2 }));
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let err = instructions_err(&[0xA7, 0x42]);
        assert!(matches!(
            err,
            DecodeError::UnexpectedMarker {
                offset: 1,
                byte: 0x42
            }
        ));
    }

    #[test]
    fn doubled_escape_without_pending_is_rejected() {
        let err = instructions_err(&[0xA7, 0xA7]);
        assert!(matches!(
            err,
            DecodeError::UnexpectedMarker {
                offset: 1,
                byte: 0xA7
            }
        ));
    }

    #[test]
    fn raw_data_at_instruction_boundary_is_rejected() {
        let err = instructions_err(&[0x41]);
        assert!(matches!(
            err,
            DecodeError::StrayData {
                offset: 0,
                byte: 0x41
            }
        ));
    }

    #[test]
    fn equal_past_original_end_is_cursor_overrun() {
        let patch = [0xA7, 0xA3, 0x09]; // EQL 10
        let err = apply(b"short", &patch).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::CursorOverrun {
                requested: 10,
                available: 5,
                ..
            }
        ));
    }

    #[test]
    fn mod_past_original_end_is_cursor_overrun() {
        let patch = [0xA7, 0xA3, 0x00, 0xA7, 0xA6, b'x'];
        let err = apply(b"a", &patch).unwrap_err();
        assert!(matches!(err, DecodeError::CursorOverrun { cursor: 1, .. }));
    }

    #[test]
    fn iterator_is_fused_after_error() {
        let mut iter = InstructionIterator::new(&[0x41, 0xA7, 0xA3, 0x00]);
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    fn instructions_err(patch: &[u8]) -> DecodeError {
        InstructionIterator::new(patch)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err()
    }
}

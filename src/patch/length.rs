// JojoDiff run-length encoding.
//
// Tiered, self-delimiting prefix keyed on the first byte:
//
//   first byte 0..=251   length = byte + 1           (1 byte total)
//   first byte 252       length = next byte + 253    (2 bytes)
//   first byte 253       length = big-endian u16     (3 bytes)
//   first byte 254       length = big-endian u32     (5 bytes)
//   first byte 255       length = big-endian u64     (9 bytes)
//
// Lengths are always >= 1; the one-byte tier stores `length - 1` so the
// full 0..=251 byte range is usable.

use std::io::{self, Write};

/// Maximum encoded length of a run length (selector + 64-bit operand).
pub const MAX_LEN_BYTES: usize = 9;

// Tier boundaries (inclusive upper ends).
const TIER1_MAX: u64 = 252;
const TIER2_MAX: u64 = 508;
const TIER3_MAX: u64 = 0xFFFF;
const TIER4_MAX: u64 = 0xFFFF_FFFF;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `len` into `buf`, returning the number of bytes used (1..=9).
///
/// `len` must be >= 1; run suppression happens upstream in the encoder.
#[inline]
pub fn encode(len: u64, buf: &mut [u8; MAX_LEN_BYTES]) -> usize {
    debug_assert!(len >= 1, "zero-length runs are never encoded");
    if len <= TIER1_MAX {
        buf[0] = (len - 1) as u8;
        1
    } else if len <= TIER2_MAX {
        buf[0] = 252;
        buf[1] = (len - 253) as u8;
        2
    } else if len <= TIER3_MAX {
        buf[0] = 253;
        buf[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        3
    } else if len <= TIER4_MAX {
        buf[0] = 254;
        buf[1..5].copy_from_slice(&(len as u32).to_be_bytes());
        5
    } else {
        buf[0] = 255;
        buf[1..9].copy_from_slice(&len.to_be_bytes());
        9
    }
}

/// Encode `len` and write it to a `Write` sink.
pub fn write<W: Write>(w: &mut W, len: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_LEN_BYTES];
    let n = encode(len, &mut buf);
    w.write_all(&buf[..n])
}

/// Return the encoded byte-width of `len`.
#[inline]
pub fn encoded_len(len: u64) -> usize {
    if len <= TIER1_MAX {
        1
    } else if len <= TIER2_MAX {
        2
    } else if len <= TIER3_MAX {
        3
    } else if len <= TIER4_MAX {
        5
    } else {
        9
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a length from the front of `data`.
///
/// Returns `(length, bytes_consumed)`. A tier selector (252..=255) followed
/// by fewer bytes than its operand width is a framing error.
pub fn read(data: &[u8]) -> Result<(u64, usize), LengthError> {
    let &first = data.first().ok_or(LengthError::Truncated)?;
    match first {
        0..=251 => Ok((u64::from(first) + 1, 1)),
        252 => {
            let &b = data.get(1).ok_or(LengthError::Truncated)?;
            Ok((u64::from(b) + 253, 2))
        }
        253 => {
            let bytes = data.get(1..3).ok_or(LengthError::Truncated)?;
            Ok((u64::from(u16::from_be_bytes(bytes.try_into().unwrap())), 3))
        }
        254 => {
            let bytes = data.get(1..5).ok_or(LengthError::Truncated)?;
            Ok((u64::from(u32::from_be_bytes(bytes.try_into().unwrap())), 5))
        }
        255 => {
            let bytes = data.get(1..9).ok_or(LengthError::Truncated)?;
            Ok((u64::from_be_bytes(bytes.try_into().unwrap()), 9))
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthError {
    /// A tier selector declared more operand bytes than the stream holds.
    Truncated,
}

impl std::fmt::Display for LengthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthError::Truncated => write!(f, "length operand truncated"),
        }
    }
}

impl std::error::Error for LengthError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_across_tiers() {
        let cases: &[u64] = &[
            1,
            2,
            251,
            252,
            253,
            254,
            508,
            509,
            510,
            0xFFFF,
            0x1_0000,
            0xFFFF_FFFF,
            0x1_0000_0000,
            u64::MAX,
        ];
        let mut buf = [0u8; MAX_LEN_BYTES];
        for &len in cases {
            let n = encode(len, &mut buf);
            let (decoded, consumed) = read(&buf[..n]).unwrap();
            assert_eq!(decoded, len, "roundtrip failed for {len}");
            assert_eq!(consumed, n, "consumed mismatch for {len}");
            assert_eq!(encoded_len(len), n, "width mismatch for {len}");
        }
    }

    #[test]
    fn tier_boundary_widths() {
        assert_eq!(encoded_len(252), 1);
        assert_eq!(encoded_len(253), 2);
        assert_eq!(encoded_len(508), 2);
        assert_eq!(encoded_len(509), 3);
        assert_eq!(encoded_len(65535), 3);
        assert_eq!(encoded_len(65536), 5);
        assert_eq!(encoded_len(u64::from(u32::MAX)), 5);
        assert_eq!(encoded_len(u64::from(u32::MAX) + 1), 9);
    }

    #[test]
    fn exact_tier_bytes() {
        let mut buf = [0u8; MAX_LEN_BYTES];

        let n = encode(1, &mut buf);
        assert_eq!(&buf[..n], &[0x00]);

        let n = encode(252, &mut buf);
        assert_eq!(&buf[..n], &[0xFB]);

        let n = encode(253, &mut buf);
        assert_eq!(&buf[..n], &[252, 0x00]);

        let n = encode(508, &mut buf);
        assert_eq!(&buf[..n], &[252, 0xFF]);

        let n = encode(509, &mut buf);
        assert_eq!(&buf[..n], &[253, 0x01, 0xFD]);

        let n = encode(65535, &mut buf);
        assert_eq!(&buf[..n], &[253, 0xFF, 0xFF]);

        let n = encode(65536, &mut buf);
        assert_eq!(&buf[..n], &[254, 0x00, 0x01, 0x00, 0x00]);

        let n = encode(1 << 32, &mut buf);
        assert_eq!(&buf[..n], &[255, 0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn truncated_selectors_are_errors() {
        assert_eq!(read(&[]), Err(LengthError::Truncated));
        assert_eq!(read(&[252]), Err(LengthError::Truncated));
        assert_eq!(read(&[253, 0x01]), Err(LengthError::Truncated));
        assert_eq!(read(&[254, 0, 0, 0]), Err(LengthError::Truncated));
        assert_eq!(read(&[255, 0, 0, 0, 0, 0, 0, 0]), Err(LengthError::Truncated));
    }

    #[test]
    fn write_read_roundtrip() {
        let mut out = Vec::new();
        write(&mut out, 70000).unwrap();
        let (len, consumed) = read(&out).unwrap();
        assert_eq!(len, 70000);
        assert_eq!(consumed, out.len());
    }
}

//! Variable-length integer (varint) encoding.
//!
//! Each byte carries 7 bits of data, least significant group first; the high
//! bit says whether another byte follows.
//!
//! Format:
//! - Bits 0-6: Data bits
//! - Bit 7: Continuation flag (1 = more bytes follow)
//!
//! Signed values are folded as `|v| << 1 | sign` and written through the wide
//! encoder, so `i32::MIN` becomes `(1 << 32) | 1` without overflowing.

use std::io::{self, Read, Write};

use crate::config::EofPolicy;
use crate::error::{IsfError, Result};

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

/// Longest encoding of a `u64`.
pub const MAX_WIDE_VARINT_LEN: usize = 10;

/// Shift at which [`decode_unsigned`] stops reading (5 bytes).
const NARROW_SHIFT_LIMIT: u32 = 29;

/// Shift at which [`decode_unsigned_wide`] stops reading (9 bytes).
const WIDE_SHIFT_LIMIT: u32 = 57;

/// Encode into a stack buffer, returning the used length.
#[inline]
fn encode_to_buf(mut value: u64, buf: &mut [u8; MAX_WIDE_VARINT_LEN]) -> usize {
    let mut len = 0;
    while value > 0x7F {
        buf[len] = (value as u8 & 0x7F) | 0x80;
        value >>= 7;
        len += 1;
    }
    buf[len] = value as u8;
    len + 1
}

/// Zig-zag fold used by the signed encoders.
#[inline]
fn fold_signed(value: i32) -> u64 {
    let magnitude = u64::from(value.unsigned_abs()) << 1;
    if value < 0 {
        magnitude | 1
    } else {
        magnitude
    }
}

/// Inverse of [`fold_signed`]. Magnitudes past `2^31` wrap like the legacy cast.
#[inline]
fn unfold_signed(value: u64) -> i32 {
    let magnitude = (value >> 1) as u32 as i32;
    if value & 1 != 0 {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

/// Write `value` to `stream`, returning bytes written (1-5).
pub fn encode_unsigned<W: Write>(stream: &mut W, value: u32) -> Result<usize> {
    encode_unsigned_wide(stream, u64::from(value))
}

/// Write a 64-bit `value` to `stream`, returning bytes written.
pub fn encode_unsigned_wide<W: Write>(stream: &mut W, value: u64) -> Result<usize> {
    let mut buf = [0u8; MAX_WIDE_VARINT_LEN];
    let len = encode_to_buf(value, &mut buf);
    stream.write_all(&buf[..len])?;
    Ok(len)
}

/// Zig-zag encode `value` and write it to `stream`.
pub fn encode_signed<W: Write>(stream: &mut W, value: i32) -> Result<usize> {
    encode_unsigned_wide(stream, fold_signed(value))
}

/// Append the encoding of `value` to `out`. Infallible counterpart of
/// [`encode_unsigned`].
pub fn encode_unsigned_into(out: &mut Vec<u8>, value: u32) -> usize {
    let mut buf = [0u8; MAX_WIDE_VARINT_LEN];
    let len = encode_to_buf(u64::from(value), &mut buf);
    out.extend_from_slice(&buf[..len]);
    len
}

/// Append the zig-zag encoding of `value` to `out`.
pub fn encode_signed_into(out: &mut Vec<u8>, value: i32) -> usize {
    let mut buf = [0u8; MAX_WIDE_VARINT_LEN];
    let len = encode_to_buf(fold_signed(value), &mut buf);
    out.extend_from_slice(&buf[..len]);
    len
}

/// Bytes [`encode_unsigned`] would write for `value`.
#[inline]
pub fn var_size(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Fetch one byte, applying the end-of-input policy.
#[inline]
fn next_byte<R: Read>(stream: &mut R, consumed: usize, policy: EofPolicy) -> Result<u8> {
    let mut byte = [0u8; 1];
    match stream.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => match policy {
            EofPolicy::LegacySentinel => Ok(0xFF),
            EofPolicy::Strict => Err(IsfError::TruncatedInput {
                needed: consumed + 1,
                have: consumed,
            }),
        },
        Err(e) => Err(e.into()),
    }
}

/// Read a varint of at most 5 bytes. Returns the value and bytes consumed.
///
/// Bits beyond 32 in the fifth byte are discarded.
pub fn decode_unsigned<R: Read>(stream: &mut R, policy: EofPolicy) -> Result<(u32, usize)> {
    let mut value = 0u32;
    let mut shift = 0u32;
    let mut count = 0usize;

    loop {
        let byte = next_byte(stream, count, policy)?;
        count += 1;
        value = value.wrapping_add(u32::from(byte & 0x7F) << shift);
        shift += 7;

        if byte & 0x80 == 0 || shift >= NARROW_SHIFT_LIMIT {
            return Ok((value, count));
        }
    }
}

/// Read a varint of at most 9 bytes.
pub fn decode_unsigned_wide<R: Read>(stream: &mut R, policy: EofPolicy) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut count = 0usize;

    loop {
        let byte = next_byte(stream, count, policy)?;
        count += 1;
        value |= u64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 || shift >= WIDE_SHIFT_LIMIT {
            return Ok((value, count));
        }
    }
}

/// Read a zig-zag encoded signed varint.
pub fn decode_signed<R: Read>(stream: &mut R, policy: EofPolicy) -> Result<(i32, usize)> {
    let (folded, count) = decode_unsigned_wide(stream, policy)?;
    Ok((unfold_signed(folded), count))
}

/// Helper for reading consecutive varints out of a byte slice.
pub struct VarIntReader<'a> {
    data: &'a [u8],
    offset: usize,
    policy: EofPolicy,
}

impl<'a> VarIntReader<'a> {
    pub fn new(data: &'a [u8], policy: EofPolicy) -> Self {
        Self {
            data,
            offset: 0,
            policy,
        }
    }

    /// Read the next unsigned varint.
    pub fn read_unsigned(&mut self) -> Result<u32> {
        let mut rest = self.remaining();
        let (value, consumed) = decode_unsigned(&mut rest, self.policy)?;
        self.advance(consumed);
        Ok(value)
    }

    /// Read the next signed varint.
    pub fn read_signed(&mut self) -> Result<i32> {
        let mut rest = self.remaining();
        let (value, consumed) = decode_signed(&mut rest, self.policy)?;
        self.advance(consumed);
        Ok(value)
    }

    /// Bytes consumed so far. Legacy sentinel bytes do not count past the end.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Unread part of the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    fn advance(&mut self, consumed: usize) {
        self.offset = (self.offset + consumed).min(self.data.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn encode(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        encode_unsigned(&mut out, value).unwrap();
        out
    }

    #[test_case(0, &[0x00]; "zero")]
    #[test_case(127, &[0x7F]; "one byte max")]
    #[test_case(128, &[0x80, 0x01]; "two bytes min")]
    #[test_case(300, &[0xAC, 0x02]; "three hundred")]
    #[test_case(16384, &[0x80, 0x80, 0x01]; "three bytes min")]
    #[test_case(u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]; "u32 max")]
    fn test_encode_unsigned(value: u32, expected: &[u8]) {
        assert_eq!(encode(value), expected);
        assert_eq!(var_size(value), expected.len());
    }

    #[test]
    fn test_decode_unsigned() {
        let data = [0xAC, 0x02, 0x7F];
        let mut stream = &data[..];
        assert_eq!(decode_unsigned(&mut stream, EofPolicy::Strict).unwrap(), (300, 2));
        assert_eq!(decode_unsigned(&mut stream, EofPolicy::Strict).unwrap(), (127, 1));
    }

    #[test]
    fn test_decode_caps_at_five_bytes() {
        // Continuation set on the fifth byte; the sixth must stay unread.
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut stream = &data[..];
        let (_, consumed) = decode_unsigned(&mut stream, EofPolicy::Strict).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(stream, &[0x01]);
    }

    #[test]
    fn test_decode_wide_caps_at_nine_bytes() {
        let data = [0x80u8; 12];
        let mut stream = &data[..];
        let (value, consumed) = decode_unsigned_wide(&mut stream, EofPolicy::Strict).unwrap();
        assert_eq!(value, 0);
        assert_eq!(consumed, 9);
    }

    #[test]
    fn test_signed_extremes() {
        let mut out = Vec::new();
        encode_signed(&mut out, i32::MIN).unwrap();
        // (1 << 32) | 1
        assert_eq!(out, [0x81, 0x80, 0x80, 0x80, 0x10]);

        let mut stream = &out[..];
        assert_eq!(
            decode_signed(&mut stream, EofPolicy::Strict).unwrap(),
            (i32::MIN, 5)
        );

        for value in [i32::MAX, -1, 0, 1, -64, 64] {
            let mut out = Vec::new();
            let written = encode_signed(&mut out, value).unwrap();
            let mut stream = &out[..];
            assert_eq!(
                decode_signed(&mut stream, EofPolicy::Strict).unwrap(),
                (value, written)
            );
        }
    }

    #[test]
    fn test_signed_into_matches_stream() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        encode_signed(&mut a, -12345).unwrap();
        encode_signed_into(&mut b, -12345);
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncated_strict() {
        let data = [0x80];
        let mut stream = &data[..];
        let err = decode_unsigned(&mut stream, EofPolicy::Strict).unwrap_err();
        assert!(matches!(err, IsfError::TruncatedInput { needed: 2, have: 1 }));
    }

    #[test]
    fn test_truncated_legacy_sentinel() {
        // 0x80 then four sentinel 0xFF bytes: 0 + 0x7F<<7 + 0x7F<<14 + 0x7F<<21 + 0x7F<<28
        let data = [0x80];
        let mut stream = &data[..];
        let (value, consumed) = decode_unsigned(&mut stream, EofPolicy::LegacySentinel).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(value, 0xFFFF_FF80);
    }

    #[test]
    fn test_empty_strict() {
        let mut stream: &[u8] = &[];
        assert!(decode_signed(&mut stream, EofPolicy::Strict).is_err());
    }

    #[test]
    fn test_varint_reader() {
        let mut data = Vec::new();
        encode_signed_into(&mut data, -3);
        encode_unsigned_into(&mut data, 200);
        data.push(0x55);

        let mut reader = VarIntReader::new(&data, EofPolicy::Strict);
        assert_eq!(reader.read_signed().unwrap(), -3);
        assert_eq!(reader.read_unsigned().unwrap(), 200);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.remaining(), &[0x55]);
    }
}

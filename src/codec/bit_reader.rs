//! Bit reader for packed ISF streams.
//!
//! Reads bits from a byte stream, MSB first. Fields are 1-32 bits wide and
//! may straddle byte boundaries.

use crate::error::{IsfError, Result};

/// Bit reader that reads from a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_pos: u64,
    /// Current bit buffer, next bit in bit 63
    buffer: u64,
    /// Bits available in buffer
    bits_in_buffer: u32,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = Self {
            data,
            pos: 0,
            bit_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        };
        reader.fill_buffer();
        reader
    }

    /// Fill the buffer with more bytes.
    fn fill_buffer(&mut self) {
        while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
            self.buffer |= u64::from(self.data[self.pos]) << (56 - self.bits_in_buffer);
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    fn truncated(&self, n: u32) -> IsfError {
        let consumed = self.byte_position();
        let needed = ((self.bit_pos + u64::from(n) + 7) / 8) as usize;
        IsfError::TruncatedInput {
            needed: needed.max(consumed + 1),
            have: self.data.len(),
        }
    }

    /// Peek at the next n bits without consuming them.
    #[inline]
    pub fn peek_bits(&self, n: u32) -> u32 {
        debug_assert!((1..=32).contains(&n));
        (self.buffer >> (64 - n)) as u32
    }

    /// Read n bits (1-32) and advance the position.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!((1..=32).contains(&n));

        if n > self.bits_in_buffer {
            return Err(self.truncated(n));
        }

        let value = self.peek_bits(n);
        self.advance_bits(n);
        Ok(value)
    }

    /// Advance by n bits.
    #[inline]
    fn advance_bits(&mut self, n: u32) {
        self.buffer <<= n;
        self.bits_in_buffer = self.bits_in_buffer.saturating_sub(n);
        self.bit_pos += u64::from(n);
        self.fill_buffer();
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read up to 8 bits into the low bits of a byte.
    #[inline]
    pub fn read_byte(&mut self, n: u32) -> Result<u8> {
        debug_assert!((1..=8).contains(&n));
        Ok(self.read_bits(n)? as u8)
    }

    /// Read up to 16 bits stored low byte first.
    ///
    /// Whole bytes come first; a trailing partial byte supplies the high bits.
    pub fn read_u16_reverse(&mut self, n: u32) -> Result<u16> {
        debug_assert!((1..=16).contains(&n));
        Ok(self.read_reverse(n)? as u16)
    }

    /// Read up to 32 bits stored low byte first.
    pub fn read_u32_reverse(&mut self, n: u32) -> Result<u32> {
        debug_assert!((1..=32).contains(&n));
        self.read_reverse(n)
    }

    fn read_reverse(&mut self, mut n: u32) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0;
        while n > 0 {
            let take = n.min(8);
            value |= u32::from(self.read_byte(take)?) << shift;
            shift += 8;
            n -= take;
        }
        Ok(value)
    }

    /// Get the current bit position.
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Bytes touched so far, counting a partially read byte.
    pub fn byte_position(&self) -> usize {
        ((self.bit_pos + 7) / 8) as usize
    }

    /// Check if at end of data.
    pub fn is_eof(&self) -> bool {
        self.bits_in_buffer == 0 && self.pos >= self.data.len()
    }

    /// Remaining bits available.
    pub fn remaining_bits(&self) -> u64 {
        u64::from(self.bits_in_buffer) + ((self.data.len() - self.pos) as u64 * 8)
    }
}

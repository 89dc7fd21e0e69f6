//! Bit writer for packed ISF streams.
//!
//! Appends MSB-first bit fields to a caller-owned byte vector. The last byte
//! of the vector is always complete: unused low bits are zero until the next
//! write fills them, so the sink can be handed back at any point.

/// Bit writer appending to a `Vec<u8>`.
pub struct BitWriter<'a> {
    sink: &'a mut Vec<u8>,
    /// Unused low bits in the last byte of `sink`
    free_bits: u32,
    bits_written: u64,
}

impl<'a> BitWriter<'a> {
    /// Start writing at the end of `sink`. Existing bytes are left untouched.
    pub fn new(sink: &'a mut Vec<u8>) -> Self {
        Self {
            sink,
            free_bits: 0,
            bits_written: 0,
        }
    }

    /// Write the low `count` bits (1-32) of `bits`, most significant first.
    pub fn write(&mut self, bits: u32, count: u32) {
        debug_assert!((1..=32).contains(&count));

        let mut left = count;
        while left > 0 {
            if self.free_bits == 0 {
                self.sink.push(0);
                self.free_bits = 8;
            }
            let take = left.min(self.free_bits);
            let chunk = ((u64::from(bits) >> (left - take)) & ((1 << take) - 1)) as u8;
            if let Some(last) = self.sink.last_mut() {
                *last |= chunk << (self.free_bits - take);
            }
            self.free_bits -= take;
            left -= take;
        }
        self.bits_written += u64::from(count);
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write(u32::from(bit), 1);
    }

    /// Write the low `count` bits (1-32) of `bits` a byte at a time, low byte
    /// first.
    ///
    /// This keeps multi-byte values in their in-memory (little-endian) order
    /// rather than bit-packed order. When `count` is not a multiple of 8 the
    /// last chunk is the remaining `count % 8` high bits, matching
    /// [`BitReader::read_u16_reverse`](super::BitReader::read_u16_reverse).
    pub fn write_reverse(&mut self, bits: u32, count: u32) {
        debug_assert!((1..=32).contains(&count));

        let mut left = count;
        let mut shift = 0;
        while left > 0 {
            let take = left.min(8);
            self.write((bits >> shift) & ((1 << take) - 1), take);
            shift += 8;
            left -= take;
        }
    }

    /// Bits written by this writer.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Finish writing, returning the number of bytes this writer appended.
    ///
    /// A trailing partial byte is already zero-padded in the sink.
    pub fn finish(self) -> usize {
        self.bits_written.div_ceil(8) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BitReader;

    #[test]
    fn test_write_bits() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write(0b1011, 4);
        writer.write(0b0100, 4);
        writer.write(0b11001010, 8);
        assert_eq!(writer.finish(), 2);
        assert_eq!(out, [0b10110100, 0b11001010]);
    }

    #[test]
    fn test_partial_byte_is_padded() {
        let mut out = vec![0xEE];
        let mut writer = BitWriter::new(&mut out);
        writer.write(0b101, 3);
        assert_eq!(writer.finish(), 1);
        assert_eq!(out, [0xEE, 0b1010_0000]);
    }

    #[test]
    fn test_write_32_bits_unaligned() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write_bit(true);
        writer.write(0xDEADBEEF, 32);
        assert_eq!(writer.bits_written(), 33);

        let mut reader = BitReader::new(&out);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_write_reverse() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write_reverse(0x1234, 16);
        writer.write_reverse(0x0A0B0C0D, 32);
        writer.write_reverse(0x1FF, 9);
        assert_eq!(out, [0x34, 0x12, 0x0D, 0x0C, 0x0B, 0x0A, 0xFF, 0x80]);
    }

    #[test]
    fn test_reverse_odd_widths_stay_aligned() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write_reverse(0x1FF, 9);
        writer.write(0b101, 3);
        writer.write_reverse(0x2_ABCD, 18);
        writer.write(0b01, 2);
        writer.write_reverse(0x7F, 7);
        writer.finish();

        let mut reader = BitReader::new(&out);
        assert_eq!(reader.read_u16_reverse(9).unwrap(), 0x1FF);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_u32_reverse(18).unwrap(), 0x2_ABCD);
        assert_eq!(reader.read_bits(2).unwrap(), 0b01);
        assert_eq!(reader.read_byte(7).unwrap(), 0x7F);
    }

    #[test]
    fn test_write_masks_high_bits() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write(0xFFFF_FFF3, 3);
        writer.write(0, 5);
        assert_eq!(out, [0b0110_0000]);
    }
}

//! Legacy LZ ring-buffer decoder.
//!
//! Old property blocks were compressed with a small LZSS variant. The format
//! is decode-only: nothing in this crate produces it.
//!
//! The token stream is grouped by a flag byte that precedes up to eight
//! tokens. Flag bits are consumed LSB first: a one marks a literal byte, a zero
//! marks a two-byte back-reference.
//!
//! ```text
//! back-reference: [pos low 8 bits] [pos high 4 bits | len - 2]
//! ```
//!
//! `pos` is an absolute position in the ring buffer, not a distance.

use tracing::debug;

use crate::config::EofPolicy;
use crate::error::{IsfError, Result};

/// Ring buffer size.
pub const RING_BUFFER_LEN: usize = 4069;

/// Bytes at the end of the ring reserved for the first match.
pub const MAX_MATCH_LEN: usize = 16;

/// Shortest back-reference.
pub const MIN_MATCH_LEN: usize = 2;

/// Set in the flag word after a refill; the word is exhausted once it shifts out.
const FLAGS_SENTINEL: u16 = 0xFF00;

/// Ring-buffer LZ decoder.
pub struct LzDecoder {
    ring: Box<[u8; RING_BUFFER_LEN]>,
    pos: usize,
    flags: u16,
    policy: EofPolicy,
}

impl LzDecoder {
    pub fn new(policy: EofPolicy) -> Self {
        let mut decoder = Self {
            ring: Box::new([0; RING_BUFFER_LEN]),
            pos: 0,
            flags: 0,
            policy,
        };
        decoder.reset();
        decoder
    }

    /// Zero the ring and rewind the cursor to the reserved tail.
    pub fn reset(&mut self) {
        self.ring.fill(0);
        self.pos = RING_BUFFER_LEN - MAX_MATCH_LEN;
        self.flags = 0;
    }

    #[inline]
    fn emit(&mut self, byte: u8, output: &mut Vec<u8>) {
        output.push(byte);
        self.ring[self.pos] = byte;
        self.pos = (self.pos + 1) % RING_BUFFER_LEN;
    }

    /// Fetch the next flag bit, refilling from `input` every eight tokens.
    /// Returns `None` at end of input.
    fn next_flag(&mut self, input: &[u8], cursor: &mut usize) -> Option<bool> {
        self.flags >>= 1;
        if self.flags & 0x100 == 0 {
            let byte = *input.get(*cursor)?;
            *cursor += 1;
            self.flags = u16::from(byte) | FLAGS_SENTINEL;
        }
        Some(self.flags & 1 != 0)
    }

    fn half_token(&self, cursor: usize, input: &[u8]) -> Result<()> {
        match self.policy {
            EofPolicy::LegacySentinel => Ok(()),
            EofPolicy::Strict => {
                debug!(cursor, len = input.len(), "LZ stream ends inside a token");
                Err(IsfError::TruncatedInput {
                    needed: cursor + 1,
                    have: input.len(),
                })
            }
        }
    }

    /// Decode `input` from its first byte. The ring is reset first.
    pub fn uncompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.reset();
        let mut output = Vec::with_capacity(input.len() * 2);
        let mut cursor = 0usize;

        while cursor < input.len() {
            let Some(literal) = self.next_flag(input, &mut cursor) else {
                break;
            };
            // A flag byte may be the last byte of the stream.
            if cursor >= input.len() {
                break;
            }

            if literal {
                let byte = input[cursor];
                cursor += 1;
                self.emit(byte, &mut output);
            } else {
                if cursor + 1 >= input.len() {
                    self.half_token(cursor + 1, input)?;
                    break;
                }
                let low = input[cursor];
                let high = input[cursor + 1];
                cursor += 2;

                let start = usize::from(low) | (usize::from(high & 0xF0) << 4);
                let len = usize::from(high & 0x0F) + MIN_MATCH_LEN;
                if start >= RING_BUFFER_LEN {
                    debug!(start, "LZ back-reference outside ring");
                    return Err(IsfError::MalformedStream("back-reference outside ring buffer"));
                }
                for i in 0..len {
                    let byte = self.ring[(start + i) % RING_BUFFER_LEN];
                    self.emit(byte, &mut output);
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<Vec<u8>> {
        LzDecoder::new(EofPolicy::Strict).uncompress(input)
    }

    #[test]
    fn test_single_literal() {
        assert_eq!(decode(&[0x01, 0x41]).unwrap(), b"A");
    }

    #[test]
    fn test_literals() {
        // Five literal flags, then "Hello"
        assert_eq!(decode(&[0x1F, b'H', b'e', b'l', b'l', b'o']).unwrap(), b"Hello");
    }

    #[test]
    fn test_back_reference() {
        // "abc" lands at the reserved tail; copy 6 bytes from there.
        let start = RING_BUFFER_LEN - MAX_MATCH_LEN;
        let low = (start & 0xFF) as u8;
        let high = (((start >> 8) as u8) << 4) | (6 - MIN_MATCH_LEN) as u8;
        let input = [0b0000_0111, b'a', b'b', b'c', low, high];
        assert_eq!(decode(&input).unwrap(), b"abcabcabc");
    }

    #[test]
    fn test_back_reference_into_zeroed_ring() {
        // Offset 0 reads the zero-filled part of the ring.
        let input = [0b0000_0000, 0x00, 0x01];
        assert_eq!(decode(&input).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_flag_refill_after_eight_tokens() {
        let mut input = vec![0xFF];
        input.extend_from_slice(b"01234567");
        input.push(0x01);
        input.push(b'8');
        assert_eq!(decode(&input).unwrap(), b"012345678");
    }

    #[test]
    fn test_trailing_flag_byte_ignored() {
        let mut input = vec![0xFF];
        input.extend_from_slice(b"ABCDEFGH");
        input.push(0x00);
        assert_eq!(decode(&input).unwrap(), b"ABCDEFGH");
    }

    #[test]
    fn test_half_token() {
        let input = [0x00, 0x10];
        assert!(matches!(decode(&input), Err(IsfError::TruncatedInput { .. })));

        let mut legacy = LzDecoder::new(EofPolicy::LegacySentinel);
        assert_eq!(legacy.uncompress(&input).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_back_reference_outside_ring() {
        // start = 0xFFF
        let input = [0x00, 0xFF, 0xF0];
        assert!(matches!(decode(&input), Err(IsfError::MalformedStream(_))));
    }

    #[test]
    fn test_reset_between_calls() {
        let mut decoder = LzDecoder::new(EofPolicy::Strict);
        decoder.uncompress(&[0x01, 0x41]).unwrap();
        let start = RING_BUFFER_LEN - MAX_MATCH_LEN;
        let input = [
            0x00,
            (start & 0xFF) as u8,
            (((start >> 8) as u8) << 4),
        ];
        // The 'A' from the previous call must be gone.
        assert_eq!(decoder.uncompress(&input).unwrap(), [0, 0]);
    }
}

//! Indexed prefix codecs for packet data.
//!
//! Despite the name these are not adaptive Huffman codes: each codec is a
//! fixed table of bucket widths. A value is written as a unary bucket prefix
//! (`k` one bits, then a zero) followed by its offset inside bucket `k` and a
//! sign bit, `bits[k]` bits in all.
//!
//! ```text
//! bucket 0        : "0"                       value 0
//! bucket k < size : 1..10 + (offset << 1 | sign)
//! bucket size     : 1..10 + code(extra) + code(low word)
//! ```
//!
//! The last form carries delta-delta values that need an extra word.

use super::bit_reader::BitReader;
use super::bit_writer::BitWriter;
use super::delta_delta::DataTransform;
use super::math::abs_no_throw;
use crate::config::EofPolicy;
use crate::error::{IsfError, Result};

/// Number of predefined codecs.
pub const DEFAULT_CODEC_COUNT: usize = 8;

/// Bucket widths of the predefined codecs.
pub const DEFAULT_BIT_TABLES: [&[u8]; DEFAULT_CODEC_COUNT] = [
    &[0, 1, 2, 4, 6, 8, 12, 16, 24, 32],
    &[0, 1, 1, 2, 4, 8, 12, 16, 24, 32],
    &[0, 1, 1, 1, 2, 4, 8, 14, 22, 32],
    &[0, 2, 2, 3, 5, 8, 12, 16, 24, 32],
    &[0, 3, 4, 5, 8, 12, 16, 24, 32],
    &[0, 4, 6, 8, 12, 16, 24, 32],
    &[0, 6, 8, 12, 16, 24, 32],
    &[0, 7, 8, 12, 16, 24, 32],
];

/// Mask selecting the codec index from a descriptor.
pub const CODEC_INDEX_MASK: u8 = 0x1F;

/// Largest table length any codec uses.
const MAX_TABLE_SIZE: usize = 10;

/// One fixed-table prefix codec.
#[derive(Debug, Clone)]
pub struct HuffCodec {
    index: u8,
    bits: &'static [u8],
    /// Smallest magnitude stored in each bucket
    mins: [u32; MAX_TABLE_SIZE],
}

impl HuffCodec {
    /// Build predefined codec `index` (0-7).
    pub fn new(index: u8) -> Result<Self> {
        let bits = *DEFAULT_BIT_TABLES
            .get(index as usize)
            .ok_or(IsfError::UnsupportedCodec(index))?;

        let mut mins = [0u32; MAX_TABLE_SIZE];
        let mut lower = 1u64;
        for n in 1..bits.len() {
            mins[n] = lower as u32;
            lower += 1u64 << (bits[n] - 1);
        }

        Ok(Self { index, bits, mins })
    }

    /// Codec index within the default table.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Number of buckets.
    #[inline]
    fn size(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Write one transformed value.
    pub fn encode(&self, data: i32, extra: i32, writer: &mut BitWriter<'_>) {
        if extra != 0 {
            let prefix_len = self.size() + 1;
            writer.write((1 << prefix_len) - 2, prefix_len);
            self.encode(extra, 0, writer);
            self.encode(data, 0, writer);
            return;
        }

        if data == 0 {
            writer.write(0, 1);
            return;
        }

        let magnitude = abs_no_throw(data);
        let mut prefix_len = 1u32;
        while prefix_len < self.size() && magnitude >= self.mins[prefix_len as usize] {
            prefix_len += 1;
        }
        let bucket = (prefix_len - 1) as usize;

        writer.write((1 << prefix_len) - 2, prefix_len);
        let offset = u64::from(magnitude - self.mins[bucket]) << 1;
        let coded = offset | u64::from(data < 0);
        writer.write(coded as u32, u32::from(self.bits[bucket]));
    }

    /// Count leading one bits up to the terminating zero.
    fn read_prefix(&self, reader: &mut BitReader<'_>) -> Result<u32> {
        let mut prefix = 0u32;
        while reader.read_bit()? {
            prefix += 1;
            if prefix > self.size() {
                return Err(IsfError::MalformedStream("prefix code longer than table"));
            }
        }
        Ok(prefix)
    }

    /// Read a value from bucket `prefix` (below the table size).
    fn read_bucket(&self, prefix: u32, reader: &mut BitReader<'_>) -> Result<i32> {
        if prefix == 0 {
            return Ok(0);
        }
        let width = u32::from(self.bits[prefix as usize]);
        let coded = reader.read_bits(width)?;
        let magnitude = (coded >> 1).wrapping_add(self.mins[prefix as usize]) as i32;
        Ok(if coded & 1 != 0 {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    /// Read one value without an extra word.
    fn decode_plain(&self, reader: &mut BitReader<'_>) -> Result<i32> {
        let prefix = self.read_prefix(reader)?;
        if prefix >= self.size() {
            return Err(IsfError::MalformedStream("nested extra-word prefix"));
        }
        self.read_bucket(prefix, reader)
    }

    /// Read one transformed value. Returns `(data, extra)`.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<(i32, i32)> {
        let prefix = self.read_prefix(reader)?;
        if prefix == self.size() {
            let extra = self.decode_plain(reader)?;
            let data = self.decode_plain(reader)?;
            return Ok((data, extra));
        }
        Ok((self.read_bucket(prefix, reader)?, 0))
    }

    /// Encode every sample, optionally through `transform` (reset first).
    pub fn compress(
        &self,
        transform: Option<&mut DataTransform>,
        samples: &[i32],
        out: &mut Vec<u8>,
    ) {
        let mut writer = BitWriter::new(out);
        match transform {
            Some(xf) => {
                xf.reset_state();
                for &sample in samples {
                    let t = xf.transform(sample);
                    self.encode(t.xf_data, t.extra, &mut writer);
                }
            }
            None => {
                for &sample in samples {
                    self.encode(sample, 0, &mut writer);
                }
            }
        }
        writer.finish();
    }

    /// Decode until `out` is full. Returns input bytes consumed.
    pub fn uncompress(
        &self,
        mut transform: Option<&mut DataTransform>,
        input: &[u8],
        out: &mut [i32],
        policy: EofPolicy,
    ) -> Result<usize> {
        let mut reader = BitReader::new(input);
        if let Some(xf) = transform.as_deref_mut() {
            xf.reset_state();
        }

        for slot in out.iter_mut() {
            if reader.is_eof() {
                match policy {
                    EofPolicy::LegacySentinel => break,
                    EofPolicy::Strict => {
                        return Err(IsfError::TruncatedInput {
                            needed: input.len() + 1,
                            have: input.len(),
                        })
                    }
                }
            }
            let (data, extra) = match self.decode(&mut reader) {
                Ok(decoded) => decoded,
                Err(IsfError::TruncatedInput { .. }) if policy == EofPolicy::LegacySentinel => {
                    break
                }
                Err(e) => return Err(e),
            };
            *slot = match transform.as_deref_mut() {
                Some(xf) => xf.inverse_transform(data, extra)?,
                None => data,
            };
        }
        Ok(reader.byte_position())
    }
}

/// The predefined codecs plus the delta-delta transform they share.
///
/// Codecs are built up front; the transform is reset at the start of every
/// compress and uncompress call.
#[derive(Debug, Clone)]
pub struct HuffModule {
    codecs: Vec<HuffCodec>,
    transform: DataTransform,
}

impl HuffModule {
    pub fn new() -> Self {
        let codecs = (0..DEFAULT_CODEC_COUNT as u8)
            .filter_map(|i| HuffCodec::new(i).ok())
            .collect();
        Self {
            codecs,
            transform: DataTransform::delta_delta(),
        }
    }

    /// Default codec `index` (0-7).
    pub fn default_codec(&self, index: u8) -> Result<&HuffCodec> {
        self.codecs
            .get(index as usize)
            .ok_or(IsfError::UnsupportedCodec(index))
    }

    /// Codec named by the low five bits of `descriptor`.
    ///
    /// Indices past the defaults would address registered custom codecs;
    /// none exist, so they are rejected.
    pub fn find_codec(&self, descriptor: u8) -> Result<&HuffCodec> {
        self.default_codec(descriptor & CODEC_INDEX_MASK)
    }

    /// Transform paired with the codec named by `descriptor`.
    pub fn find_transform(&mut self, descriptor: u8) -> Result<&mut DataTransform> {
        let index = descriptor & CODEC_INDEX_MASK;
        if index as usize >= self.codecs.len() {
            return Err(IsfError::UnsupportedCodec(index));
        }
        Ok(&mut self.transform)
    }

    /// Codec and transform for `descriptor`, borrowed together.
    pub fn codec_and_transform(
        &mut self,
        descriptor: u8,
    ) -> Result<(&HuffCodec, &mut DataTransform)> {
        let index = descriptor & CODEC_INDEX_MASK;
        let codec = self
            .codecs
            .get(index as usize)
            .ok_or(IsfError::UnsupportedCodec(index))?;
        Ok((codec, &mut self.transform))
    }
}

impl Default for HuffModule {
    fn default() -> Self {
        Self::new()
    }
}

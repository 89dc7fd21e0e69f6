//! Adaptive fixed-width bit packing.
//!
//! Every value of a block is written with the same bit count, chosen as the
//! smallest width that holds the block's largest magnitude. Packet data may be
//! run through [`DeltaDelta`](super::DeltaDelta) first when that shrinks the
//! width. Property data is packed as bytes, little-endian shorts or
//! little-endian ints, whichever interpretation packs smallest.
//!
//! ## Packet descriptor
//!
//! ```text
//!  7 6 5 4 3 2 1 0
//! +---+-+---------+
//! |0 0|D| width   |   D = delta-delta applied, width 0 means 32
//! +---+-+---------+
//! ```
//!
//! ## Property descriptor
//!
//! | Bits | Element | Index |
//! |------|---------|-------|
//! | `01xxxxxx` | int (signed) | low 6 bits |
//! | `001xxxxx` | short | low 5 bits |
//! | `000xxxxx` | byte | low 5 bits |
//!
//! Indices below 24 select a (bit count, pad count) pair from
//! [`PROPERTY_BIT_TABLE`]; larger indices are a literal bit count of
//! `index - 16`. The pad count is the number of whole units that fit in the
//! zero padding of the final byte, so a decoder can recover the unit count
//! from the payload length alone.

use tracing::debug;

use super::bit_reader::BitReader;
use super::bit_writer::BitWriter;
use super::delta_delta::{DataTransform, DeltaDelta};
use super::math::{abs_no_throw, bits_required, bits_required_unsigned};
use crate::config::EofPolicy;
use crate::error::{IsfError, Result};

/// Delta-delta flag in a packet descriptor.
pub const PACKET_DELTA_DELTA: u8 = 0x20;

/// Bit-count field of a packet descriptor.
pub const PACKET_BIT_COUNT_MASK: u8 = 0x1F;

/// Int element flag in a property descriptor.
pub const PROPERTY_INT: u8 = 0x40;

/// Short element flag in a property descriptor.
pub const PROPERTY_SHORT: u8 = 0x20;

/// (bit count, pad count) pairs addressed by property descriptor index.
pub const PROPERTY_BIT_TABLE: [(u8, u8); 24] = [
    (8, 0),
    (1, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (1, 6),
    (1, 7),
    (2, 0),
    (2, 1),
    (2, 2),
    (2, 3),
    (3, 0),
    (3, 1),
    (3, 2),
    (4, 0),
    (4, 1),
    (5, 0),
    (5, 1),
    (6, 0),
    (6, 1),
    (7, 0),
    (7, 1),
];

/// First table index for each bit count below 8.
const PROPERTY_TABLE_OFFSET: [u8; 8] = [0, 1, 9, 13, 16, 18, 20, 22];

/// Offset between a literal bit count and its descriptor index.
const LITERAL_INDEX_BIAS: u8 = 16;

/// How a property byte buffer is split into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GorillaEncodingType {
    /// One byte per unit.
    Byte,
    /// Two bytes per unit, little-endian, unsigned.
    Short,
    /// Four bytes per unit, little-endian, signed.
    Int,
}

impl GorillaEncodingType {
    /// Bytes per unit.
    pub fn unit_bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 4,
        }
    }

    /// Bits per unit.
    pub fn unit_bits(self) -> u32 {
        self.unit_bytes() as u32 * 8
    }
}

/// Decoded property descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyLayout {
    pub encoding: GorillaEncodingType,
    pub bit_count: u32,
    pub pad_count: u32,
}

/// Sign-extension mask for a field of `bit_count` bits.
#[inline]
fn sign_mask(bit_count: u32) -> u32 {
    u32::MAX << (bit_count - 1)
}

#[inline]
fn sign_extend(value: u32, bit_count: u32) -> i32 {
    let mask = sign_mask(bit_count);
    if value & mask != 0 {
        (value | mask) as i32
    } else {
        value as i32
    }
}

/// Track the running minimum and maximum.
#[inline]
fn update_min_max(value: i32, max: &mut i32, min: &mut i32) {
    if value > *max {
        *max = value;
    } else if value < *min {
        *min = value;
    }
}

/// Pick the packet descriptor for `samples`.
///
/// The delta-delta representation is considered only when asked for, when
/// there are at least three samples, and when none of the transformed values
/// needs an extra word. It wins only if its largest magnitude is under half
/// of the raw one. Returns 0 for an empty slice.
pub fn find_packet_algo_byte(samples: &[i32], try_delta_delta: bool) -> u8 {
    let Some(&first) = samples.first() else {
        return 0;
    };

    let mut use_delta_delta = try_delta_delta && samples.len() >= 3;
    let mut max_val = first;
    let mut min_val = first;
    let mut max_dd = 0;
    let mut min_dd = 0;
    let mut start = 1;
    let mut dd = DeltaDelta::new();

    if use_delta_delta {
        let lead = [
            dd.transform(samples[0]),
            dd.transform(samples[1]),
            dd.transform(samples[2]),
        ];
        if lead.iter().any(|t| t.extra != 0) {
            use_delta_delta = false;
        } else {
            max_dd = lead[2].xf_data;
            min_dd = lead[2].xf_data;
            update_min_max(samples[1], &mut max_val, &mut min_val);
            update_min_max(samples[2], &mut max_val, &mut min_val);
            start = 3;
        }
    }

    for &sample in &samples[start..] {
        update_min_max(sample, &mut max_val, &mut min_val);
        if use_delta_delta {
            let t = dd.transform(sample);
            if t.extra != 0 {
                use_delta_delta = false;
            } else {
                update_min_max(t.xf_data, &mut max_dd, &mut min_dd);
            }
        }
    }

    let mut abs_max = abs_no_throw(max_val).max(abs_no_throw(min_val));
    if use_delta_delta {
        let abs_max_dd = abs_no_throw(max_dd).max(abs_no_throw(min_dd));
        if abs_max_dd < (abs_max >> 1) {
            abs_max = abs_max_dd;
        } else {
            use_delta_delta = false;
        }
    }

    // One extra bit for the sign; 32 wraps to 0 in the 5-bit field.
    let bit_count = bits_required(abs_max) + 1;
    let flag = if use_delta_delta { PACKET_DELTA_DELTA } else { 0 };
    (bit_count as u8 & PACKET_BIT_COUNT_MASK) | flag
}

/// Pack `samples[start..]` at `bit_count` bits each (0 means 32).
///
/// A transform, when given, continues from its current state. Fails if the
/// transform needs an extra word, since the packed layout has no room for it.
pub fn compress(
    bit_count: u32,
    samples: &[i32],
    start: usize,
    mut transform: Option<&mut DataTransform>,
    out: &mut Vec<u8>,
) -> Result<()> {
    let bit_count = if bit_count == 0 { 32 } else { bit_count };
    if bit_count > 32 {
        return Err(IsfError::InvalidArgument("bit count exceeds 32"));
    }

    let mut writer = BitWriter::new(out);
    for &sample in samples.iter().skip(start) {
        let value = match transform.as_deref_mut() {
            Some(xf) => {
                let t = xf.transform(sample);
                if t.extra != 0 {
                    return Err(IsfError::MalformedStream(
                        "delta-delta overflow in fixed-width block",
                    ));
                }
                t.xf_data
            }
            None => sample,
        };
        writer.write(value as u32, bit_count);
    }
    writer.finish();
    Ok(())
}

/// Unpack values of `bit_count` bits (0 means 32) from `input` into `out`.
///
/// Stops when `out` is full. Under [`EofPolicy::Strict`] running out of input
/// first is an error; the legacy policy returns with `out` partly filled.
/// Returns the number of input bytes consumed.
pub fn uncompress(
    bit_count: u32,
    input: &[u8],
    mut transform: Option<&mut DataTransform>,
    out: &mut [i32],
    policy: EofPolicy,
) -> Result<usize> {
    let bit_count = if bit_count == 0 { 32 } else { bit_count };
    if bit_count > 32 {
        return Err(IsfError::MalformedStream("bit count exceeds 32"));
    }

    let mut reader = BitReader::new(input);
    for slot in out.iter_mut() {
        if policy == EofPolicy::LegacySentinel && reader.remaining_bits() < u64::from(bit_count) {
            break;
        }
        let value = sign_extend(reader.read_bits(bit_count)?, bit_count);
        *slot = match transform.as_deref_mut() {
            Some(xf) => xf.inverse_transform(value, 0)?,
            None => value,
        };
    }
    Ok(reader.byte_position())
}

/// Minimal width for the property units, never below 1.
fn unsigned_width(max: u32) -> u32 {
    bits_required_unsigned(max).max(1)
}

/// Descriptor index for a width and pad count.
fn property_index(bit_count: u32, pad_count: u32) -> u8 {
    if bit_count >= 8 {
        if bit_count == 8 {
            0
        } else {
            bit_count as u8 + LITERAL_INDEX_BIAS
        }
    } else {
        PROPERTY_TABLE_OFFSET[bit_count as usize] + pad_count as u8
    }
}

/// Units that fit in the zero padding after `units` fields of `bit_count` bits.
fn pad_count(units: usize, bit_count: u32) -> u32 {
    let used = (units as u64 * u64::from(bit_count)) % 8;
    let leftover = ((8 - used) % 8) as u32;
    leftover / bit_count
}

/// Pick the property descriptor for `bytes`. Returns 0 for an empty slice.
///
/// Ties go to the narrower element type.
pub fn find_prop_algo_byte(bytes: &[u8]) -> u8 {
    if bytes.is_empty() {
        return 0;
    }

    let max_byte = bytes.iter().copied().max().unwrap_or(0);
    let byte_bits = unsigned_width(u32::from(max_byte));
    let mut best = (GorillaEncodingType::Byte, byte_bits, bytes.len());
    let mut best_total = bytes.len() as u64 * u64::from(byte_bits);

    if bytes.len() % 2 == 0 {
        let max_short = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .max()
            .unwrap_or(0);
        let bits = unsigned_width(u32::from(max_short));
        let units = bytes.len() / 2;
        let total = units as u64 * u64::from(bits);
        if total < best_total {
            best = (GorillaEncodingType::Short, bits, units);
            best_total = total;
        }
    }

    if bytes.len() % 4 == 0 {
        let (mut max_int, mut min_int) = (0i32, 0i32);
        for c in bytes.chunks_exact(4) {
            update_min_max(
                i32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                &mut max_int,
                &mut min_int,
            );
        }
        let abs_max = abs_no_throw(max_int).max(abs_no_throw(min_int));
        let bits = bits_required(abs_max) + 1;
        let units = bytes.len() / 4;
        let total = units as u64 * u64::from(bits);
        if total < best_total {
            best = (GorillaEncodingType::Int, bits, units);
        }
    }

    let (encoding, bit_count, units) = best;
    property_descriptor(encoding, bit_count, units)
}

/// Build the property descriptor for `units` elements of `bit_count` bits.
pub fn property_descriptor(encoding: GorillaEncodingType, bit_count: u32, units: usize) -> u8 {
    let index = property_index(bit_count, pad_count(units, bit_count));
    match encoding {
        GorillaEncodingType::Byte => index,
        GorillaEncodingType::Short => PROPERTY_SHORT | index,
        GorillaEncodingType::Int => PROPERTY_INT | index,
    }
}

/// Decode a property descriptor into element type, bit count and pad count.
pub fn property_bit_count(descriptor: u8) -> PropertyLayout {
    let (encoding, index) = if descriptor & PROPERTY_INT != 0 {
        (GorillaEncodingType::Int, descriptor & 0x3F)
    } else if descriptor & PROPERTY_SHORT != 0 {
        (GorillaEncodingType::Short, descriptor & 0x1F)
    } else {
        (GorillaEncodingType::Byte, descriptor & 0x1F)
    };

    let (bit_count, pad_count) = match PROPERTY_BIT_TABLE.get(index as usize) {
        Some(&(bits, pad)) => (u32::from(bits), u32::from(pad)),
        None => (u32::from(index - LITERAL_INDEX_BIAS), 0),
    };

    PropertyLayout {
        encoding,
        bit_count,
        pad_count,
    }
}

/// Pack a property buffer as `encoding` units of `bit_count` bits.
pub fn compress_property(
    bit_count: u32,
    bytes: &[u8],
    encoding: GorillaEncodingType,
    out: &mut Vec<u8>,
) -> Result<()> {
    let bit_count = if bit_count == 0 {
        encoding.unit_bits()
    } else {
        bit_count
    };
    if bit_count > encoding.unit_bits() {
        return Err(IsfError::InvalidArgument(
            "property bit count wider than element",
        ));
    }
    if bytes.len() % encoding.unit_bytes() != 0 {
        return Err(IsfError::InvalidArgument(
            "property length is not a multiple of the element size",
        ));
    }

    let units = bytes.len() / encoding.unit_bytes();
    let mut reader = BitReader::new(bytes);
    let mut writer = BitWriter::new(out);
    for _ in 0..units {
        let value = match encoding {
            GorillaEncodingType::Int => reader.read_u32_reverse(32)?,
            GorillaEncodingType::Short => u32::from(reader.read_u16_reverse(16)?),
            GorillaEncodingType::Byte => u32::from(reader.read_byte(8)?),
        };
        if !fits(value, bit_count, encoding) {
            return Err(IsfError::InvalidArgument(
                "property value does not fit the bit count",
            ));
        }
        writer.write(value, bit_count);
    }
    writer.finish();
    Ok(())
}

/// Whether `value` survives a round trip through `bit_count` bits.
fn fits(value: u32, bit_count: u32, encoding: GorillaEncodingType) -> bool {
    if bit_count >= 32 {
        return true;
    }
    match encoding {
        GorillaEncodingType::Int => {
            sign_extend(value & ((1 << bit_count) - 1), bit_count) == value as i32
        }
        _ => value >> bit_count == 0,
    }
}

/// Unpack a property payload (descriptor already stripped) back to bytes.
pub fn uncompress_property(input: &[u8], layout: PropertyLayout) -> Result<Vec<u8>> {
    let PropertyLayout {
        encoding,
        bit_count,
        pad_count,
    } = layout;

    if bit_count == 0 || bit_count > encoding.unit_bits() {
        debug!(bit_count, ?encoding, "property bit count out of range");
        return Err(IsfError::MalformedStream(
            "property bit count wider than element",
        ));
    }

    let slots = (input.len() as u64 * 8) / u64::from(bit_count);
    let units = slots
        .checked_sub(u64::from(pad_count))
        .ok_or(IsfError::MalformedStream("property pad exceeds payload"))?
        as usize;

    let mut reader = BitReader::new(input);
    let mut output = Vec::with_capacity(units * encoding.unit_bytes());
    let mut writer = BitWriter::new(&mut output);
    for _ in 0..units {
        let mut value = reader.read_bits(bit_count)?;
        if encoding == GorillaEncodingType::Int && bit_count < 32 {
            value = sign_extend(value, bit_count) as u32;
        }
        writer.write_reverse(value, encoding.unit_bits());
    }
    writer.finish();
    Ok(output)
}

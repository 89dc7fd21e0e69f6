//! The algorithm descriptor byte.
//!
//! Every compressed packet or property block starts with one descriptor byte:
//!
//! ```text
//!  7 6 5 4 3 2 1 0
//! +---+-+---------+
//! |cls|D|  field  |
//! +---+-+---------+
//! ```
//!
//! | `cls` | Meaning | `field` |
//! |-------|---------|---------|
//! | `00` | Fixed-width packing, `D` = delta-delta | bit width, 0 means 32 |
//! | `10` | Indexed prefix codec (packets) / legacy LZ (properties, exact `0x80`) | codec index |
//! | `11` | Pick the best codec (request only, never written) | ignored |
//! | `01` | Reserved | - |

/// Fixed-width packing, no transform, width chosen by the encoder.
pub const NO_COMPRESSION: u8 = 0x00;

/// Request that the encoder pick the codec.
pub const DEFAULT_COMPRESSION: u8 = 0xC0;

/// Indexed prefix codec class.
pub const INDEXED_HUFFMAN: u8 = 0x80;

/// Legacy LZ class for property data. Shares its bit with [`INDEXED_HUFFMAN`].
pub const LEMPEL_ZIV: u8 = 0x80;

/// Class bits.
pub const CLASS_MASK: u8 = 0xC0;

/// Delta-delta flag for the fixed-width class.
pub const DELTA_DELTA_FLAG: u8 = 0x20;

/// Low five bits: bit width or codec index.
pub const FIELD_MASK: u8 = 0x1F;

/// Parsed packet descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// Fixed-width packing.
    Uncompressed {
        /// Raw 5-bit width field; 0 stands for 32.
        bit_count: u8,
        /// Values were delta-delta transformed.
        delta_delta: bool,
    },
    /// Indexed prefix codec.
    Indexed {
        /// Codec index, 0-31.
        index: u8,
    },
    /// Encoder picks the codec.
    Default,
    /// Class `01`.
    Reserved(u8),
}

impl Descriptor {
    /// Split a descriptor byte into its class and fields.
    pub fn parse(byte: u8) -> Self {
        match byte & CLASS_MASK {
            0x00 => Self::Uncompressed {
                bit_count: byte & FIELD_MASK,
                delta_delta: byte & DELTA_DELTA_FLAG != 0,
            },
            INDEXED_HUFFMAN => Self::Indexed {
                index: byte & FIELD_MASK,
            },
            DEFAULT_COMPRESSION => Self::Default,
            _ => Self::Reserved(byte),
        }
    }

    /// Pack back into a byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Uncompressed {
                bit_count,
                delta_delta,
            } => {
                let flag = if delta_delta { DELTA_DELTA_FLAG } else { 0 };
                (bit_count & FIELD_MASK) | flag
            }
            Self::Indexed { index } => INDEXED_HUFFMAN | (index & FIELD_MASK),
            Self::Default => DEFAULT_COMPRESSION,
            Self::Reserved(byte) => byte,
        }
    }

    /// Bits per value for the fixed-width class (1-32).
    pub fn bit_width(self) -> Option<u32> {
        match self {
            Self::Uncompressed { bit_count: 0, .. } => Some(32),
            Self::Uncompressed { bit_count, .. } => Some(u32::from(bit_count)),
            _ => None,
        }
    }

    /// Whether this descriptor may appear in an encoded stream.
    pub fn is_persistable(self) -> bool {
        matches!(self, Self::Uncompressed { .. } | Self::Indexed { .. })
    }
}

impl From<u8> for Descriptor {
    fn from(byte: u8) -> Self {
        Self::parse(byte)
    }
}

impl From<Descriptor> for u8 {
    fn from(d: Descriptor) -> Self {
        d.to_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classes() {
        assert_eq!(
            Descriptor::parse(0x2C),
            Descriptor::Uncompressed {
                bit_count: 12,
                delta_delta: true
            }
        );
        assert_eq!(Descriptor::parse(0x83), Descriptor::Indexed { index: 3 });
        assert_eq!(Descriptor::parse(0xC0), Descriptor::Default);
        assert_eq!(Descriptor::parse(0xE5), Descriptor::Default);
        assert_eq!(Descriptor::parse(0x41), Descriptor::Reserved(0x41));
    }

    #[test]
    fn test_round_trip_bytes() {
        for byte in (0x00..=0x3F).chain(0x80..=0x9F) {
            assert_eq!(Descriptor::parse(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(Descriptor::parse(0x00).bit_width(), Some(32));
        assert_eq!(Descriptor::parse(0x27).bit_width(), Some(7));
        assert_eq!(Descriptor::parse(0x82).bit_width(), None);
    }

    #[test]
    fn test_persistable() {
        assert!(Descriptor::parse(0x81).is_persistable());
        assert!(!Descriptor::parse(DEFAULT_COMPRESSION).is_persistable());
        assert!(!Descriptor::parse(0x7F).is_persistable());
    }
}

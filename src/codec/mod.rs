//! ISF packet and property compression.
//!
//! Stroke coordinates and extended properties are stored as compressed blocks,
//! each opening with a descriptor byte that names the codec used for the rest.
//!
//! ## Codecs
//!
//! | Codec | Data | Direction | Descriptor |
//! |-------|------|-----------|------------|
//! | Fixed-width packing | packets, properties | both | `00Dwwwww` |
//! | Indexed prefix codec | packets | both | `100iiiii` |
//! | Ring-buffer LZ | properties | decode only | exactly `0x80` |
//!
//! See [`Descriptor`] for the byte layout.
//!
//! ## Example
//!
//! ```rust
//! use isf_codec::codec::AlgoModule;
//! use isf_codec::DEFAULT_COMPRESSION;
//!
//! // Reusable for any number of strokes
//! let mut algo = AlgoModule::new();
//!
//! let packed = algo.compress_property_data(b"ink", DEFAULT_COMPRESSION).unwrap();
//! assert_eq!(algo.decompress_property_data(&packed).unwrap(), b"ink");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! i32 samples                      property bytes
//!       ↓                                ↓
//! ┌─────────────┐                 ┌─────────────┐
//! │ DeltaDelta  │ ← optional      │ unit split  │ ← byte / short / int
//! └─────────────┘                 └─────────────┘
//!       ↓                                ↓
//! ┌─────────────┐                 ┌─────────────┐
//! │ HuffCodec   │ or fixed width  │ fixed width │
//! └─────────────┘                 └─────────────┘
//!       ↓                                ↓
//! ┌─────────────┐
//! │ BitWriter   │ ← MSB first, zero-padded final byte
//! └─────────────┘
//!       ↓
//! descriptor byte + payload
//! ```
//!
//! ## Notes
//!
//! - Decoders never read past the slice they are given.
//! - End-of-input handling follows [`EofPolicy`](crate::EofPolicy).
//! - Delta-delta state is reset per call, never carried between blocks.

mod algo;
mod bit_reader;
mod bit_writer;
mod delta_delta;
mod descriptor;
pub mod gorilla;
mod huffman;
mod lz;
pub mod math;
pub mod varint;

#[cfg(test)]
mod proptests;

pub use algo::AlgoModule;
pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
pub use delta_delta::{DataTransform, DeltaDelta, Transformed};
pub use descriptor::{
    Descriptor, CLASS_MASK, DEFAULT_COMPRESSION, DELTA_DELTA_FLAG, FIELD_MASK, INDEXED_HUFFMAN,
    LEMPEL_ZIV, NO_COMPRESSION,
};
pub use gorilla::{GorillaEncodingType, PropertyLayout};
pub use huffman::{HuffCodec, HuffModule, DEFAULT_BIT_TABLES, DEFAULT_CODEC_COUNT};
pub use lz::LzDecoder;
pub use varint::VarIntReader;

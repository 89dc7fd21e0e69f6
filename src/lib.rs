//! Ink Serialized Format (ISF) compression codecs.
//!
//! Encodes and decodes the compressed packet and property blocks found in ISF
//! ink streams. Every block is a descriptor byte followed by a codec payload;
//! output is byte-compatible with the legacy ink serializer.
//!
//! ## Quick start
//!
//! ```rust
//! use isf_codec::{compress_packet, decompress_packet, DEFAULT_COMPRESSION};
//!
//! let ys = [10, 12, 15, 19, 24, 30, 37];
//! let packed = compress_packet(&ys, DEFAULT_COMPRESSION)?;
//!
//! let mut out = [0i32; 7];
//! decompress_packet(&packed, &mut out)?;
//! assert_eq!(out, ys);
//! # Ok::<(), isf_codec::IsfError>(())
//! ```
//!
//! For repeated calls, keep an [`AlgoModule`] around instead of using the free
//! functions; it owns the codec tables and the LZ ring buffer.
//!
//! ## Modules
//! - [`codec`] - the codecs and the dispatcher
//! - [`config`] - decoder options
//! - [`error`] - error type

pub mod codec;
pub mod config;
pub mod error;

pub use codec::{
    AlgoModule, Descriptor, DEFAULT_COMPRESSION, DELTA_DELTA_FLAG, INDEXED_HUFFMAN, LEMPEL_ZIV,
    NO_COMPRESSION,
};
pub use config::{CodecOptions, EofPolicy};
pub use error::{IsfError, Result};

/// Compress packet samples with a fresh [`AlgoModule`].
pub fn compress_packet(samples: &[i32], descriptor: u8) -> Result<Vec<u8>> {
    AlgoModule::new().compress_packet_data(samples, descriptor)
}

/// Decompress a packet block into `out`. Returns bytes consumed.
pub fn decompress_packet(input: &[u8], out: &mut [i32]) -> Result<usize> {
    AlgoModule::new().decompress_packet_data(input, out)
}

/// Compress a property value with a fresh [`AlgoModule`].
pub fn compress_property(bytes: &[u8], descriptor: u8) -> Result<Vec<u8>> {
    AlgoModule::new().compress_property_data(bytes, descriptor)
}

/// Decompress a property block.
pub fn decompress_property(input: &[u8]) -> Result<Vec<u8>> {
    AlgoModule::new().decompress_property_data(input)
}

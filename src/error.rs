//! Error types for ISF compression and decompression.
//!
//! This module provides the [`IsfError`] type which covers every failure a
//! codec call can surface. All of them are fatal for the current packet or
//! property block; none are retried internally.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Caller | [`InvalidArgument`], [`UnsupportedEncode`] | Bad request before any data is touched |
//! | Input | [`TruncatedInput`], [`MalformedStream`] | Compressed buffer is short or corrupt |
//! | Codec | [`UnsupportedCodec`] | Descriptor names a codec that does not exist |
//! | I/O | [`Io`] | Caller-supplied stream failed |
//!
//! ## Example
//!
//! ```rust
//! use isf_codec::{decompress_packet, IsfError};
//!
//! let mut out = [0i32; 4];
//! match decompress_packet(&[0x00], &mut out) {
//!     Err(IsfError::TruncatedInput { needed, have }) => {
//!         assert_eq!((needed, have), (2, 1));
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
//! [`InvalidArgument`]: IsfError::InvalidArgument
//! [`UnsupportedEncode`]: IsfError::UnsupportedEncode
//! [`TruncatedInput`]: IsfError::TruncatedInput
//! [`MalformedStream`]: IsfError::MalformedStream
//! [`UnsupportedCodec`]: IsfError::UnsupportedCodec
//! [`Io`]: IsfError::Io

use std::io;

/// Error type for ISF codec operations.
#[derive(Debug, thiserror::Error)]
pub enum IsfError {
    /// A required input was empty or inconsistent with the request.
    ///
    /// Checked eagerly, before any output is produced.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The input ended before a complete header, varint or bit field.
    #[error("truncated input: need {needed} bytes, have {have}")]
    TruncatedInput {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// The input decoded to something no encoder can produce.
    #[error("malformed stream: {0}")]
    MalformedStream(&'static str),

    /// The descriptor references a codec index with no implementation.
    ///
    /// Only indices 0-7 (the default codecs) are ever registered.
    #[error("unsupported codec index: {0}")]
    UnsupportedCodec(u8),

    /// The requested descriptor cannot be used for encoding.
    ///
    /// The legacy LZ class is decode-only, and class `01` is reserved.
    #[error("unsupported encode descriptor: 0x{0:02x}")]
    UnsupportedEncode(u8),

    /// A caller-supplied stream failed for a reason other than end of data.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for IsfError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::TruncatedInput { needed: 1, have: 0 }
        } else {
            Self::Io(e)
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IsfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_truncated() {
        let err: IsfError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, IsfError::TruncatedInput { .. }));
    }

    #[test]
    fn test_other_io_kept() {
        let err: IsfError = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(matches!(err, IsfError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            IsfError::UnsupportedEncode(0x80).to_string(),
            "unsupported encode descriptor: 0x80"
        );
        assert_eq!(
            IsfError::TruncatedInput { needed: 2, have: 1 }.to_string(),
            "truncated input: need 2 bytes, have 1"
        );
    }
}

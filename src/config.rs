//! Decoder configuration.

/// What a decoder does when it runs off the end of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Fail with [`IsfError::TruncatedInput`](crate::IsfError::TruncatedInput).
    #[default]
    Strict,
    /// Reproduce the legacy reader: a varint byte read past the end is `0xFF`,
    /// bit-packed loops stop at the end of input, and the LZ decoder drops a
    /// trailing half token.
    LegacySentinel,
}

/// Options shared by every codec owned by an [`AlgoModule`](crate::AlgoModule).
///
/// ```rust
/// use isf_codec::{CodecOptions, EofPolicy};
///
/// let opts = CodecOptions::default().with_eof_policy(EofPolicy::LegacySentinel);
/// assert!(opts.is_legacy_eof());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    /// End-of-input behavior for all decode paths.
    pub eof_policy: EofPolicy,
}

impl CodecOptions {
    /// Set the end-of-input policy.
    pub fn with_eof_policy(mut self, policy: EofPolicy) -> Self {
        self.eof_policy = policy;
        self
    }

    /// Whether the legacy sentinel behavior is enabled.
    pub fn is_legacy_eof(&self) -> bool {
        self.eof_policy == EofPolicy::LegacySentinel
    }
}

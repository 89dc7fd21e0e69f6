//! Second-order differencing ("delta-delta") transform.
//!
//! For a smooth pen trace the difference of differences of consecutive
//! coordinates stays close to zero, which the bit-packing codecs exploit.
//!
//! A delta-delta of two `i32` inputs can need 34 bits. When the magnitude does
//! not fit in 31 bits the value is split: `xf_data` keeps the low 31 bits of
//! the magnitude and `extra` keeps the remaining high bits shifted left by one
//! with the sign in bit 0. A non-zero `extra` therefore always marks a split
//! value.

use super::math::abs_no_throw_wide;
use crate::error::{IsfError, Result};

/// Low-word mask for a split delta-delta.
const LOW_WORD_MASK: u64 = 0x7FFF_FFFF;

/// Output of a forward transform step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transformed {
    /// The transformed value, or the low word of a split value.
    pub xf_data: i32,
    /// High word and sign of a split value, zero otherwise.
    pub extra: i32,
}

/// Stateful delta-delta transform.
///
/// State must be reset with [`reset_state`](Self::reset_state) between
/// independent sequences (one stroke, one packet channel).
#[derive(Debug, Clone, Default)]
pub struct DeltaDelta {
    prev1: i64,
    prev2: i64,
}

impl DeltaDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous two values.
    #[inline]
    pub fn reset_state(&mut self) {
        self.prev1 = 0;
        self.prev2 = 0;
    }

    /// Transform the next value of the sequence.
    #[inline]
    pub fn transform(&mut self, value: i32) -> Transformed {
        let raw = i64::from(value) + self.prev2 - (self.prev1 << 1);
        self.prev2 = self.prev1;
        self.prev1 = i64::from(value);

        let magnitude = abs_no_throw_wide(raw);
        if magnitude > i32::MAX as u64 {
            let sign = u64::from(raw < 0);
            Transformed {
                xf_data: (magnitude & LOW_WORD_MASK) as i32,
                extra: (((magnitude >> 31) << 1) | sign) as i32,
            }
        } else {
            Transformed {
                xf_data: raw as i32,
                extra: 0,
            }
        }
    }

    /// Undo [`transform`](Self::transform) for the next value of the sequence.
    ///
    /// Fails with [`IsfError::MalformedStream`] when the reconstructed value
    /// does not fit in an `i32`; state is left untouched in that case.
    #[inline]
    pub fn inverse_transform(&mut self, xf_data: i32, extra: i32) -> Result<i32> {
        let raw = if extra != 0 {
            let magnitude =
                ((u64::from(extra as u32) >> 1) << 31) | (u64::from(xf_data as u32) & LOW_WORD_MASK);
            if extra & 1 != 0 {
                (magnitude as i64).wrapping_neg()
            } else {
                magnitude as i64
            }
        } else {
            i64::from(xf_data)
        };

        // |raw| < 2^63 - 2^34 and both accumulators hold i32 values.
        let original = i32::try_from(raw - self.prev2 + (self.prev1 << 1))
            .map_err(|_| IsfError::MalformedStream("delta-delta reconstruction out of range"))?;
        self.prev2 = self.prev1;
        self.prev1 = i64::from(original);
        Ok(original)
    }
}

/// Data transform applied ahead of a bit-packing codec.
///
/// Delta-delta is the only transform the format defines.
#[derive(Debug, Clone)]
pub enum DataTransform {
    /// Second-order differencing.
    DeltaDelta(DeltaDelta),
}

impl DataTransform {
    /// A fresh delta-delta transform.
    pub fn delta_delta() -> Self {
        Self::DeltaDelta(DeltaDelta::new())
    }

    #[inline]
    pub fn reset_state(&mut self) {
        match self {
            Self::DeltaDelta(dd) => dd.reset_state(),
        }
    }

    #[inline]
    pub fn transform(&mut self, value: i32) -> Transformed {
        match self {
            Self::DeltaDelta(dd) => dd.transform(value),
        }
    }

    #[inline]
    pub fn inverse_transform(&mut self, xf_data: i32, extra: i32) -> Result<i32> {
        match self {
            Self::DeltaDelta(dd) => dd.inverse_transform(xf_data, extra),
        }
    }
}

//! Small integer helpers shared by the codecs.

/// Magnitude of `value` as an unsigned integer.
///
/// `i32::MIN` maps to `2^31` instead of overflowing.
#[inline]
pub fn abs_no_throw(value: i32) -> u32 {
    value.unsigned_abs()
}

/// Wide variant of [`abs_no_throw`].
#[inline]
pub fn abs_no_throw_wide(value: i64) -> u64 {
    value.unsigned_abs()
}

/// Number of significant bits in `magnitude`, capped at 31.
///
/// Callers add one for the sign bit when the packed value is signed, so the
/// result plus sign never exceeds 32.
#[inline]
pub fn bits_required(magnitude: u32) -> u32 {
    (u32::BITS - magnitude.leading_zeros()).min(31)
}

/// Number of significant bits in an unsigned value, no cap.
#[inline]
pub fn bits_required_unsigned(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}

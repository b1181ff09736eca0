//! Numeric limits of the value layout.

/// Largest owned buffer a value can track (`capacity_in_bytes` is 31 bits).
pub const MAX_CAPACITY_IN_BYTES: usize = (1 << 31) - 1;

/// Largest array length representable with the `length + 1` encoding.
pub const MAX_ARRAY_LENGTH: u32 = u32::MAX - 1;

/// Default number of fraction digits rendered in plain decimal notation.
///
/// Exponents below `-DEFAULT_MAX_PLAIN_SCALE` are written as `<mantissa>e<exponent>`.
pub const DEFAULT_MAX_PLAIN_SCALE: u16 = 20;

//! Flat accessor functions over [`RawValueStorage`].
//!
//! These functions read and write one field of a value through the raw
//! container only, so they can be used (and exported, see [`ffi`](crate::ffi))
//! without depending on [`ValueStorage`](crate::ValueStorage). Each function
//! touches exactly the bits of its field.
//!
//! The caller picks the interpretation. Using the integer accessors on a
//! value last written as a decimal is a deterministic reinterpretation of the
//! same bits, never a fault.

use crate::layout;
use crate::raw::RawValueStorage;

// =============================================================================
// INTEGER INTERPRETATION
// =============================================================================

/// Sets the defined bit of an integer value.
#[inline]
pub fn set_uint64_defined_bit(storage: &mut RawValueStorage, defined: bool) {
    layout::set_defined(storage, defined);
}

/// Returns the defined bit of an integer value.
#[inline]
pub fn get_uint64_defined_bit(storage: &RawValueStorage) -> bool {
    layout::defined(storage)
}

/// Sets the presence word of an integer value.
#[inline]
pub fn set_uint64_present(storage: &mut RawValueStorage, present: bool) {
    layout::set_head(storage, present as u32);
}

/// Returns whether an integer value is present.
#[inline]
pub fn get_uint64_present(storage: &RawValueStorage) -> bool {
    layout::head(storage) != 0
}

/// Sets the integer content word.
///
/// Signed callers pass the two's complement bits (`v as u64`).
#[inline]
pub fn set_uint64_value(storage: &mut RawValueStorage, value: u64) {
    layout::set_content(storage, value);
}

/// Returns the integer content word.
#[inline]
pub fn get_uint64_value(storage: &RawValueStorage) -> u64 {
    layout::content(storage)
}

// =============================================================================
// DECIMAL INTERPRETATION
// =============================================================================

/// Sets the defined bit of a decimal value.
#[inline]
pub fn set_decimal_defined_bit(storage: &mut RawValueStorage, defined: bool) {
    layout::set_defined(storage, defined);
}

/// Returns the defined bit of a decimal value.
#[inline]
pub fn get_decimal_defined_bit(storage: &RawValueStorage) -> bool {
    layout::defined(storage)
}

/// Sets the presence word of a decimal value.
#[inline]
pub fn set_decimal_present(storage: &mut RawValueStorage, present: bool) {
    layout::set_head(storage, present as u32);
}

/// Returns whether a decimal value is present.
#[inline]
pub fn get_decimal_present(storage: &RawValueStorage) -> bool {
    layout::head(storage) != 0
}

/// Sets mantissa and exponent together.
#[inline]
pub fn set_decimal_mantissa_and_exponent(
    storage: &mut RawValueStorage,
    mantissa: i64,
    exponent: i16,
) {
    set_decimal_mantissa(storage, mantissa);
    set_decimal_exponent(storage, exponent);
}

/// Sets the decimal mantissa.
#[inline]
pub fn set_decimal_mantissa(storage: &mut RawValueStorage, mantissa: i64) {
    layout::set_content(storage, mantissa as u64);
}

/// Sets the decimal exponent.
#[inline]
pub fn set_decimal_exponent(storage: &mut RawValueStorage, exponent: i16) {
    layout::set_exponent(storage, exponent);
}

/// Returns the decimal mantissa.
#[inline]
pub fn get_decimal_mantissa(storage: &RawValueStorage) -> i64 {
    layout::content(storage) as i64
}

/// Returns the decimal exponent.
#[inline]
pub fn get_decimal_exponent(storage: &RawValueStorage) -> i16 {
    layout::exponent(storage)
}

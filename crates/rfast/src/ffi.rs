//! C ABI exports of the flat accessors.
//!
//! Setter names and signatures follow the C header of the value storage, so
//! a binding layer that only knows the 16-byte blob can link against this
//! crate. Every flat getter is exported under its own name as well. Null
//! pointers are ignored by setters and read as zero or false by getters.

use crate::flat;
use crate::raw::RawValueStorage;

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_uint64_defined_bit(storage: *mut RawValueStorage, defined: bool) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_uint64_defined_bit(storage, defined);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_uint64_present(storage: *mut RawValueStorage, present: bool) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_uint64_present(storage, present);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_uint64_set_value(storage: *mut RawValueStorage, value: u64) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_uint64_value(storage, value);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_decimal_defined_bit(storage: *mut RawValueStorage, defined: bool) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_decimal_defined_bit(storage, defined);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_decimal_present(storage: *mut RawValueStorage, present: bool) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_decimal_present(storage, present);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_decimal_mantissa_and_exponent(
    storage: *mut RawValueStorage,
    mantissa: i64,
    exponent: i16,
) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_decimal_mantissa_and_exponent(storage, mantissa, exponent);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_decimal_mantissa(storage: *mut RawValueStorage, mantissa: i64) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_decimal_mantissa(storage, mantissa);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid, writable `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_decimal_exponent(storage: *mut RawValueStorage, exponent: i16) {
    if let Some(storage) = unsafe { storage.as_mut() } {
        flat::set_decimal_exponent(storage, exponent);
    }
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_uint64_defined_bit(storage: *const RawValueStorage) -> bool {
    unsafe { storage.as_ref() }.is_some_and(flat::get_uint64_defined_bit)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_uint64_present(storage: *const RawValueStorage) -> bool {
    unsafe { storage.as_ref() }.is_some_and(flat::get_uint64_present)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_uint64_value(storage: *const RawValueStorage) -> u64 {
    unsafe { storage.as_ref() }.map_or(0, flat::get_uint64_value)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_decimal_defined_bit(storage: *const RawValueStorage) -> bool {
    unsafe { storage.as_ref() }.is_some_and(flat::get_decimal_defined_bit)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_decimal_present(storage: *const RawValueStorage) -> bool {
    unsafe { storage.as_ref() }.is_some_and(flat::get_decimal_present)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_decimal_mantissa(storage: *const RawValueStorage) -> i64 {
    unsafe { storage.as_ref() }.map_or(0, flat::get_decimal_mantissa)
}

/// # Safety
///
/// `storage` must be null or point to a valid `RawValueStorage`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_decimal_exponent(storage: *const RawValueStorage) -> i16 {
    unsafe { storage.as_ref() }.map_or(0, flat::get_decimal_exponent)
}

//! Typed constructors over the raw storage.
//!
//! Each wrapper is a [`ValueStorage`] whose field combination is valid for
//! one protocol kind. Conversion from a foreign [`ValueStorage`] is a bit
//! copy without validation; for the borrowing wrappers it is `unsafe` because
//! the content lifetime is asserted by the caller.

use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::decimal::{format_decimal, parse_decimal};
use crate::error::{DecimalParseError, ValueError};
use crate::flat;
use crate::limits::MAX_ARRAY_LENGTH;
use crate::raw::RawValueStorage;
use crate::storage::{StorageInt, ValueStorage};

// =============================================================================
// INTEGER
// =============================================================================

/// An integer value of type `I`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntValueStorage<I> {
    raw: RawValueStorage,
    _int: PhantomData<I>,
}

impl<I: StorageInt> IntValueStorage<I> {
    /// Absent, defined integer.
    pub fn absent() -> Self {
        let mut raw = RawValueStorage::new();
        flat::set_uint64_defined_bit(&mut raw, true);
        Self::wrap(raw)
    }

    /// Present, defined integer holding `value`.
    pub fn new(value: I) -> Self {
        let mut raw = RawValueStorage::new();
        flat::set_uint64_defined_bit(&mut raw, true);
        flat::set_uint64_present(&mut raw, true);
        flat::set_uint64_value(&mut raw, value.to_word());
        Self::wrap(raw)
    }

    /// Reinterprets a foreign value as an integer.
    pub fn from_storage(storage: ValueStorage) -> Self {
        Self::wrap(storage.into_raw())
    }

    fn wrap(raw: RawValueStorage) -> Self {
        Self {
            raw,
            _int: PhantomData,
        }
    }

    /// The integer content, whether or not the value is present.
    pub fn value(&self) -> I {
        I::from_word(flat::get_uint64_value(&self.raw))
    }

    /// Stores `value` and marks the value present.
    pub fn set_value(&mut self, value: I) {
        flat::set_uint64_present(&mut self.raw, true);
        flat::set_uint64_value(&mut self.raw, value.to_word());
    }

    /// Returns true if the value is present.
    pub fn is_present(&self) -> bool {
        flat::get_uint64_present(&self.raw)
    }

    /// Sets the presence word.
    pub fn set_present(&mut self, present: bool) {
        flat::set_uint64_present(&mut self.raw, present);
    }

    /// Returns the defined bit.
    pub fn is_defined(&self) -> bool {
        flat::get_uint64_defined_bit(&self.raw)
    }

    /// The underlying storage.
    pub fn storage(&self) -> ValueStorage {
        ValueStorage::from_raw(self.raw)
    }

    /// The underlying raw container.
    pub fn raw(&self) -> &RawValueStorage {
        &self.raw
    }
}

impl<I: StorageInt> Default for IntValueStorage<I> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<I: StorageInt> From<I> for IntValueStorage<I> {
    fn from(value: I) -> Self {
        Self::new(value)
    }
}

impl<I: StorageInt + fmt::Debug> fmt::Debug for IntValueStorage<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntValueStorage")
            .field("present", &self.is_present())
            .field("defined", &self.is_defined())
            .field("value", &self.value())
            .finish()
    }
}

// =============================================================================
// DECIMAL
// =============================================================================

/// A decimal value `mantissa * 10^exponent`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalValueStorage {
    raw: RawValueStorage,
}

impl DecimalValueStorage {
    /// Absent, defined decimal.
    pub fn absent() -> Self {
        let mut raw = RawValueStorage::new();
        flat::set_decimal_defined_bit(&mut raw, true);
        Self { raw }
    }

    /// Present, defined decimal.
    pub fn new(mantissa: i64, exponent: i16) -> Self {
        let mut raw = RawValueStorage::new();
        flat::set_decimal_defined_bit(&mut raw, true);
        flat::set_decimal_present(&mut raw, true);
        flat::set_decimal_mantissa_and_exponent(&mut raw, mantissa, exponent);
        Self { raw }
    }

    /// Reinterprets a foreign value as a decimal.
    pub fn from_storage(storage: ValueStorage) -> Self {
        Self {
            raw: storage.into_raw(),
        }
    }

    /// The mantissa, whether or not the value is present.
    pub fn mantissa(&self) -> i64 {
        flat::get_decimal_mantissa(&self.raw)
    }

    /// The exponent, whether or not the value is present.
    pub fn exponent(&self) -> i16 {
        flat::get_decimal_exponent(&self.raw)
    }

    /// Sets the mantissa without touching presence.
    pub fn set_mantissa(&mut self, mantissa: i64) {
        flat::set_decimal_mantissa(&mut self.raw, mantissa);
    }

    /// Sets the exponent without touching presence.
    pub fn set_exponent(&mut self, exponent: i16) {
        flat::set_decimal_exponent(&mut self.raw, exponent);
    }

    /// Returns true if the value is present.
    pub fn is_present(&self) -> bool {
        flat::get_decimal_present(&self.raw)
    }

    /// Sets the presence word.
    pub fn set_present(&mut self, present: bool) {
        flat::set_decimal_present(&mut self.raw, present);
    }

    /// Returns the defined bit.
    pub fn is_defined(&self) -> bool {
        flat::get_decimal_defined_bit(&self.raw)
    }

    /// The underlying storage.
    pub fn storage(&self) -> ValueStorage {
        ValueStorage::from_raw(self.raw)
    }

    /// The underlying raw container.
    pub fn raw(&self) -> &RawValueStorage {
        &self.raw
    }
}

impl Default for DecimalValueStorage {
    fn default() -> Self {
        Self::absent()
    }
}

impl fmt::Display for DecimalValueStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(self.mantissa(), self.exponent()))
    }
}

impl fmt::Debug for DecimalValueStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecimalValueStorage")
            .field("present", &self.is_present())
            .field("defined", &self.is_defined())
            .field("mantissa", &self.mantissa())
            .field("exponent", &self.exponent())
            .finish()
    }
}

impl FromStr for DecimalValueStorage {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mantissa, exponent) = parse_decimal(s.trim())?;
        Ok(Self::new(mantissa, exponent))
    }
}

// =============================================================================
// STRING AND BYTE VECTOR
// =============================================================================

/// A string value borrowing its characters for `'a`.
///
/// Never owns its content: `capacity_in_bytes` is always 0.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringValueStorage<'a> {
    storage: ValueStorage,
    _content: PhantomData<&'a [u8]>,
}

impl<'a> StringValueStorage<'a> {
    /// Absent, defined string.
    pub fn absent() -> Self {
        Self::wrap(ValueStorage::absent())
    }

    /// Present string borrowing `value`.
    ///
    /// # Panics
    ///
    /// Panics if `value` is longer than [`MAX_ARRAY_LENGTH`] bytes.
    pub fn new(value: &'a str) -> Self {
        Self::from_bytes(value.as_bytes())
    }

    /// Present string borrowing the bytes of a NUL-terminated C string,
    /// without the terminator.
    pub fn from_c_str(value: &'a CStr) -> Self {
        Self::from_bytes(value.to_bytes())
    }

    /// Present string borrowing `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is longer than [`MAX_ARRAY_LENGTH`].
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|len| *len <= MAX_ARRAY_LENGTH);
        let Some(len) = len else {
            panic!("string length {} exceeds maximum {}", bytes.len(), MAX_ARRAY_LENGTH);
        };

        let mut storage = ValueStorage::absent();
        storage.set(bytes.as_ptr());
        storage.set_array_length(len);
        Self::wrap(storage)
    }

    /// Reinterprets a foreign value as a borrowed string.
    ///
    /// # Safety
    ///
    /// If present, the value's content pointer must be valid for
    /// `array_length()` bytes for `'a`.
    pub unsafe fn from_storage(storage: ValueStorage) -> Self {
        Self::wrap(storage)
    }

    fn wrap(storage: ValueStorage) -> Self {
        Self {
            storage,
            _content: PhantomData,
        }
    }

    /// The content bytes, or `None` if absent.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        if self.storage.is_empty() {
            return None;
        }
        let len = self.storage.array_length() as usize;
        let content: *const u8 = self.storage.get();
        if len == 0 || content.is_null() {
            return Some(&[]);
        }
        // Construction guarantees `content` is valid for `len` bytes for 'a.
        Some(unsafe { std::slice::from_raw_parts(content, len) })
    }

    /// The content as UTF-8, or `None` if absent.
    pub fn as_str(&self) -> Result<Option<&'a str>, ValueError> {
        self.as_bytes()
            .map(|bytes| std::str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8))
            .transpose()
    }

    /// Length in bytes; 0 when absent.
    pub fn array_length(&self) -> u32 {
        self.storage.array_length()
    }

    /// True iff absent.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns the defined bit.
    pub fn is_defined(&self) -> bool {
        self.storage.is_defined()
    }

    /// Generic presence write; `set_present(true)` resets the length to 0.
    pub fn set_present(&mut self, present: bool) {
        self.storage.set_present(present);
    }

    /// The underlying storage.
    pub fn storage(&self) -> ValueStorage {
        self.storage
    }
}

impl Default for StringValueStorage<'_> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<'a> From<&'a str> for StringValueStorage<'a> {
    fn from(value: &'a str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for StringValueStorage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringValueStorage")
            .field("defined", &self.is_defined())
            .field("content", &self.as_bytes().map(String::from_utf8_lossy))
            .finish()
    }
}

/// A byte-vector value borrowing its bytes for `'a`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteVectorValueStorage<'a>(StringValueStorage<'a>);

impl<'a> ByteVectorValueStorage<'a> {
    /// Absent, defined byte vector.
    pub fn absent() -> Self {
        Self(StringValueStorage::absent())
    }

    /// Present byte vector borrowing `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is longer than [`MAX_ARRAY_LENGTH`].
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(StringValueStorage::from_bytes(bytes))
    }

    /// Reinterprets a foreign value as a borrowed byte vector.
    ///
    /// # Safety
    ///
    /// Same contract as [`StringValueStorage::from_storage`].
    pub unsafe fn from_storage(storage: ValueStorage) -> Self {
        Self(unsafe { StringValueStorage::from_storage(storage) })
    }

    /// The content bytes, or `None` if absent.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        self.0.as_bytes()
    }

    /// Length in bytes; 0 when absent.
    pub fn array_length(&self) -> u32 {
        self.0.array_length()
    }

    /// True iff absent.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the defined bit.
    pub fn is_defined(&self) -> bool {
        self.0.is_defined()
    }

    /// Generic presence write; `set_present(true)` resets the length to 0.
    pub fn set_present(&mut self, present: bool) {
        self.0.set_present(present);
    }

    /// The underlying storage.
    pub fn storage(&self) -> ValueStorage {
        self.0.storage()
    }
}

impl<'a> From<&'a [u8]> for ByteVectorValueStorage<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for ByteVectorValueStorage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteVectorValueStorage")
            .field("defined", &self.is_defined())
            .field("content", &self.as_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_int_absent_defined() {
        let v = IntValueStorage::<i64>::default();
        assert!(v.is_defined());
        assert!(!v.is_present());
        assert!(v.storage().is_empty());
    }

    #[test]
    fn test_int_42() {
        let v = IntValueStorage::<i64>::new(42);
        assert!(v.is_present());
        assert!(v.is_defined());
        assert_eq!(v.value(), 42);
        assert_eq!(v.storage().get::<i64>(), 42);
    }

    #[test]
    fn test_int_set_and_clear() {
        let mut v = IntValueStorage::<u32>::absent();
        v.set_value(u32::MAX);
        assert!(v.is_present());
        assert_eq!(v.value(), u32::MAX);
        v.set_present(false);
        assert!(!v.is_present());
        assert!(v.is_defined());
    }

    #[test]
    fn test_int_negative_narrow() {
        let v = IntValueStorage::<i32>::from(-3);
        assert_eq!(v.value(), -3);
        assert_eq!(v.storage().get::<i64>(), -3);
    }

    #[test]
    fn test_int_from_storage_is_bit_copy() {
        let v = IntValueStorage::<u64>::new(9);
        let copy = IntValueStorage::<u64>::from_storage(v.storage());
        assert_eq!(copy, v);
        assert_eq!(copy.raw(), v.raw());
    }

    #[test]
    fn test_decimal_absent_defined() {
        let d = DecimalValueStorage::default();
        assert!(d.is_defined());
        assert!(!d.is_present());
    }

    #[test]
    fn test_decimal_text() {
        let d = DecimalValueStorage::new(-12345, -3);
        assert!(d.is_present());
        assert!(d.is_defined());
        assert_eq!(d.to_string(), "-12.345");

        let parsed: DecimalValueStorage = "-12.345".parse().unwrap();
        assert_eq!(parsed, d);
        assert!(" 7e3 ".parse::<DecimalValueStorage>().is_ok());
        assert!("abc".parse::<DecimalValueStorage>().is_err());
    }

    #[test]
    fn test_decimal_setters() {
        let mut d = DecimalValueStorage::new(1, 0);
        d.set_mantissa(250);
        d.set_exponent(-2);
        assert_eq!(d.to_string(), "2.50");
        assert!(d.is_defined());
        d.set_present(false);
        assert_eq!(d.mantissa(), 250);
    }

    #[test]
    fn test_decimal_reads_flat_layout() {
        let d = DecimalValueStorage::new(-1, i16::MIN);
        let raw = *d.raw();
        assert_eq!(flat::get_decimal_mantissa(&raw), -1);
        assert_eq!(flat::get_decimal_exponent(&raw), i16::MIN);
        assert!(flat::get_decimal_defined_bit(&raw));
        assert_eq!(DecimalValueStorage::from_storage(d.storage()), d);
    }

    #[test]
    fn test_string_abc() {
        let s = StringValueStorage::new("abc");
        assert_eq!(s.array_length(), 3);
        assert!(!s.is_empty());
        assert!(s.is_defined());
        assert_eq!(s.as_bytes(), Some(&b"abc"[..]));
        assert_eq!(s.as_str(), Ok(Some("abc")));
        assert_eq!(s.storage().capacity_in_bytes(), 0);
    }

    #[test]
    fn test_string_present_false() {
        let mut s = StringValueStorage::new("abc");
        s.set_present(false);
        assert_eq!(s.array_length(), 0);
        assert!(s.is_empty());
        assert_eq!(s.as_bytes(), None);

        s.set_present(true);
        assert_eq!(s.as_bytes(), Some(&b""[..]));
    }

    #[test]
    fn test_string_default_and_empty() {
        let s = StringValueStorage::default();
        assert!(s.is_defined());
        assert!(s.is_empty());
        assert_eq!(s.as_str(), Ok(None));

        let e = StringValueStorage::new("");
        assert!(!e.is_empty());
        assert_eq!(e.array_length(), 0);
        assert_eq!(e.as_str(), Ok(Some("")));
    }

    #[test]
    fn test_string_from_c_str() {
        let c = c"XNAS";
        let s = StringValueStorage::from_c_str(c);
        assert_eq!(s.array_length(), 4);
        assert_eq!(s.as_str(), Ok(Some("XNAS")));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let bytes = [0xffu8, 0xfe];
        let s = StringValueStorage::from_bytes(&bytes);
        assert_eq!(s.as_str(), Err(ValueError::InvalidUtf8));
    }

    #[test]
    fn test_byte_vector() {
        let data = [0u8, 1, 2, 0, 4];
        let b = ByteVectorValueStorage::new(&data);
        assert_eq!(b.array_length(), 5);
        assert_eq!(b.as_bytes(), Some(&data[..]));
        assert_eq!(b.storage().capacity_in_bytes(), 0);

        let copy = unsafe { ByteVectorValueStorage::from_storage(b.storage()) };
        assert_eq!(copy.as_bytes(), Some(&data[..]));
        assert!(ByteVectorValueStorage::absent().is_empty());
    }

    proptest! {
        #[test]
        fn prop_int_roundtrip(v in any::<i64>()) {
            prop_assert_eq!(IntValueStorage::new(v).value(), v);
        }

        #[test]
        fn prop_uint32_roundtrip(v in any::<u32>()) {
            let s = IntValueStorage::new(v).storage();
            prop_assert_eq!(IntValueStorage::<u32>::from_storage(s).value(), v);
        }

        #[test]
        fn prop_decimal_display_roundtrip(m in any::<i64>(), e in any::<i16>()) {
            let d = DecimalValueStorage::new(m, e);
            let parsed: DecimalValueStorage = d.to_string().parse().unwrap();
            prop_assert_eq!(parsed.mantissa(), m);
            prop_assert_eq!(parsed.exponent(), e);
        }

        #[test]
        fn prop_bytes_length(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let b = ByteVectorValueStorage::new(&data);
            prop_assert_eq!(b.array_length() as usize, data.len());
            prop_assert_eq!(b.as_bytes(), Some(&data[..]));
        }
    }
}

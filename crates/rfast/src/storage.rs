//! The 16-byte field value.
//!
//! [`ValueStorage`] holds one field of a message. Which variant is active
//! (integer, decimal, group, array or template reference) is known from the
//! schema and is not stored. The generic accessors here work on the shared
//! regions described in [`layout`](crate::layout); kind-specific reads are
//! in [`typed`](crate::typed) and kind-checked writes in [`owned`](crate::owned).
//!
//! A `ValueStorage` is plain bits: it never copies content deeply and never
//! releases anything.

use std::fmt;
use std::mem::size_of;
use std::ptr;

use crate::kind::Template;
use crate::layout;
use crate::limits::MAX_ARRAY_LENGTH;
use crate::raw::RawValueStorage;

const _: () = assert!(size_of::<ValueStorage>() == 16);
const _: () = assert!(size_of::<RawValueStorage>() == size_of::<ValueStorage>());

static EMPTY_CONTENT: [u8; 1] = [0];

mod sealed {
    pub trait Sealed {}
}

/// Types that can be stored in, and read back from, the content word.
///
/// Integers use `as`-cast semantics against the 64-bit word (sign-extending
/// on write, truncating on read). Raw pointers store their address.
pub trait StorageWord: sealed::Sealed + Copy {
    /// Converts to the 64-bit content word.
    fn to_word(self) -> u64;
    /// Converts back from the 64-bit content word.
    fn from_word(word: u64) -> Self;
}

/// Integer types accepted by the integer wrappers and kind-checked setters.
pub trait StorageInt: StorageWord {}

macro_rules! impl_storage_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl StorageWord for $t {
                #[inline]
                fn to_word(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_word(word: u64) -> Self {
                    word as $t
                }
            }

            impl StorageInt for $t {}
        )*
    };
}

impl_storage_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl sealed::Sealed for bool {}

impl StorageWord for bool {
    #[inline]
    fn to_word(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        word != 0
    }
}

impl<T> sealed::Sealed for *const T {}

impl<T> StorageWord for *const T {
    #[inline]
    fn to_word(self) -> u64 {
        self as usize as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        word as usize as *const T
    }
}

impl<T> sealed::Sealed for *mut T {}

impl<T> StorageWord for *mut T {
    #[inline]
    fn to_word(self) -> u64 {
        self as usize as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        word as usize as *mut T
    }
}

/// One field value, bit-for-bit interchangeable with [`RawValueStorage`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueStorage {
    raw: RawValueStorage,
}

impl ValueStorage {
    /// All-zero value: absent and not defined.
    pub const fn undefined() -> Self {
        Self {
            raw: RawValueStorage::new(),
        }
    }

    /// Absent, defined value, ready to accept a write.
    pub fn absent() -> Self {
        let mut v = Self::undefined();
        v.set_defined(true);
        v
    }

    /// Present, defined numeric default with content 0.
    pub fn numeric_default() -> Self {
        let mut v = Self::absent();
        v.set_present(true);
        v
    }

    /// Present, defined, zero-length string default with borrowed content.
    pub fn empty_string_default() -> Self {
        let mut v = Self::absent();
        v.set_array_length(0);
        v.set(EMPTY_CONTENT.as_ptr());
        v
    }

    /// Reinterprets a raw container as a value.
    pub const fn from_raw(raw: RawValueStorage) -> Self {
        Self { raw }
    }

    /// Returns the raw container.
    pub const fn into_raw(self) -> RawValueStorage {
        self.raw
    }

    /// Borrows the raw container.
    pub fn as_raw(&self) -> &RawValueStorage {
        &self.raw
    }

    /// Mutably borrows the raw container.
    pub fn as_raw_mut(&mut self) -> &mut RawValueStorage {
        &mut self.raw
    }

    // =========================================================================
    // GENERIC FLAGS
    // =========================================================================

    /// Returns the defined bit.
    #[inline]
    pub fn is_defined(&self) -> bool {
        layout::defined(&self.raw)
    }

    /// Sets the defined bit.
    #[inline]
    pub fn set_defined(&mut self, defined: bool) {
        layout::set_defined(&mut self.raw, defined);
    }

    /// Returns true if the presence/length word is zero.
    ///
    /// For arrays this means absent, not "present with length 0"; use
    /// [`is_zero_length`](Self::is_zero_length) for that.
    #[inline]
    pub fn is_empty(&self) -> bool {
        layout::head(&self.raw) == 0
    }

    /// Returns true if the presence/length word is non-zero.
    #[inline]
    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Returns true for an array that is present with length 0.
    #[inline]
    pub fn is_zero_length(&self) -> bool {
        layout::head(&self.raw) == 1
    }

    /// Writes `present as u32` into the presence/length word.
    ///
    /// On an array value this discards the stored length: `set_present(true)`
    /// leaves it present with length 0. Capacity and content are untouched.
    #[inline]
    pub fn set_present(&mut self, present: bool) {
        layout::set_head(&mut self.raw, present as u32);
    }

    /// Returns the array length; absent arrays read as 0.
    #[inline]
    pub fn array_length(&self) -> u32 {
        layout::head(&self.raw).saturating_sub(1)
    }

    /// Sets the array length and marks the array present.
    #[inline]
    pub fn set_array_length(&mut self, len: u32) {
        debug_assert!(len <= MAX_ARRAY_LENGTH, "array length {} exceeds maximum", len);
        layout::set_head(&mut self.raw, len.wrapping_add(1));
    }

    // =========================================================================
    // CONTENT WORD
    // =========================================================================

    /// Reads the content word as `T`.
    ///
    /// No kind check is made: the caller knows the value holds a `T`.
    #[inline]
    pub fn get<T: StorageWord>(&self) -> T {
        T::from_word(layout::content(&self.raw))
    }

    /// Writes the content word from `T`.
    #[inline]
    pub fn set<T: StorageWord>(&mut self, value: T) {
        layout::set_content(&mut self.raw, value.to_word());
    }

    // =========================================================================
    // GROUP, ARRAY AND TEMPLATE-REFERENCE FIELDS
    // =========================================================================

    /// Group: whether the subfield array is released by this value.
    #[inline]
    pub fn owns_content(&self) -> bool {
        layout::flag(&self.raw, layout::OWNS_CONTENT_BIT)
    }

    /// Group: whether the subfield array aliases another value's.
    #[inline]
    pub fn is_link(&self) -> bool {
        layout::flag(&self.raw, layout::IS_LINK_BIT)
    }

    pub(crate) fn set_group_flags(&mut self, owns_content: bool, is_link: bool) {
        layout::set_flag(&mut self.raw, layout::OWNS_CONTENT_BIT, owns_content);
        layout::set_flag(&mut self.raw, layout::IS_LINK_BIT, is_link);
    }

    /// Array: bytes reserved for content; 0 means the content is borrowed.
    #[inline]
    pub fn capacity_in_bytes(&self) -> u32 {
        layout::capacity(&self.raw)
    }

    pub(crate) fn set_capacity_in_bytes(&mut self, capacity: u32) {
        layout::set_capacity(&mut self.raw, capacity);
    }

    /// Template reference: the selected template descriptor, or null.
    #[inline]
    pub fn template_ptr(&self) -> *const Template {
        layout::template_word(&self.raw) as usize as *const Template
    }

    pub(crate) fn set_template_ptr(&mut self, template: *const Template) {
        layout::set_template_word(&mut self.raw, template as usize as u64);
    }

    /// Template reference: the nested value array, or null.
    #[inline]
    pub fn template_content(&self) -> *mut ValueStorage {
        self.get()
    }

    /// Views array content as bytes.
    ///
    /// Absent and zero-length arrays yield an empty slice.
    ///
    /// # Safety
    ///
    /// The value must be an array whose content pointer is valid for
    /// `array_length()` bytes for as long as the returned slice lives.
    pub unsafe fn array_bytes(&self) -> &[u8] {
        let len = self.array_length() as usize;
        let content: *const u8 = self.get();
        if len == 0 || content.is_null() {
            return &[];
        }
        unsafe { &*ptr::slice_from_raw_parts(content, len) }
    }
}

impl Default for ValueStorage {
    fn default() -> Self {
        Self::absent()
    }
}

impl From<RawValueStorage> for ValueStorage {
    fn from(raw: RawValueStorage) -> Self {
        Self::from_raw(raw)
    }
}

impl From<ValueStorage> for RawValueStorage {
    fn from(storage: ValueStorage) -> Self {
        storage.raw
    }
}

impl fmt::Debug for ValueStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStorage")
            .field("head", &layout::head(&self.raw))
            .field("flags", &format_args!("{:#010x}", layout::flags(&self.raw)))
            .field("content", &format_args!("{:#018x}", layout::content(&self.raw)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_undefined_is_all_zero() {
        let v = ValueStorage::undefined();
        assert_eq!(v.into_raw().to_bytes(), [0u8; 16]);
        assert!(!v.is_defined());
        assert!(v.is_empty());
    }

    #[test]
    fn test_default_is_absent_defined() {
        let v = ValueStorage::default();
        assert!(v.is_defined());
        assert!(!v.is_present());
        assert!(v.is_empty());
        assert_eq!(v.array_length(), 0);
    }

    #[test]
    fn test_numeric_default() {
        let v = ValueStorage::numeric_default();
        assert!(v.is_defined());
        assert!(v.is_present());
        assert_eq!(v.get::<u64>(), 0);
    }

    #[test]
    fn test_empty_string_default() {
        let v = ValueStorage::empty_string_default();
        assert!(v.is_defined());
        assert!(v.is_present());
        assert!(v.is_zero_length());
        assert!(!v.is_empty());
        assert_eq!(v.array_length(), 0);
        assert_eq!(v.capacity_in_bytes(), 0);
        assert!(!v.get::<*const u8>().is_null());
        assert_eq!(unsafe { v.array_bytes() }, b"");
    }

    #[test]
    fn test_array_length_encoding() {
        let mut v = ValueStorage::absent();
        v.set_array_length(3);
        assert_eq!(v.array_length(), 3);
        assert!(!v.is_empty());
        assert!(!v.is_zero_length());
        assert_eq!(layout::head(v.as_raw()), 4);

        v.set_array_length(MAX_ARRAY_LENGTH);
        assert_eq!(v.array_length(), MAX_ARRAY_LENGTH);
    }

    #[test]
    fn test_set_present_resets_array_length() {
        let bytes = b"abc";
        let mut v = ValueStorage::absent();
        v.set(bytes.as_ptr());
        v.set_array_length(3);

        v.set_present(true);
        assert!(v.is_zero_length());
        assert_eq!(v.array_length(), 0);

        v.set_present(false);
        assert!(v.is_empty());
        assert_eq!(v.array_length(), 0);
        assert_eq!(v.get::<*const u8>(), bytes.as_ptr());
        assert!(v.is_defined());
    }

    #[test]
    fn test_defined_independent_of_presence() {
        let mut v = ValueStorage::undefined();
        v.set_present(true);
        assert!(!v.is_defined());
        v.set_defined(true);
        assert!(v.is_present());
        v.set_present(false);
        assert!(v.is_defined());
    }

    #[test]
    fn test_pointer_word() {
        let data = [1u8, 2, 3];
        let mut v = ValueStorage::absent();
        v.set(data.as_ptr());
        v.set_array_length(data.len() as u32);
        assert_eq!(v.get::<*const u8>(), data.as_ptr());
        assert_eq!(unsafe { v.array_bytes() }, &data);
        assert!(v.is_defined());
    }

    #[test]
    fn test_bool_word() {
        let mut v = ValueStorage::absent();
        v.set(true);
        assert!(v.get::<bool>());
        assert_eq!(v.get::<u64>(), 1);
    }

    #[test]
    fn test_content_write_keeps_flags() {
        let mut v = ValueStorage::absent();
        v.set_present(true);
        v.set(u64::MAX);
        assert!(v.is_defined());
        assert!(v.is_present());
    }

    #[test]
    fn test_raw_conversion_is_bitwise() {
        let mut v = ValueStorage::absent();
        v.set(-7i64);
        v.set_present(true);
        let raw = RawValueStorage::from(v);
        assert_eq!(ValueStorage::from(raw), v);
        assert_eq!(raw.to_bytes()[7], 0x80);
        assert_eq!(raw.to_bytes()[0], 1);
    }

    #[test]
    fn test_null_template_by_default() {
        assert!(ValueStorage::undefined().template_ptr().is_null());
        assert!(ValueStorage::undefined().template_content().is_null());
    }

    macro_rules! word_roundtrip {
        ($name:ident, $t:ty) => {
            proptest! {
                #[test]
                fn $name(v in any::<$t>()) {
                    let mut s = ValueStorage::absent();
                    s.set::<$t>(v);
                    prop_assert_eq!(s.get::<$t>(), v);
                    prop_assert!(s.is_defined());
                }
            }
        };
    }

    word_roundtrip!(prop_u8_roundtrip, u8);
    word_roundtrip!(prop_u16_roundtrip, u16);
    word_roundtrip!(prop_u32_roundtrip, u32);
    word_roundtrip!(prop_u64_roundtrip, u64);
    word_roundtrip!(prop_i8_roundtrip, i8);
    word_roundtrip!(prop_i16_roundtrip, i16);
    word_roundtrip!(prop_i32_roundtrip, i32);
    word_roundtrip!(prop_i64_roundtrip, i64);
    word_roundtrip!(prop_usize_roundtrip, usize);
    word_roundtrip!(prop_isize_roundtrip, isize);

    proptest! {
        #[test]
        fn prop_array_length_roundtrip(n in 0u32..=MAX_ARRAY_LENGTH) {
            let mut s = ValueStorage::absent();
            s.set_array_length(n);
            prop_assert_eq!(s.array_length(), n);
            prop_assert!(s.is_present());
            s.set_present(false);
            prop_assert!(s.is_empty());
        }
    }
}

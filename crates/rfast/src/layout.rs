//! Bit layout of a 16-byte value.
//!
//! This is the only module that reinterprets the raw bytes. Every variant
//! shares the same three regions:
//!
//! ```text
//! bytes 0..4    head      presence (integer, decimal, group) or length + 1 (array)
//! bytes 4..8    flags     bit 31: defined (all variants)
//!                         bits 0..31: capacity in bytes (array)
//!                         bit 0: owns content, bit 1: is link (group)
//!                         bytes 4..6: exponent as i16 (decimal)
//! bytes 8..16   content   integer, mantissa or content pointer
//! ```
//!
//! A template reference instead uses bytes 0..8 for the template descriptor
//! pointer and bytes 8..16 for its nested value array.
//!
//! All multi-byte fields are little-endian. Pointers are stored zero-extended
//! in a full 64-bit word on every target.

use crate::raw::RawValueStorage;

/// Offset of the presence / length word.
pub const HEAD_OFFSET: usize = 0;
/// Offset of the flags word.
pub const FLAGS_OFFSET: usize = 4;
/// Offset of the decimal exponent (overlaps the low half of the flags word).
pub const EXPONENT_OFFSET: usize = 4;
/// Offset of the content word.
pub const CONTENT_OFFSET: usize = 8;
/// Offset of the template descriptor pointer in a template reference.
pub const TEMPLATE_OFFSET: usize = 0;

/// Defined bit, top bit of the flags word in every variant.
pub const DEFINED_BIT: u32 = 1 << 31;
/// Group: the subfield array must be released by this value.
pub const OWNS_CONTENT_BIT: u32 = 1 << 0;
/// Group: the subfield array aliases another value's.
pub const IS_LINK_BIT: u32 = 1 << 1;
/// Array: bits holding `capacity_in_bytes`.
pub const CAPACITY_MASK: u32 = !DEFINED_BIT;

#[inline]
fn read_u32(raw: &RawValueStorage, offset: usize) -> u32 {
    let b = &raw.bytes;
    u32::from_le_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
}

#[inline]
fn write_u32(raw: &mut RawValueStorage, offset: usize, value: u32) {
    raw.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn read_u64(raw: &RawValueStorage, offset: usize) -> u64 {
    let b = &raw.bytes;
    u64::from_le_bytes([
        b[offset],
        b[offset + 1],
        b[offset + 2],
        b[offset + 3],
        b[offset + 4],
        b[offset + 5],
        b[offset + 6],
        b[offset + 7],
    ])
}

#[inline]
fn write_u64(raw: &mut RawValueStorage, offset: usize, value: u64) {
    raw.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn head(raw: &RawValueStorage) -> u32 {
    read_u32(raw, HEAD_OFFSET)
}

#[inline]
pub(crate) fn set_head(raw: &mut RawValueStorage, value: u32) {
    write_u32(raw, HEAD_OFFSET, value);
}

#[inline]
pub(crate) fn flags(raw: &RawValueStorage) -> u32 {
    read_u32(raw, FLAGS_OFFSET)
}

#[inline]
pub(crate) fn set_flags(raw: &mut RawValueStorage, value: u32) {
    write_u32(raw, FLAGS_OFFSET, value);
}

#[inline]
pub(crate) fn flag(raw: &RawValueStorage, mask: u32) -> bool {
    flags(raw) & mask != 0
}

#[inline]
pub(crate) fn set_flag(raw: &mut RawValueStorage, mask: u32, on: bool) {
    let current = flags(raw);
    set_flags(raw, if on { current | mask } else { current & !mask });
}

#[inline]
pub(crate) fn defined(raw: &RawValueStorage) -> bool {
    flag(raw, DEFINED_BIT)
}

#[inline]
pub(crate) fn set_defined(raw: &mut RawValueStorage, on: bool) {
    set_flag(raw, DEFINED_BIT, on);
}

#[inline]
pub(crate) fn capacity(raw: &RawValueStorage) -> u32 {
    flags(raw) & CAPACITY_MASK
}

#[inline]
pub(crate) fn set_capacity(raw: &mut RawValueStorage, capacity: u32) {
    debug_assert!(capacity & DEFINED_BIT == 0, "capacity exceeds 31 bits");
    let keep = flags(raw) & DEFINED_BIT;
    set_flags(raw, keep | (capacity & CAPACITY_MASK));
}

#[inline]
pub(crate) fn exponent(raw: &RawValueStorage) -> i16 {
    let b = &raw.bytes;
    i16::from_le_bytes([b[EXPONENT_OFFSET], b[EXPONENT_OFFSET + 1]])
}

#[inline]
pub(crate) fn set_exponent(raw: &mut RawValueStorage, exponent: i16) {
    raw.bytes[EXPONENT_OFFSET..EXPONENT_OFFSET + 2].copy_from_slice(&exponent.to_le_bytes());
}

#[inline]
pub(crate) fn content(raw: &RawValueStorage) -> u64 {
    read_u64(raw, CONTENT_OFFSET)
}

#[inline]
pub(crate) fn set_content(raw: &mut RawValueStorage, value: u64) {
    write_u64(raw, CONTENT_OFFSET, value);
}

#[inline]
pub(crate) fn template_word(raw: &RawValueStorage) -> u64 {
    read_u64(raw, TEMPLATE_OFFSET)
}

#[inline]
pub(crate) fn set_template_word(raw: &mut RawValueStorage, value: u64) {
    write_u64(raw, TEMPLATE_OFFSET, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_bit_is_top_bit_of_byte_7() {
        let mut raw = RawValueStorage::new();
        set_defined(&mut raw, true);
        assert_eq!(raw.to_bytes()[7], 0x80);
        assert_eq!(raw.to_bytes().iter().filter(|b| **b != 0).count(), 1);
        assert!(defined(&raw));
        set_defined(&mut raw, false);
        assert_eq!(raw.to_bytes(), [0u8; 16]);
    }

    #[test]
    fn test_exponent_does_not_touch_defined_bit() {
        let mut raw = RawValueStorage::new();
        set_defined(&mut raw, true);
        set_exponent(&mut raw, -1);
        assert!(defined(&raw));
        assert_eq!(exponent(&raw), -1);

        set_exponent(&mut raw, i16::MIN);
        assert!(defined(&raw));
        assert_eq!(exponent(&raw), i16::MIN);

        set_defined(&mut raw, false);
        assert_eq!(exponent(&raw), i16::MIN);
    }

    #[test]
    fn test_capacity_preserves_defined_bit() {
        let mut raw = RawValueStorage::new();
        set_defined(&mut raw, true);
        set_capacity(&mut raw, CAPACITY_MASK);
        assert!(defined(&raw));
        assert_eq!(capacity(&raw), CAPACITY_MASK);

        set_capacity(&mut raw, 0);
        assert!(defined(&raw));
        assert_eq!(capacity(&raw), 0);
    }

    #[test]
    fn test_group_flags_share_word_with_defined() {
        let mut raw = RawValueStorage::new();
        set_flag(&mut raw, OWNS_CONTENT_BIT, true);
        set_flag(&mut raw, IS_LINK_BIT, true);
        set_defined(&mut raw, true);
        assert_eq!(flags(&raw), DEFINED_BIT | OWNS_CONTENT_BIT | IS_LINK_BIT);

        set_flag(&mut raw, OWNS_CONTENT_BIT, false);
        assert!(flag(&raw, IS_LINK_BIT));
        assert!(defined(&raw));
    }

    #[test]
    fn test_regions_are_disjoint() {
        let mut raw = RawValueStorage::new();
        set_head(&mut raw, u32::MAX);
        assert_eq!(flags(&raw), 0);
        assert_eq!(content(&raw), 0);

        set_content(&mut raw, u64::MAX);
        assert_eq!(head(&raw), u32::MAX);
        assert_eq!(flags(&raw), 0);

        set_head(&mut raw, 0);
        set_content(&mut raw, 0);
        set_flags(&mut raw, u32::MAX);
        assert_eq!(head(&raw), 0);
        assert_eq!(content(&raw), 0);
    }

    #[test]
    fn test_little_endian_field_order() {
        let mut raw = RawValueStorage::new();
        set_head(&mut raw, 0x0403_0201);
        set_content(&mut raw, 0x0807_0605_0403_0201);
        assert_eq!(&raw.to_bytes()[0..4], &[1, 2, 3, 4]);
        assert_eq!(&raw.to_bytes()[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_template_word_overlaps_head_and_flags() {
        let mut raw = RawValueStorage::new();
        set_template_word(&mut raw, 0x8000_0000_0000_0001);
        assert_eq!(head(&raw), 1);
        assert!(defined(&raw));
        assert_eq!(content(&raw), 0);
    }
}

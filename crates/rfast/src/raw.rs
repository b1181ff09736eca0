//! Raw 16-byte value container.
//!
//! [`RawValueStorage`] carries no type information and has no accessor
//! semantics of its own. It is the layout-stable boundary used by the
//! [`flat`](crate::flat) accessors and by foreign bindings through
//! [`ffi`](crate::ffi): code that only knows this type can still read and
//! write a value's fields without depending on [`ValueStorage`](crate::ValueStorage).

use std::fmt;

/// A fixed, trivially copyable 16-byte blob.
///
/// Field offsets inside the blob are described in [`layout`](crate::layout).
#[repr(C, align(8))]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawValueStorage {
    pub(crate) bytes: [u8; 16],
}

impl RawValueStorage {
    /// Size of the container in bytes.
    pub const SIZE: usize = 16;

    /// Creates an all-zero container.
    pub const fn new() -> Self {
        Self { bytes: [0u8; 16] }
    }

    /// Creates a container from its 16 bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns a copy of the 16 bytes.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.bytes
    }

    /// Returns the bytes by reference.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Returns the bytes for in-place manipulation.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; 16] {
        &mut self.bytes
    }
}

impl From<[u8; 16]> for RawValueStorage {
    fn from(bytes: [u8; 16]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<RawValueStorage> for [u8; 16] {
    fn from(raw: RawValueStorage) -> Self {
        raw.bytes
    }
}

impl fmt::Debug for RawValueStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawValueStorage(")?;
        for (i, byte) in self.bytes.iter().enumerate() {
            if i == 8 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_alignment() {
        assert_eq!(std::mem::size_of::<RawValueStorage>(), 16);
        assert_eq!(std::mem::align_of::<RawValueStorage>(), 8);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let raw = RawValueStorage::from(bytes);
        assert_eq!(raw.to_bytes(), bytes);
        assert_eq!(<[u8; 16]>::from(raw), bytes);
    }

    #[test]
    fn test_debug_splits_words() {
        let mut raw = RawValueStorage::new();
        raw.as_bytes_mut()[0] = 0xab;
        raw.as_bytes_mut()[15] = 0x01;
        assert_eq!(
            format!("{:?}", raw),
            "RawValueStorage(ab00000000000000 0000000000000001)"
        );
    }
}

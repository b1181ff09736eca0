//! Subfield storage for groups, sequences and template references.
//!
//! [`ValueStorageArray`] is the fixed-size form used when the arity is known
//! at compile time. [`ValueBlock`] is a heap block whose length is chosen at
//! allocation time and always travels with it, and [`Trailing`] pairs a header
//! with such a block.

use std::ops::{Deref, DerefMut};
use std::ptr;

use crate::alloc;
use crate::storage::ValueStorage;

/// A fixed number of values stored inline.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueStorageArray<const N: usize>([ValueStorage; N]);

impl<const N: usize> ValueStorageArray<N> {
    /// Number of values.
    pub const LEN: usize = N;

    /// Wraps an array of values.
    pub const fn new(values: [ValueStorage; N]) -> Self {
        Self(values)
    }

    /// Returns the inner array.
    pub fn into_inner(self) -> [ValueStorage; N] {
        self.0
    }
}

impl<const N: usize> Default for ValueStorageArray<N> {
    fn default() -> Self {
        Self([ValueStorage::default(); N])
    }
}

impl<const N: usize> Deref for ValueStorageArray<N> {
    type Target = [ValueStorage];

    fn deref(&self) -> &[ValueStorage] {
        &self.0
    }
}

impl<const N: usize> DerefMut for ValueStorageArray<N> {
    fn deref_mut(&mut self) -> &mut [ValueStorage] {
        &mut self.0
    }
}

/// A heap block of values sized at allocation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueBlock {
    values: Box<[ValueStorage]>,
}

impl ValueBlock {
    /// Allocates `len` absent, defined values.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![ValueStorage::default(); len].into_boxed_slice(),
        }
    }

    /// Allocates a block holding a copy of `values`.
    pub fn from_values(values: &[ValueStorage]) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the block holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values, bound to the allocated length.
    pub fn as_slice(&self) -> &[ValueStorage] {
        &self.values
    }

    /// The values, bound to the allocated length.
    pub fn as_mut_slice(&mut self) -> &mut [ValueStorage] {
        &mut self.values
    }

    /// Gives up the block as a pointer to its first value.
    ///
    /// The caller becomes responsible for the length and for passing both
    /// back to [`from_raw`](Self::from_raw) exactly once.
    pub fn into_raw(self) -> *mut ValueStorage {
        alloc::track(1);
        Box::into_raw(self.values).cast::<ValueStorage>()
    }

    /// Reclaims a block from [`into_raw`](Self::into_raw).
    ///
    /// # Safety
    ///
    /// `ptr` and `len` must come from one `into_raw` call on a block of
    /// `len` values, and the block must not have been reclaimed already.
    pub unsafe fn from_raw(ptr: *mut ValueStorage, len: usize) -> Self {
        alloc::track(-1);
        Self {
            values: unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)) },
        }
    }
}

impl Deref for ValueBlock {
    type Target = [ValueStorage];

    fn deref(&self) -> &[ValueStorage] {
        &self.values
    }
}

impl DerefMut for ValueBlock {
    fn deref_mut(&mut self) -> &mut [ValueStorage] {
        &mut self.values
    }
}

/// A header followed by a run of values whose count is known only at
/// construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trailing<H> {
    header: H,
    values: ValueBlock,
}

impl<H> Trailing<H> {
    /// Creates a header with `len` trailing absent, defined values.
    pub fn new(header: H, len: usize) -> Self {
        Self {
            header,
            values: ValueBlock::new(len),
        }
    }

    /// Creates a header with a copy of `values` trailing it.
    pub fn with_values(header: H, values: &[ValueStorage]) -> Self {
        Self {
            header,
            values: ValueBlock::from_values(values),
        }
    }

    /// The header.
    pub fn header(&self) -> &H {
        &self.header
    }

    /// The header, for writing.
    pub fn header_mut(&mut self) -> &mut H {
        &mut self.header
    }

    /// Trailing values, bound to the allocated count.
    pub fn values(&self) -> &[ValueStorage] {
        self.values.as_slice()
    }

    /// Trailing values, bound to the allocated count.
    pub fn values_mut(&mut self) -> &mut [ValueStorage] {
        self.values.as_mut_slice()
    }

    /// Number of trailing values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no trailing values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Splits into header and value block.
    pub fn into_parts(self) -> (H, ValueBlock) {
        (self.header, self.values)
    }
}

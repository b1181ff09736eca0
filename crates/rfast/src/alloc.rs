//! Heap buffers behind owned array content.
//!
//! A buffer is handed out as a raw pointer and stored in a value's content
//! word; its size is the value's `capacity_in_bytes`. Tests count buffers and
//! value blocks currently held through raw pointers, per thread, to check
//! that each one is released exactly once.

use std::ptr;

/// Allocates a zeroed byte buffer of `capacity` bytes.
pub(crate) fn allocate_bytes(capacity: usize) -> *mut u8 {
    debug_assert!(capacity > 0);
    let buffer = vec![0u8; capacity].into_boxed_slice();
    track(1);
    Box::into_raw(buffer).cast::<u8>()
}

/// Releases a buffer from [`allocate_bytes`].
///
/// # Safety
///
/// `ptr` must come from `allocate_bytes(capacity)` and not be released yet.
pub(crate) unsafe fn release_bytes(ptr: *mut u8, capacity: usize) {
    track(-1);
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, capacity)) });
}

#[cfg(test)]
thread_local! {
    static OUTSTANDING: std::cell::Cell<isize> = const { std::cell::Cell::new(0) };
}

#[inline]
pub(crate) fn track(delta: isize) {
    #[cfg(test)]
    OUTSTANDING.with(|n| n.set(n.get() + delta));
    #[cfg(not(test))]
    let _ = delta;
}

/// Number of buffers and value blocks currently held through raw pointers.
#[cfg(test)]
pub(crate) fn outstanding() -> isize {
    OUTSTANDING.with(|n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_tracked() {
        let before = outstanding();
        let ptr = allocate_bytes(8);
        assert_eq!(outstanding(), before + 1);
        unsafe {
            ptr.write(7);
            assert_eq!(ptr.read(), 7);
            release_bytes(ptr, 8);
        }
        assert_eq!(outstanding(), before);
    }
}

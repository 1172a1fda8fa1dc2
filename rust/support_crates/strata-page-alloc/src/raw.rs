//! Raw requests to the system allocator.
//!
//! Blocks are requested with a small fixed alignment, the same guarantee a
//! C `malloc` gives; page alignment, when wanted, is produced by the caller
//! over-reserving and rounding the base address up.

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ptr::NonNull;

/// Alignment of every raw block handed out by [`allocate_zeroed`].
pub const RAW_ALIGNMENT: usize = 16;

/// Allocates `size` zero-filled bytes (at least one byte is always requested).
///
/// # Errors
///
/// Returns an `OutOfMemory` error if the allocator cannot satisfy the request,
/// or `InvalidInput` if `size` cannot form a valid layout.
pub fn allocate_zeroed(size: usize) -> std::io::Result<NonNull<u8>> {
    let layout = layout(size)?;
    let ptr = unsafe { alloc_zeroed(layout) };
    NonNull::new(ptr).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "Failed to allocate memory",
        )
    })
}

/// Returns a block obtained from [`allocate_zeroed`] to the system allocator.
///
/// # Safety
///
/// - `ptr` must have been returned by [`allocate_zeroed`] called with the same `size`.
/// - The block must not have been freed already.
/// - No reads or writes through `ptr` may happen after this call.
pub unsafe fn free(ptr: NonNull<u8>, size: usize) {
    // The layout was valid when the block was allocated.
    if let Ok(layout) = layout(size) {
        unsafe { dealloc(ptr.as_ptr(), layout) };
    }
}

fn layout(size: usize) -> std::io::Result<Layout> {
    Layout::from_size_align(size.max(1), RAW_ALIGNMENT)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))
}

/// Rounds `address` up to the next multiple of `alignment` (a power of two).
#[inline]
pub fn align_up(address: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (address + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let ptr = allocate_zeroed(100).unwrap();
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 100) };
        assert!(bytes.iter().all(|&b| b == 0));
        assert_eq!(ptr.as_ptr() as usize % RAW_ALIGNMENT, 0);
        unsafe { free(ptr, 100) };
    }

    #[test]
    fn test_allocate_zero_size() {
        let ptr = allocate_zeroed(0).unwrap();
        unsafe { free(ptr, 0) };
    }

    #[test]
    fn test_allocate_invalid_layout() {
        let err = allocate_zeroed(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4096), 0);
        assert_eq!(align_up(1, 4096), 4096);
        assert_eq!(align_up(4096, 4096), 4096);
        assert_eq!(align_up(4097, 4096), 8192);
        assert_eq!(align_up(17, 16), 32);
    }
}

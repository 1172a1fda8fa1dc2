//! Overflow-safe range arithmetic used by bulk transfers and views.

use strata_common::{Result, error::Error};

/// Checks that `offset..offset + length` lies within `0..size`.
#[inline]
pub fn check_from_index_size(offset: usize, length: usize, size: usize) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::index_out_of_bounds(offset, length, size)),
    }
}

/// Checks that `start <= end <= bound`.
#[inline]
pub fn check_range(start: usize, end: usize, bound: usize) -> Result<()> {
    if start <= end && end <= bound {
        Ok(())
    } else {
        Err(Error::index_out_of_bounds(
            start,
            end.saturating_sub(start),
            bound,
        ))
    }
}

/// Whether a transfer of `length` elements of `width` bytes is large enough
/// for a single block copy.
#[inline]
pub fn exceeds_copy_threshold(length: usize, width: usize, threshold: usize) -> bool {
    length
        .checked_mul(width)
        .is_none_or(|bytes| bytes > threshold)
}

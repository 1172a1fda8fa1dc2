//! Mark, position, limit and capacity of a buffer.

use strata_common::{Result, error::Error};

/// The cursor state shared by every buffer variant.
///
/// Maintains `mark <= position <= limit <= capacity` (the mark only while it
/// is set). All indices are in elements, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    mark: Option<usize>,
    position: usize,
    limit: usize,
    capacity: usize,
}

impl Cursor {
    /// A cursor spanning the whole capacity: position 0, limit = capacity.
    pub fn new(capacity: usize) -> Cursor {
        Cursor {
            mark: None,
            position: 0,
            limit: capacity,
            capacity,
        }
    }

    /// A cursor over `[position, limit)` of a `capacity`-element storage.
    pub fn with_window(position: usize, limit: usize, capacity: usize) -> Result<Cursor> {
        let mut cursor = Cursor::new(capacity);
        cursor.set_limit(limit)?;
        cursor.set_position(position)?;
        Ok(cursor)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn mark_value(&self) -> Option<usize> {
        self.mark
    }

    /// Number of elements between the position and the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Moves the position. A mark beyond the new position is discarded.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::index_out_of_bounds(position, 0, self.limit));
        }
        if self.mark.is_some_and(|mark| mark > position) {
            self.mark = None;
        }
        self.position = position;
        Ok(())
    }

    /// Moves the limit, pulling the position down to it if necessary.
    /// A mark beyond the new limit is discarded.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(Error::index_out_of_bounds(limit, 0, self.capacity));
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|mark| mark > limit) {
            self.mark = None;
        }
        Ok(())
    }

    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Restores the position saved by [`mark`](Self::mark).
    pub fn reset(&mut self) -> Result<()> {
        let mark = self.mark.ok_or_else(Error::invalid_mark)?;
        self.position = mark;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
        self.mark = None;
    }

    /// Switches from filling to draining: the limit becomes the current
    /// position and the position returns to zero.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    /// Moves the remaining elements' bookkeeping to the front: position
    /// becomes the old `remaining()`, limit becomes the capacity.
    pub fn compact(&mut self) {
        self.position = self.remaining();
        self.limit = self.capacity;
        self.mark = None;
    }

    /// Checks that `size` elements starting at absolute index `index` lie
    /// below the limit.
    #[inline]
    pub fn check_index(&self, index: usize, size: usize) -> Result<()> {
        match index.checked_add(size) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(Error::index_out_of_bounds(index, size, self.limit)),
        }
    }

    /// Returns the position and advances it by `size` for a read.
    #[inline]
    pub fn next_get_index(&mut self, size: usize) -> Result<usize> {
        if self.remaining() < size {
            return Err(Error::underflow(size, self.remaining()));
        }
        let index = self.position;
        self.position += size;
        Ok(index)
    }

    /// Returns the position and advances it by `size` for a write.
    #[inline]
    pub fn next_put_index(&mut self, size: usize) -> Result<usize> {
        if self.remaining() < size {
            return Err(Error::overflow(size, self.remaining()));
        }
        let index = self.position;
        self.position += size;
        Ok(index)
    }

    /// Advances the position by `count` elements already known to be remaining.
    #[inline]
    pub(crate) fn advance(&mut self, count: usize) {
        debug_assert!(count <= self.remaining());
        self.position += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cursor() {
        let cursor = Cursor::new(10);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.limit(), 10);
        assert_eq!(cursor.capacity(), 10);
        assert_eq!(cursor.mark_value(), None);
        assert_eq!(cursor.remaining(), 10);
    }

    #[test]
    fn test_flip_and_clear() {
        let mut cursor = Cursor::new(8);
        cursor.next_put_index(3).unwrap();
        cursor.mark();
        cursor.flip();
        assert_eq!((cursor.position(), cursor.limit()), (0, 3));
        assert_eq!(cursor.mark_value(), None);

        cursor.clear();
        assert_eq!(cursor, Cursor::new(8));
    }

    #[test]
    fn test_mark_and_reset() {
        let mut cursor = Cursor::new(8);
        assert!(matches!(
            cursor.reset().unwrap_err().kind(),
            strata_common::error::ErrorKind::InvalidMark
        ));
        cursor.set_position(2).unwrap();
        cursor.mark();
        cursor.set_position(5).unwrap();
        cursor.reset().unwrap();
        assert_eq!(cursor.position(), 2);

        cursor.rewind();
        assert_eq!(cursor.position(), 0);
        assert!(cursor.reset().is_err());
    }

    #[test]
    fn test_set_position_discards_stale_mark() {
        let mut cursor = Cursor::new(8);
        cursor.set_position(4).unwrap();
        cursor.mark();
        cursor.set_position(6).unwrap();
        assert_eq!(cursor.mark_value(), Some(4));
        cursor.set_position(3).unwrap();
        assert_eq!(cursor.mark_value(), None);

        assert!(cursor.set_position(9).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_set_limit() {
        let mut cursor = Cursor::new(8);
        cursor.set_position(6).unwrap();
        cursor.mark();
        cursor.set_limit(4).unwrap();
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.mark_value(), None);
        assert!(cursor.set_limit(9).unwrap_err().is_out_of_bounds());
        assert!(cursor.set_position(5).is_err());
    }

    #[test]
    fn test_check_index() {
        let cursor = Cursor::with_window(0, 6, 8).unwrap();
        assert!(cursor.check_index(5, 1).is_ok());
        assert!(cursor.check_index(4, 2).is_ok());
        assert!(cursor.check_index(6, 1).unwrap_err().is_out_of_bounds());
        assert!(cursor.check_index(5, 2).is_err());
        assert!(cursor.check_index(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_next_indexes() {
        let mut cursor = Cursor::new(5);
        assert_eq!(cursor.next_get_index(2).unwrap(), 0);
        assert_eq!(cursor.next_put_index(2).unwrap(), 2);
        assert!(cursor.next_get_index(2).unwrap_err().is_underflow());
        assert!(cursor.next_put_index(2).unwrap_err().is_overflow());
        // Failed attempts leave the position untouched.
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_compact() {
        let mut cursor = Cursor::with_window(3, 7, 10).unwrap();
        cursor.mark();
        cursor.compact();
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.limit(), 10);
        assert_eq!(cursor.mark_value(), None);
    }

    #[test]
    fn test_with_window_validation() {
        assert!(Cursor::with_window(2, 1, 4).is_err());
        assert!(Cursor::with_window(0, 5, 4).is_err());
        let cursor = Cursor::with_window(1, 4, 5).unwrap();
        assert_eq!(cursor.remaining(), 3);
    }
}

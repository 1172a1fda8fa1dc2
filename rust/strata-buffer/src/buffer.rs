//! The generic typed buffer.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ptr::{self, NonNull},
};

use strata_common::{Result, error::Error};

use crate::{
    array::SharedArray,
    bounds,
    codec::{Access, Bits, ByteOrder},
    cursor::Cursor,
    direct::{Attachment, NativeSettings},
    element::Element,
};

/// Where the elements of a buffer live.
#[derive(Clone)]
pub(crate) enum Storage<T> {
    /// Elements of a managed array, starting at element `offset`.
    Heap { array: SharedArray<T>, offset: usize },
    /// Elements encoded in a managed byte array, starting at byte `offset`.
    HeapBytes { bytes: SharedArray<u8>, offset: usize },
    /// Elements encoded in native memory starting at `address`.
    Native {
        address: NonNull<u8>,
        access: Access,
        attachment: Attachment,
        settings: NativeSettings,
    },
}

impl<T: Element> Storage<T> {
    /// The same storage, starting `index` elements further.
    fn offset_by(&self, index: usize) -> Storage<T> {
        match self {
            Storage::Heap { array, offset } => Storage::Heap {
                array: array.clone(),
                offset: offset + index,
            },
            Storage::HeapBytes { bytes, offset } => Storage::HeapBytes {
                bytes: bytes.clone(),
                offset: offset + index * T::WIDTH,
            },
            Storage::Native {
                address,
                access,
                attachment,
                settings,
            } => Storage::Native {
                // Callers never move past the capacity.
                address: unsafe { address.add(index * T::WIDTH) },
                access: *access,
                attachment: attachment.clone(),
                settings: *settings,
            },
        }
    }

    /// Address of the first byte of element 0.
    fn base_ptr(&self) -> *mut u8 {
        match self {
            Storage::Heap { array, offset } => unsafe { array.as_ptr().add(*offset) }.cast(),
            Storage::HeapBytes { bytes, offset } => unsafe { bytes.as_ptr().add(*offset) },
            Storage::Native { address, .. } => address.as_ptr(),
        }
    }
}

/// A position/limit-addressed view over a run of `T` elements.
///
/// The elements live either in a managed [`SharedArray`] or in native memory.
/// Several buffers may view the same storage (slices, duplicates, read-only
/// views, typed views over bytes); each keeps its own cursor, and writes
/// through any of them are visible to all.
///
/// Buffers are not `Send`: all views over one storage belong to one thread.
pub struct TypedBuffer<T: Element> {
    pub(crate) cursor: Cursor,
    pub(crate) storage: Storage<T>,
    pub(crate) read_only: bool,
    pub(crate) order: ByteOrder,
}

impl<T: Element> TypedBuffer<T> {
    pub(crate) fn from_parts(
        cursor: Cursor,
        storage: Storage<T>,
        read_only: bool,
        order: ByteOrder,
    ) -> TypedBuffer<T> {
        TypedBuffer {
            cursor,
            storage,
            read_only,
            order,
        }
    }

    /// Byte buffers start out big-endian; wider managed buffers hold their
    /// elements in native order.
    fn default_order() -> ByteOrder {
        if T::WIDTH == 1 {
            ByteOrder::BigEndian
        } else {
            ByteOrder::native()
        }
    }

    /// Allocates a zero-filled buffer backed by a new managed array.
    pub fn allocate(capacity: usize) -> TypedBuffer<T> {
        Self::wrap_array(SharedArray::zeroed(capacity))
    }

    /// Wraps a whole array: capacity and limit are its length, position is zero.
    pub fn wrap_array(array: SharedArray<T>) -> TypedBuffer<T> {
        let capacity = array.len();
        Self::from_parts(
            Cursor::new(capacity),
            Storage::Heap { array, offset: 0 },
            false,
            Self::default_order(),
        )
    }

    /// Wraps an array with the cursor over `offset..offset + length`.
    ///
    /// The capacity is the length of the whole array.
    pub fn wrap(array: SharedArray<T>, offset: usize, length: usize) -> Result<TypedBuffer<T>> {
        bounds::check_from_index_size(offset, length, array.len())?;
        let cursor = Cursor::with_window(offset, offset + length, array.len())?;
        Ok(Self::from_parts(
            cursor,
            Storage::Heap { array, offset: 0 },
            false,
            Self::default_order(),
        ))
    }

    #[inline]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.cursor.limit()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.cursor.has_remaining()
    }

    pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
        self.cursor.set_position(position)?;
        Ok(self)
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self> {
        self.cursor.set_limit(limit)?;
        Ok(self)
    }

    pub fn mark(&mut self) -> &mut Self {
        self.cursor.mark();
        self
    }

    pub fn reset(&mut self) -> Result<&mut Self> {
        self.cursor.reset()?;
        Ok(self)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.cursor.clear();
        self
    }

    pub fn flip(&mut self) -> &mut Self {
        self.cursor.flip();
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.cursor.rewind();
        self
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Byte order used to encode elements in byte storage.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Returns `true` if the buffer exposes a writable backing array.
    pub fn has_array(&self) -> bool {
        matches!(self.storage, Storage::Heap { .. }) && !self.read_only
    }

    /// The backing array of a writable array-backed buffer.
    pub fn array(&self) -> Result<&SharedArray<T>> {
        match &self.storage {
            Storage::Heap { array, .. } if !self.read_only => Ok(array),
            Storage::Heap { .. } => Err(Error::read_only()),
            _ => Err(Error::unsupported("array: buffer has no accessible array")),
        }
    }

    /// Index in the backing array of this buffer's element 0.
    pub fn array_offset(&self) -> Result<usize> {
        match &self.storage {
            Storage::Heap { offset, .. } if !self.read_only => Ok(*offset),
            Storage::Heap { .. } => Err(Error::read_only()),
            _ => Err(Error::unsupported("array_offset: buffer has no accessible array")),
        }
    }

    #[inline]
    pub(crate) fn check_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::read_only())
        } else {
            Ok(())
        }
    }

    /// Reads element `index` (absolute, below the capacity).
    #[inline]
    pub(crate) fn load(&self, index: usize) -> T {
        debug_assert!(index < self.capacity());
        match &self.storage {
            Storage::Heap { array, offset } => array.as_cells()[offset + index].get(),
            Storage::HeapBytes { bytes, offset } => {
                let start = offset + index * T::WIDTH;
                let mut image = [0u8; 8];
                for (byte, cell) in image[..T::WIDTH]
                    .iter_mut()
                    .zip(&bytes.as_cells()[start..start + T::WIDTH])
                {
                    *byte = cell.get();
                }
                T::from_bits(<T::Bits as Bits>::read_from(&image[..T::WIDTH], self.order))
            }
            Storage::Native {
                address, access, ..
            } => T::from_bits(unsafe { access.load(address.as_ptr().add(index * T::WIDTH)) }),
        }
    }

    /// Writes element `index` (absolute, below the capacity).
    #[inline]
    pub(crate) fn store(&self, index: usize, value: T) {
        debug_assert!(index < self.capacity());
        match &self.storage {
            Storage::Heap { array, offset } => array.as_cells()[offset + index].set(value),
            Storage::HeapBytes { bytes, offset } => {
                let start = offset + index * T::WIDTH;
                let mut image = [0u8; 8];
                Bits::write_to(value.to_bits(), &mut image[..T::WIDTH], self.order);
                for (cell, &byte) in bytes.as_cells()[start..start + T::WIDTH]
                    .iter()
                    .zip(&image[..T::WIDTH])
                {
                    cell.set(byte);
                }
            }
            Storage::Native {
                address, access, ..
            } => unsafe {
                access.store(address.as_ptr().add(index * T::WIDTH), value.to_bits())
            },
        }
    }

    /// Whether a bulk transfer of `length` elements to or from native memory
    /// is done with a single block copy.
    fn block_copy(access: Access, length: usize, settings: &NativeSettings) -> bool {
        (T::WIDTH == 1 || access == Access::Native)
            && bounds::exceeds_copy_threshold(length, T::WIDTH, settings.copy_threshold)
    }

    /// Copies `dst.len()` elements starting at absolute `position` into `dst`.
    fn read_elements(&self, position: usize, dst: &mut [T]) {
        let length = dst.len();
        match &self.storage {
            Storage::Heap { array, offset } => {
                let start = offset + position;
                for (value, cell) in dst.iter_mut().zip(&array.as_cells()[start..start + length]) {
                    *value = cell.get();
                }
            }
            Storage::Native {
                address,
                access,
                settings,
                ..
            } if Self::block_copy(*access, length, settings) => unsafe {
                ptr::copy(
                    address.as_ptr().add(position * T::WIDTH),
                    dst.as_mut_ptr().cast::<u8>(),
                    length * T::WIDTH,
                )
            },
            _ => {
                for (i, value) in dst.iter_mut().enumerate() {
                    *value = self.load(position + i);
                }
            }
        }
    }

    /// Copies `length` elements from `src` to the current position.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reading `length` elements, `length` must not
    /// exceed `remaining()`, and unless the storage is a managed array of `T`
    /// the source must not overlap it.
    unsafe fn write_elements(&self, src: *const T, length: usize) {
        let position = self.position();
        match &self.storage {
            Storage::Heap { array, offset } => unsafe {
                ptr::copy(src, array.as_ptr().add(offset + position), length)
            },
            Storage::Native {
                address,
                access,
                settings,
                ..
            } if Self::block_copy(*access, length, settings) => unsafe {
                ptr::copy(
                    src.cast::<u8>(),
                    address.as_ptr().add(position * T::WIDTH),
                    length * T::WIDTH,
                )
            },
            _ => {
                for i in 0..length {
                    self.store(position + i, unsafe { src.add(i).read() });
                }
            }
        }
    }

    /// Returns `true` if the storage of both buffers shares any byte.
    fn overlaps(&self, other: &TypedBuffer<T>) -> bool {
        let start = self.storage.base_ptr() as usize;
        let end = start + self.capacity() * T::WIDTH;
        let other_start = other.storage.base_ptr() as usize;
        let other_end = other_start + other.capacity() * T::WIDTH;
        start < other_end && other_start < end
    }

    /// Reads the element at the position and advances it.
    pub fn get(&mut self) -> Result<T> {
        let index = self.cursor.next_get_index(1)?;
        Ok(self.load(index))
    }

    /// Reads the element at absolute `index`, leaving the position unchanged.
    pub fn get_at(&self, index: usize) -> Result<T> {
        self.cursor.check_index(index, 1)?;
        Ok(self.load(index))
    }

    /// Reads `length` elements into `dst[offset..offset + length]` and advances
    /// the position by `length`.
    ///
    /// Nothing is copied if the range is outside `dst` or fewer than `length`
    /// elements remain.
    pub fn get_into(&mut self, dst: &mut [T], offset: usize, length: usize) -> Result<&mut Self> {
        bounds::check_from_index_size(offset, length, dst.len())?;
        if length > self.remaining() {
            return Err(Error::underflow(length, self.remaining()));
        }
        self.read_elements(self.position(), &mut dst[offset..offset + length]);
        self.cursor.advance(length);
        Ok(self)
    }

    /// Fills the whole of `dst`.
    pub fn get_slice(&mut self, dst: &mut [T]) -> Result<&mut Self> {
        self.get_into(dst, 0, dst.len())
    }

    /// Writes `value` at the position and advances it.
    pub fn put(&mut self, value: T) -> Result<&mut Self> {
        self.check_writable()?;
        let index = self.cursor.next_put_index(1)?;
        self.store(index, value);
        Ok(self)
    }

    /// Writes `value` at absolute `index`, leaving the position unchanged.
    pub fn put_at(&mut self, index: usize, value: T) -> Result<&mut Self> {
        self.check_writable()?;
        self.cursor.check_index(index, 1)?;
        self.store(index, value);
        Ok(self)
    }

    /// Writes `src[offset..offset + length]` at the position and advances it
    /// by `length`.
    pub fn put_from(&mut self, src: &[T], offset: usize, length: usize) -> Result<&mut Self> {
        self.check_writable()?;
        bounds::check_from_index_size(offset, length, src.len())?;
        if length > self.remaining() {
            return Err(Error::overflow(length, self.remaining()));
        }
        unsafe { self.write_elements(src[offset..].as_ptr(), length) };
        self.cursor.advance(length);
        Ok(self)
    }

    /// Writes the whole of `src`.
    pub fn put_slice(&mut self, src: &[T]) -> Result<&mut Self> {
        self.put_from(src, 0, src.len())
    }

    /// Transfers the remaining elements of `src` into this buffer, advancing
    /// both positions.
    ///
    /// Views over the same storage may overlap; the result is as if the source
    /// elements were read in full before any was written. A buffer cannot be
    /// put into itself:
    ///
    /// ```compile_fail
    /// use strata_buffer::ShortBuffer;
    ///
    /// let mut buffer = ShortBuffer::allocate(4);
    /// buffer.put_buffer(&mut buffer).unwrap();
    /// ```
    pub fn put_buffer(&mut self, src: &mut TypedBuffer<T>) -> Result<&mut Self> {
        self.check_writable()?;
        let length = src.remaining();
        if length > self.remaining() {
            return Err(Error::overflow(length, self.remaining()));
        }
        let position = self.position();
        let src_position = src.position();
        match (&self.storage, &src.storage) {
            (Storage::Native { address, .. }, Storage::Native { address: from, .. })
                if T::WIDTH == 1 || self.order == src.order =>
            unsafe {
                ptr::copy(
                    from.as_ptr().add(src_position * T::WIDTH),
                    address.as_ptr().add(position * T::WIDTH),
                    length * T::WIDTH,
                )
            },
            _ if self.overlaps(src) => {
                let values = (0..length)
                    .map(|i| src.load(src_position + i))
                    .collect::<Vec<_>>();
                unsafe { self.write_elements(values.as_ptr(), length) }
            }
            (_, Storage::Heap { array, offset }) => unsafe {
                self.write_elements(array.as_ptr().add(offset + src_position), length)
            },
            _ => {
                for i in 0..length {
                    self.store(position + i, src.load(src_position + i));
                }
            }
        }
        src.cursor.advance(length);
        self.cursor.advance(length);
        Ok(self)
    }

    /// A buffer over the remaining elements: capacity and limit equal
    /// `remaining()`, position zero, no mark.
    pub fn slice(&self) -> TypedBuffer<T> {
        self.view(self.position(), self.remaining())
    }

    /// A buffer over absolute `start..end`, which must lie below the limit.
    pub fn slice_range(&self, start: usize, end: usize) -> Result<TypedBuffer<T>> {
        bounds::check_range(start, end, self.limit())?;
        Ok(self.view(start, end - start))
    }

    fn view(&self, start: usize, length: usize) -> TypedBuffer<T> {
        Self::from_parts(
            Cursor::new(length),
            self.storage.offset_by(start),
            self.read_only,
            self.derived_order(),
        )
    }

    /// A buffer over the same storage with an independent copy of the cursor.
    ///
    /// Derived byte buffers start out big-endian again; wider buffers keep
    /// the order their elements are stored in.
    pub fn duplicate(&self) -> TypedBuffer<T> {
        Self::from_parts(
            self.cursor,
            self.storage.clone(),
            self.read_only,
            self.derived_order(),
        )
    }

    fn derived_order(&self) -> ByteOrder {
        if T::WIDTH == 1 {
            ByteOrder::BigEndian
        } else {
            self.order
        }
    }

    /// A duplicate that rejects every write.
    pub fn as_read_only(&self) -> TypedBuffer<T> {
        let mut buffer = self.duplicate();
        buffer.read_only = true;
        buffer
    }

    /// Moves the remaining elements to the start of the buffer, then sets the
    /// position to their count and the limit to the capacity.
    pub fn compact(&mut self) -> Result<&mut Self> {
        self.check_writable()?;
        let base = self.storage.base_ptr();
        unsafe {
            ptr::copy(
                base.add(self.position() * T::WIDTH),
                base,
                self.remaining() * T::WIDTH,
            )
        };
        self.cursor.compact();
        Ok(self)
    }

    /// Copies the remaining elements out without moving the position.
    pub fn to_vec(&self) -> Vec<T> {
        let mut values = vec![T::zeroed(); self.remaining()];
        self.read_elements(self.position(), &mut values);
        values
    }

    fn mismatch_within(&self, other: &TypedBuffer<T>, length: usize) -> Option<usize> {
        let (position, other_position) = (self.position(), other.position());
        (0..length).find(|&i| !T::same(self.load(position + i), other.load(other_position + i)))
    }

    /// Relative index of the first element at which the remaining contents
    /// differ, or `None` if they are equal.
    ///
    /// When one side is a proper prefix of the other, the result is the length
    /// of the shorter side.
    pub fn mismatch(&self, other: &TypedBuffer<T>) -> Option<usize> {
        let length = self.remaining().min(other.remaining());
        self.mismatch_within(other, length)
            .or_else(|| (self.remaining() != other.remaining()).then_some(length))
    }

    /// Lexicographic comparison of the remaining contents.
    pub fn compare_to(&self, other: &TypedBuffer<T>) -> Ordering {
        let length = self.remaining().min(other.remaining());
        match self.mismatch_within(other, length) {
            Some(i) => T::compare(
                self.load(self.position() + i),
                other.load(other.position() + i),
            ),
            None => self.remaining().cmp(&other.remaining()),
        }
    }

    /// Hash of the remaining contents: `h = 31 * h + e` from the last
    /// remaining element back to the first, starting from 1.
    pub fn hash_code(&self) -> i32 {
        (self.position()..self.limit())
            .rev()
            .fold(1i32, |h, i| {
                h.wrapping_mul(31).wrapping_add(self.load(i).hash_value())
            })
    }
}

impl<T: Element> PartialEq for TypedBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
            && self.mismatch_within(other, self.remaining()).is_none()
    }
}

impl<T: Element> Eq for TypedBuffer<T> {}

impl<T: Element> PartialOrd for TypedBuffer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Element> Ord for TypedBuffer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

impl<T: Element> Hash for TypedBuffer<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl<T: Element> fmt::Display for TypedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypedBuffer<{}>[pos={} lim={} cap={}]",
            T::NAME,
            self.position(),
            self.limit(),
            self.capacity()
        )
    }
}

impl<T: Element> fmt::Debug for TypedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("element", &T::NAME)
            .field("cursor", &self.cursor)
            .field("direct", &self.is_direct())
            .field("read_only", &self.read_only)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

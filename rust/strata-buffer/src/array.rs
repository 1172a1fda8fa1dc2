use std::{cell::Cell, rc::Rc};

/// A managed array shared between its holder and the buffers that wrap it.
///
/// Clones share the same storage: a write through any buffer backed by the
/// array is visible to every other clone, and vice versa.
pub struct SharedArray<T>(Rc<[Cell<T>]>);

impl<T: Copy> SharedArray<T> {
    /// Creates an array of `len` zero elements.
    pub fn zeroed(len: usize) -> SharedArray<T>
    where
        T: bytemuck::Zeroable,
    {
        SharedArray((0..len).map(|_| Cell::new(T::zeroed())).collect())
    }

    pub fn from_vec(values: Vec<T>) -> SharedArray<T> {
        SharedArray(values.into_iter().map(Cell::new).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.0.get(index).map(Cell::get)
    }

    /// Stores `value` at `index`. Returns `false` if the index is out of range.
    #[inline]
    pub fn set(&self, index: usize, value: T) -> bool {
        match self.0.get(index) {
            Some(cell) => {
                cell.set(value);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn as_cells(&self) -> &[Cell<T>] {
        &self.0
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.iter().map(Cell::get).collect()
    }

    /// Returns `true` if both handles refer to the same storage.
    #[inline]
    pub fn ptr_eq(&self, other: &SharedArray<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Raw pointer to the first element, valid for reads and writes of
    /// `len()` elements while any clone is alive.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.0.as_ptr().cast::<T>().cast_mut()
    }
}

impl<T> Clone for SharedArray<T> {
    fn clone(&self) -> Self {
        SharedArray(self.0.clone())
    }
}

impl<T: Copy> From<Vec<T>> for SharedArray<T> {
    fn from(values: Vec<T>) -> Self {
        SharedArray::from_vec(values)
    }
}

impl<T: Copy, const N: usize> From<[T; N]> for SharedArray<T> {
    fn from(values: [T; N]) -> Self {
        SharedArray(values.into_iter().map(Cell::new).collect())
    }
}

impl<T: Copy + std::fmt::Debug> std::fmt::Debug for SharedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter().map(Cell::get)).finish()
    }
}

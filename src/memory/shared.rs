//! Write-disjoint shared view over a mutable slice

use std::marker::PhantomData;
use std::ptr::NonNull;

/// A mutable slice that several workers may write through at once.
///
/// The view holds the exclusive borrow of the slice for its lifetime, so no
/// safe code can observe the slice while workers write. Each write is unsafe:
/// the caller guarantees that no two workers touch the same index during one
/// phase. The sorter derives that guarantee from the offset table, whose
/// (worker, bucket) ranges tile the buffer without overlap, and from the key
/// buffer always holding a permutation.
pub struct SharedSlice<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: sending the view is sending the exclusive borrow.
unsafe impl<T: Send> Send for SharedSlice<'_, T> {}
// SAFETY: shared access only exposes unsafe writes whose disjointness the
// caller guarantees.
unsafe impl<T: Send> Sync for SharedSlice<'_, T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    /// Wrap a mutable slice
    pub fn new(slice: &'a mut [T]) -> Self {
        let len = slice.len();
        Self {
            // SAFETY: slice pointers are never null.
            ptr: unsafe { NonNull::new_unchecked(slice.as_mut_ptr()) },
            len,
            _marker: PhantomData,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the view is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write one element.
    ///
    /// # Safety
    ///
    /// `index < len()`, and no other thread reads or writes `index` until the
    /// current phase ends.
    #[inline(always)]
    pub unsafe fn write(&self, index: usize, value: T) {
        debug_assert!(index < self.len, "shared write {} out of {}", index, self.len);
        // SAFETY: in bounds and unaliased per the caller contract.
        unsafe { self.ptr.as_ptr().add(index).write(value) }
    }

    /// Copy `src` into positions `start..start + src.len()`.
    ///
    /// # Safety
    ///
    /// The destination range lies within `len()` and no other thread touches
    /// it until the current phase ends.
    #[inline]
    pub unsafe fn copy_from_slice(&self, start: usize, src: &[T]) {
        debug_assert!(start + src.len() <= self.len);
        // SAFETY: in bounds per the caller contract; src is a distinct buffer.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.as_ptr().add(start), src.len())
        }
    }
}

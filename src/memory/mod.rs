//! Scratch memory for a sort call
//!
//! Scratch buffers are allocated zeroed through the global allocator so that
//! large buffers come back as untouched pages; the first write to each page
//! (the first-touch phase, or the first scatter) decides its NUMA placement.
//! [`SharedSlice`] lets a worker team write disjoint positions of one buffer.

mod shared;

pub use shared::SharedSlice;

use crate::algorithms::radix_key::WideUint;
use crate::error::{PradsortError, Result};
use std::alloc::{alloc_zeroed, Layout};
use std::mem;

/// Marker for plain integer types whose all-zero bit pattern is a valid value.
///
/// # Safety
///
/// Implementors must accept a fully zeroed bit pattern as a valid instance and
/// must not own heap memory or implement `Drop`.
pub unsafe trait ZeroInit: Copy {}

macro_rules! impl_zero_init {
    ($($t:ty),*) => {
        $(unsafe impl ZeroInit for $t {})*
    };
}

impl_zero_init!(u8, u16, u32, u64, u128, usize);

// SAFETY: a WideUint is a plain array of u64 words.
unsafe impl<const WORDS: usize> ZeroInit for WideUint<WORDS> {}

/// Allocate `len` zeroed elements, reporting allocation failure as an error.
pub fn try_alloc_zeroed<T: ZeroInit>(len: usize) -> Result<Vec<T>> {
    if len == 0 {
        return Ok(Vec::new());
    }

    let layout = Layout::array::<T>(len)
        .map_err(|_| PradsortError::out_of_memory(len.saturating_mul(mem::size_of::<T>())))?;

    if layout.size() == 0 {
        let mut buffer = Vec::new();
        // SAFETY: zero-sized elements need no storage and zero is a valid value.
        unsafe { buffer.set_len(len) };
        return Ok(buffer);
    }

    // SAFETY: layout has a non-zero size.
    let ptr = unsafe { alloc_zeroed(layout) } as *mut T;
    if ptr.is_null() {
        return Err(PradsortError::out_of_memory(layout.size()));
    }

    // SAFETY: ptr comes from the global allocator with the layout Vec<T> uses
    // for capacity `len`, and every element is a valid zeroed T.
    Ok(unsafe { Vec::from_raw_parts(ptr, len, len) })
}

/// Bytes needed for the scratch state of one sort call.
pub fn scratch_bytes<T, K>(len: usize, workers: usize, buckets: usize) -> usize {
    len * (mem::size_of::<T>() + mem::size_of::<K>())
        + 2 * workers * buckets * mem::size_of::<usize>()
        + buckets * mem::size_of::<usize>()
}

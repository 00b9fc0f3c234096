//! Permutation finalizer
//!
//! The pass loop leaves `key[p]` = original position of the value now at `p`.
//! Callers get the inverse: `key[i]` = final position of original element `i`.
//! Inversion writes every slot exactly once because the key array is a
//! permutation, so workers can invert their own source ranges in parallel.
//!
//! Buffers ping-pong once per pass, so pass parity decides where the results
//! live and which single copy-back is needed.

use crate::algorithms::radix_key::SortIndex;
use crate::memory::SharedSlice;
use std::ops::Range;

/// Buffer pair holding the results of the last pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residence {
    /// The caller's buffers (even pass count)
    Caller,
    /// The scratch buffers (odd pass count)
    Scratch,
}

impl Residence {
    /// Residence after `passes` passes
    pub fn after(passes: usize) -> Self {
        if passes % 2 == 0 {
            Residence::Caller
        } else {
            Residence::Scratch
        }
    }
}

/// Write `inverted[keys[p]] = p` for every `p` in `range`.
///
/// # Safety
///
/// `keys` is a permutation of `0..inverted.len()` and `inverted` is not read
/// by any thread during the phase. Ranges handed to concurrent callers are
/// disjoint.
pub unsafe fn invert_range<K: SortIndex>(keys: &[K], range: Range<usize>, inverted: &SharedSlice<'_, K>) {
    for pos in range {
        let original = keys[pos].to_index();
        // SAFETY: each original position appears once in the permutation.
        unsafe { inverted.write(original, K::from_index(pos)) };
    }
}

/// Copy `src[range]` into the same positions of `dst`.
///
/// # Safety
///
/// `range` lies within both buffers and no other thread touches it in `dst`
/// during the phase.
pub unsafe fn copy_range<T: Copy>(src: &[T], range: Range<usize>, dst: &SharedSlice<'_, T>) {
    let start = range.start;
    // SAFETY: the destination range is exclusive per the caller contract.
    unsafe { dst.copy_from_slice(start, &src[range]) };
}

//! Lock-free scatter
//!
//! Each worker walks its source partition in order and moves every value, and
//! the key travelling with it, to the cursor of the value's bucket. The
//! resolved offsets give every (worker, bucket) pair its own destination
//! range, so workers never write the same slot and need no synchronization
//! until the phase barrier. Walking in source order keeps equal digits in
//! their previous relative order, which makes each pass stable.

use crate::algorithms::radix_key::{RadixKey, SortIndex};
use crate::memory::SharedSlice;

/// Scatter one worker's partition.
///
/// `cursors` holds the worker's absolute start per bucket and is advanced
/// past every written element. `counts` is the worker's histogram for the
/// same pass; debug builds check that no cursor leaves its range and that
/// every range is filled exactly.
///
/// # Safety
///
/// The cursors come from the offset resolver for this pass, so the ranges
/// `cursors[j]..cursors[j] + counts[j]` of all workers tile both destinations
/// without overlap, and no other thread reads the destinations during the
/// phase.
pub unsafe fn scatter_partition<T: RadixKey, K: SortIndex>(
    src_values: &[T],
    src_keys: &[K],
    shift: u32,
    mask: usize,
    cursors: &mut [usize],
    counts: &[usize],
    dst_values: &SharedSlice<'_, T>,
    dst_keys: &SharedSlice<'_, K>,
) {
    debug_assert_eq!(src_values.len(), src_keys.len());
    debug_assert_eq!(cursors.len(), counts.len());

    #[cfg(debug_assertions)]
    let ends: Vec<usize> = cursors.iter().zip(counts).map(|(c, n)| c + n).collect();

    for (&value, &key) in src_values.iter().zip(src_keys) {
        let bucket = value.digit(shift, mask);
        let pos = cursors[bucket];
        #[cfg(debug_assertions)]
        debug_assert!(pos < ends[bucket], "bucket {} cursor {} past {}", bucket, pos, ends[bucket]);
        // SAFETY: pos lies in this worker's range for `bucket` per the caller contract.
        unsafe {
            dst_values.write(pos, value);
            dst_keys.write(pos, key);
        }
        cursors[bucket] = pos + 1;
    }

    #[cfg(debug_assertions)]
    debug_assert_eq!(&*cursors, ends.as_slice(), "bucket ranges not filled exactly");
}

//! Offset resolution: the two-level prefix sum
//!
//! After the histogram phase every worker holds a count per bucket. The
//! absolute destination where worker `i` starts writing bucket `j` is
//!
//! ```text
//! offset(i, j) = sum of all counts of buckets < j
//!              + sum of the counts of bucket j held by workers < i
//! ```
//!
//! The first term is the global bucket base. The second is an exclusive scan
//! along the worker dimension, computed as an up-sweep/down-sweep tree scan
//! over the `T` worker rows. Each tree level updates whole rows, so the scan is
//! `ceil(log2 T)` levels deep and one bucket array wide. Levels run in parallel
//! across the node pairs of that level; the end of each level is a barrier.
//!
//! The tree is right aligned: at level `d` the nodes are the last rows of
//! consecutive `2^(d+1)`-row chunks counted from the end, so a team that is
//! not a power of two only shortens the leftmost chunk.

use crate::algorithms::partition::{WorkerPartition, WorkerSlot};
use rayon::prelude::*;
use std::mem;

/// Levels of the worker tree: `ceil(log2 workers)`
pub fn tree_depth(workers: usize) -> u32 {
    workers.max(1).next_power_of_two().trailing_zeros()
}

/// Fill `bases` with the exclusive prefix over buckets of the global counts.
pub fn global_bucket_bases(slots: &mut [WorkerSlot], bases: &mut [usize]) {
    let rows: Vec<&[usize]> = slots
        .iter_mut()
        .map(|slot| slot.get_mut().bucket_counts.as_slice())
        .collect();

    bases.par_iter_mut().enumerate().for_each(|(bucket, base)| {
        *base = rows.iter().map(|row| row[bucket]).sum();
    });

    let mut running = 0;
    for base in bases.iter_mut() {
        let count = *base;
        *base = running;
        running += count;
    }
}

/// Turn every worker's counts into absolute write cursors.
///
/// On return `write_cursors[j]` of worker `i` equals `bases[j]` plus the
/// bucket `j` counts of workers `0..i`. `bucket_counts` is left untouched.
/// Runs in the current rayon pool.
pub fn resolve_offsets(slots: &mut [WorkerSlot], bases: &[usize]) {
    let workers = slots.len();
    if workers == 0 {
        return;
    }

    slots.par_iter_mut().for_each(|slot| {
        let worker = slot.get_mut();
        worker.write_cursors.copy_from_slice(&worker.bucket_counts);
    });

    let depth = tree_depth(workers);

    // Up-sweep: each right node accumulates its left sibling subtree
    for level in 0..depth {
        for_each_pair(slots, level, |left, right| {
            for (r, l) in right.iter_mut().zip(left.iter()) {
                *r += *l;
            }
        });
    }

    slots[workers - 1]
        .get_mut()
        .write_cursors
        .copy_from_slice(bases);

    // Down-sweep: the left child takes the parent's prefix, the right child
    // adds the left subtree total
    for level in (0..depth).rev() {
        for_each_pair(slots, level, |left, right| {
            for (r, l) in right.iter_mut().zip(left.iter_mut()) {
                mem::swap(l, r);
                *r += *l;
            }
        });
    }
}

fn for_each_pair<F>(slots: &mut [WorkerSlot], level: u32, op: F)
where
    F: Fn(&mut [usize], &mut [usize]) + Sync,
{
    let half = 1usize << level;
    slots.par_rchunks_mut(half << 1).for_each(|chunk| {
        let len = chunk.len();
        if len <= half {
            return;
        }
        let (head, tail) = chunk.split_at_mut(len - 1);
        let left: &mut WorkerPartition = head[len - 1 - half].get_mut();
        let right: &mut WorkerPartition = tail[0].get_mut();
        op(&mut left.write_cursors, &mut right.write_cursors);
    });
}

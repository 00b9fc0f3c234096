//! Partition planning
//!
//! Splits `[0, n)` into one contiguous range per worker by recursive
//! bisection. An even team is halved; an odd team hands one worker its
//! `1/T` share and recurses on the other `T - 1`. Sizes are counted in units
//! of `unit` elements (one page when page-aligned partitioning is on), and the
//! elements that do not fill a whole unit go to the last worker.

use crate::error::Result;
use crate::memory::try_alloc_zeroed;
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::ops::Range;

/// State owned by one worker for the duration of a sort call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPartition {
    /// Elements owned by the worker
    pub range: Range<usize>,
    /// Digit histogram of the current pass
    pub bucket_counts: Vec<usize>,
    /// Absolute destination cursor per bucket, advanced during scatter
    pub write_cursors: Vec<usize>,
    /// Node the worker was bound to, if any
    pub numa_node: Option<usize>,
}

impl WorkerPartition {
    /// Allocate the state of a worker owning `range`
    pub fn new(range: Range<usize>, buckets: usize) -> Result<Self> {
        Ok(Self {
            range,
            bucket_counts: try_alloc_zeroed(buckets)?,
            write_cursors: try_alloc_zeroed(buckets)?,
            numa_node: None,
        })
    }

    /// First element owned by the worker
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Number of elements owned by the worker
    pub fn count(&self) -> usize {
        self.range.len()
    }
}

/// Worker state on its own cache line.
///
/// The lock is taken once per phase by the owning worker; the offset resolver
/// reaches every slot through `&mut` without locking.
pub type WorkerSlot = CachePadded<Mutex<WorkerPartition>>;

/// Allocate one slot per range
pub fn allocate_workers(ranges: &[Range<usize>], buckets: usize) -> Result<Vec<WorkerSlot>> {
    ranges
        .iter()
        .map(|range| {
            WorkerPartition::new(range.clone(), buckets).map(|w| CachePadded::new(Mutex::new(w)))
        })
        .collect()
}

/// Plan the ranges of `workers` workers over `n` elements in units of `unit`.
///
/// Ranges are in worker order, contiguous and cover `[0, n)` exactly. A
/// team of zero is planned as a team of one.
pub fn plan_partitions(workers: usize, n: usize, unit: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let unit = unit.max(1);
    let units = n / unit;

    let mut sizes = Vec::with_capacity(workers);
    bisect(workers, units, &mut sizes);

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for (worker, size) in sizes.into_iter().enumerate() {
        let mut len = size * unit;
        if worker + 1 == workers {
            len += n - units * unit;
        }
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

fn bisect(workers: usize, units: usize, sizes: &mut Vec<usize>) {
    if workers == 1 {
        sizes.push(units);
    } else if workers % 2 == 1 {
        let first = units / workers;
        bisect(1, first, sizes);
        bisect(workers - 1, units - first, sizes);
    } else {
        let half = units / 2;
        bisect(workers / 2, half, sizes);
        bisect(workers / 2, units - half, sizes);
    }
}

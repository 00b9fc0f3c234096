//! Parallel stable LSD radix sort
//!
//! [`RadixSorter`] sorts a prefix of a value buffer and fills a companion key
//! buffer with the position map: after the call `keys[i]` is the position in
//! the sorted output of the element originally at `i`, so callers can reorder
//! payloads indirectly.
//!
//! One call runs these phases on a dedicated worker team:
//!
//! 1. **Binding**: optional CPU/NUMA pinning, first touch of the scratch
//!    partitions and seeding of the position map
//! 2. **Bit extent**: OR-reduction bounding the number of passes
//! 3. per pass, **histogram**, **offset resolution** and **scatter**
//! 4. **Finalize**: inversion of the position map and copy-back
//!
//! Worker `i` is always thread `i` of the team, so a worker binds once and
//! keeps its partition on the same CPU for the whole call.
//!
//! ```rust
//! use pradsort::algorithms::RadixSorter;
//! use pradsort::config::SortConfig;
//! # fn main() -> pradsort::Result<()> {
//! let mut values = vec![5u32, 3, 3, 1];
//! let mut keys = vec![0u32; 4];
//!
//! let config = SortConfig::builder().digit_bits(1).num_threads(2).build()?;
//! let mut sorter = RadixSorter::with_config(config);
//! sorter.sort(&mut values, &mut keys, 4, None)?;
//!
//! assert_eq!(values, vec![1, 3, 3, 5]);
//! assert_eq!(keys, vec![3, 1, 2, 0]);
//! # Ok(())
//! # }
//! ```

use crate::algorithms::finalize::{copy_range, invert_range, Residence};
use crate::algorithms::histogram::{bit_or_extent, combine_extents, count_digits};
use crate::algorithms::partition::{allocate_workers, plan_partitions, WorkerPartition};
use crate::algorithms::prefix_sum::{global_bucket_bases, resolve_offsets};
use crate::algorithms::radix_key::{RadixKey, SortIndex};
use crate::algorithms::scatter::scatter_partition;
use crate::config::sort::check_digit_bits;
use crate::config::{Config, SortConfig};
use crate::error::{PradsortError, Result};
use crate::memory::{scratch_bytes, try_alloc_zeroed, SharedSlice};
use crate::system::affinity::{bind_worker, first_touch, BindOutcome};
use crate::system::profiling::{Phase, PhaseTimer};
use crate::system::topology::topology;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::mem;
use std::time::Instant;

/// Statistics of the most recent sort call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Elements sorted
    pub elements: usize,
    /// Workers in the team
    pub workers: usize,
    /// Digit passes run
    pub passes: usize,
    /// Bits per digit
    pub digit_bits: u32,
    /// Workers pinned as requested
    pub bound_workers: usize,
    /// Workers whose requested binding could not be applied
    pub unbound_workers: usize,
    /// Scratch memory in bytes
    pub memory_used: usize,
    /// Wall time in microseconds
    pub processing_time_us: u64,
}

impl SortStats {
    /// Calculate processing rate in items per second
    pub fn items_per_second(&self) -> f64 {
        if self.processing_time_us == 0 {
            return 0.0;
        }
        (self.elements as f64) / (self.processing_time_us as f64 / 1_000_000.0)
    }
}

/// Forwards phase events to the caller's timer, if any
struct Timing<'a> {
    timer: Option<&'a mut dyn PhaseTimer>,
}

impl Timing<'_> {
    fn start(&mut self, phase: Phase) {
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.start(phase);
        }
    }

    fn stop(&mut self, phase: Phase) {
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.stop(phase);
        }
    }

    fn accumulate(&mut self, phase: Phase) {
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.accumulate(phase);
        }
    }

    fn commit(&mut self, phase: Phase) {
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.commit(phase);
        }
    }
}

/// Parallel stable radix sorter
#[derive(Debug, Clone)]
pub struct RadixSorter {
    config: SortConfig,
    stats: SortStats,
}

impl RadixSorter {
    /// Create a sorter with the default configuration
    pub fn new() -> Self {
        Self::with_config(SortConfig::default())
    }

    /// Create a sorter with a custom configuration
    pub fn with_config(config: SortConfig) -> Self {
        Self {
            config,
            stats: SortStats::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Statistics of the last successful call
    pub fn stats(&self) -> &SortStats {
        &self.stats
    }

    /// Scratch memory a call over `n` elements would allocate
    pub fn estimate_memory<T, K>(&self, n: usize) -> usize {
        let workers = self.config.effective_threads().min(n.max(1));
        scratch_bytes::<T, K>(n, workers, self.config.bucket_count())
    }

    /// Sort `values[..n]` and write the position map into `keys[..n]`.
    ///
    /// Elements past `n` are never touched. Whatever `keys` held before is
    /// overwritten. The call fails before touching either buffer when the
    /// digit width is outside 1..=16, `n` exceeds a buffer, or `n - 1` does
    /// not fit the key type. With `n == 0` it returns at once.
    pub fn sort<T: RadixKey, K: SortIndex>(
        &mut self,
        values: &mut [T],
        keys: &mut [K],
        n: usize,
        timer: Option<&mut dyn PhaseTimer>,
    ) -> Result<()> {
        let start_time = Instant::now();

        check_digit_bits(self.config.digit_bits)?;
        self.config.validate()?;

        if n > values.len() || n > keys.len() {
            return Err(PradsortError::invalid_input(format!(
                "n = {} exceeds buffers of {} values and {} keys",
                n,
                values.len(),
                keys.len()
            )));
        }
        if n == 0 {
            self.stats = SortStats {
                digit_bits: self.config.digit_bits,
                ..SortStats::default()
            };
            return Ok(());
        }
        if n - 1 > K::MAX_INDEX {
            return Err(PradsortError::invalid_input(format!(
                "{} positions do not fit a key type of at most {}",
                n,
                K::MAX_INDEX
            )));
        }

        let values = &mut values[..n];
        let keys = &mut keys[..n];
        let digit_bits = self.config.digit_bits;
        let buckets = self.config.bucket_count();
        let mask = buckets - 1;
        let workers = self.config.effective_threads().min(n);
        let affinity = self.config.affinity;
        let topo = topology();

        let unit = if self.config.page_aligned_partitions {
            topo.page_elems(mem::size_of::<T>())
        } else {
            1
        };
        let ranges = plan_partitions(workers, n, unit);
        log::debug!(
            "sorting {} elements: {} workers, {} buckets, partitions {:?}",
            n,
            workers,
            buckets,
            ranges
        );

        let mut scratch_values: Vec<T> = try_alloc_zeroed(n)?;
        let mut scratch_keys: Vec<K> = try_alloc_zeroed(n)?;
        let mut slots = allocate_workers(&ranges, buckets)?;
        let mut bases: Vec<usize> = try_alloc_zeroed(buckets)?;
        let pool = build_team(workers)?;
        let mut timing = Timing { timer };

        timing.start(Phase::Binding);
        let outcomes: Vec<BindOutcome> = {
            let page_values = topo.page_elems(mem::size_of::<T>());
            let page_keys = topo.page_elems(mem::size_of::<K>());
            let touch_values = SharedSlice::new(&mut scratch_values[..]);
            let touch_keys = SharedSlice::new(&mut scratch_keys[..]);
            let seed_keys = SharedSlice::new(&mut *keys);

            pool.broadcast(|ctx| {
                let worker = ctx.index();
                let range = ranges[worker].clone();
                let outcome = if affinity.binds() {
                    bind_worker(&affinity, worker, workers, topo)
                } else {
                    BindOutcome::NotRequested
                };
                // SAFETY: partitions are disjoint and each worker writes only its own.
                unsafe {
                    first_touch(affinity.first_touch, &touch_values, range.clone(), page_values);
                    first_touch(affinity.first_touch, &touch_keys, range.clone(), page_keys);
                    for pos in range {
                        seed_keys.write(pos, K::from_index(pos));
                    }
                }
                outcome
            })
        };
        for (slot, outcome) in slots.iter_mut().zip(&outcomes) {
            if let BindOutcome::Bound(placement) = outcome {
                slot.get_mut().numa_node = placement.node;
            }
        }
        let bound_workers = outcomes.iter().filter(|o| o.is_bound()).count();
        let unbound_workers = outcomes.iter().filter(|o| o.is_degraded()).count();
        if unbound_workers > 0 {
            log::warn!(
                "{} of {} workers could not be bound, running them unbound",
                unbound_workers,
                workers
            );
        }
        timing.stop(Phase::Binding);

        timing.start(Phase::BitExtent);
        let extent = {
            let src: &[T] = &*values;
            combine_extents(pool.broadcast(|ctx| bit_or_extent(&src[ranges[ctx.index()].clone()])))
        };
        timing.stop(Phase::BitExtent);

        let mut passes = 0usize;
        let mut shift = 0u32;
        while extent.has_bits_from(shift) {
            let (src_values, src_keys, dst_values, dst_keys): (&[T], &[K], &mut [T], &mut [K]) =
                if passes % 2 == 0 {
                    (&*values, &*keys, &mut scratch_values[..], &mut scratch_keys[..])
                } else {
                    (&scratch_values[..], &scratch_keys[..], &mut *values, &mut *keys)
                };

            timing.start(Phase::Histogram);
            pool.broadcast(|ctx| {
                let mut worker = slots[ctx.index()].lock();
                let range = worker.range.clone();
                count_digits(&src_values[range], shift, mask, &mut worker.bucket_counts);
            });
            timing.accumulate(Phase::Histogram);

            timing.start(Phase::OffsetResolution);
            pool.install(|| {
                global_bucket_bases(&mut slots, &mut bases);
                resolve_offsets(&mut slots, &bases);
            });
            timing.accumulate(Phase::OffsetResolution);

            timing.start(Phase::Scatter);
            {
                let dst_values = SharedSlice::new(dst_values);
                let dst_keys = SharedSlice::new(dst_keys);
                pool.broadcast(|ctx| {
                    let mut guard = slots[ctx.index()].lock();
                    let WorkerPartition {
                        range,
                        bucket_counts,
                        write_cursors,
                        ..
                    } = &mut *guard;
                    let range = range.clone();
                    // SAFETY: the cursors were resolved for this pass, so the
                    // (worker, bucket) ranges tile both destinations.
                    unsafe {
                        scatter_partition(
                            &src_values[range.clone()],
                            &src_keys[range],
                            shift,
                            mask,
                            write_cursors,
                            bucket_counts,
                            &dst_values,
                            &dst_keys,
                        )
                    }
                });
            }
            timing.accumulate(Phase::Scatter);

            log::trace!(
                "pass {} done: bits {}..{}, bases {:?}",
                passes,
                shift,
                shift.saturating_add(digit_bits),
                &bases[..bases.len().min(8)]
            );
            passes += 1;
            shift = shift.saturating_add(digit_bits);
        }
        timing.commit(Phase::Histogram);
        timing.commit(Phase::OffsetResolution);
        timing.commit(Phase::Scatter);

        timing.start(Phase::Finalize);
        if passes > 0 {
            match Residence::after(passes) {
                Residence::Caller => {
                    {
                        let src: &[K] = &*keys;
                        let inverted = SharedSlice::new(&mut scratch_keys[..]);
                        // SAFETY: keys hold a permutation and ranges are disjoint.
                        pool.broadcast(|ctx| unsafe {
                            invert_range(src, ranges[ctx.index()].clone(), &inverted)
                        });
                    }
                    let src: &[K] = &scratch_keys;
                    let dst = SharedSlice::new(&mut *keys);
                    // SAFETY: ranges are disjoint.
                    pool.broadcast(|ctx| unsafe { copy_range(src, ranges[ctx.index()].clone(), &dst) });
                }
                Residence::Scratch => {
                    let src_keys: &[K] = &scratch_keys;
                    let src_values: &[T] = &scratch_values;
                    let inverted = SharedSlice::new(&mut *keys);
                    let dst_values = SharedSlice::new(&mut *values);
                    pool.broadcast(|ctx| {
                        let range = ranges[ctx.index()].clone();
                        // SAFETY: scratch keys hold a permutation and ranges are disjoint.
                        unsafe {
                            invert_range(src_keys, range.clone(), &inverted);
                            copy_range(src_values, range, &dst_values);
                        }
                    });
                }
            }
        }
        timing.stop(Phase::Finalize);

        let elapsed = start_time.elapsed();
        self.stats = SortStats {
            elements: n,
            workers,
            passes,
            digit_bits,
            bound_workers,
            unbound_workers,
            memory_used: scratch_bytes::<T, K>(n, workers, buckets),
            processing_time_us: elapsed.as_micros() as u64,
        };
        log::debug!(
            "sorted {} elements in {} passes with {} workers ({} bound) in {} us",
            n,
            passes,
            workers,
            bound_workers,
            self.stats.processing_time_us
        );

        Ok(())
    }
}

impl Default for RadixSorter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort `values[..n]` with `digit_bits`-bit digits and the default worker
/// count, writing the position map into `keys[..n]`.
pub fn sort<T: RadixKey, K: SortIndex>(
    values: &mut [T],
    keys: &mut [K],
    n: usize,
    digit_bits: u32,
    timer: Option<&mut dyn PhaseTimer>,
) -> Result<()> {
    let config = SortConfig {
        digit_bits,
        ..SortConfig::default()
    };
    RadixSorter::with_config(config).sort(values, keys, n, timer)
}

fn build_team(workers: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pradsort-worker-{}", i))
        .build()
        .map_err(|e| PradsortError::thread_pool(e.to_string()))
}

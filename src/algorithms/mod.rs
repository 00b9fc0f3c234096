//! Sorting engine
//!
//! The engine is split along its phases: partition planning, bit extent and
//! histograms, offset resolution, scatter and finalization. [`RadixSorter`]
//! drives them on a per-call worker team.

pub mod finalize;
pub mod histogram;
pub mod partition;
pub mod prefix_sum;
pub mod radix_key;
pub mod radix_sort;
pub mod scatter;

// Re-export main types
pub use partition::{plan_partitions, WorkerPartition};
pub use radix_key::{RadixKey, SortIndex, WideUint, U128x2, U256};
pub use radix_sort::{sort, RadixSorter, SortStats};

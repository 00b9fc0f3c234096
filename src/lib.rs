//! # Pradsort: Parallel NUMA-Aware Radix Sort
//!
//! A stable LSD radix sort of fixed-width unsigned integers that runs on a
//! fixed team of worker threads and returns, next to the sorted values, a
//! position map for reordering companion data without moving it.
//!
//! ## Key Features
//!
//! - **Stable parallel passes**: a two-level prefix sum gives every worker its
//!   own write range per bucket, so the scatter runs without locks or atomics
//! - **Position map**: `keys[i]` is where the element originally at `i` ended up
//! - **NUMA placement**: optional CPU and node pinning with first touch of the
//!   scratch buffers, degrading to unbound execution when the host refuses
//! - **Wide values**: every primitive unsigned type plus multi-word [`WideUint`]
//! - **Phase timing**: an optional [`PhaseTimer`] sees every phase of a call
//!
//! ## Quick Start
//!
//! ```rust
//! use pradsort::{sort, PhaseTimings};
//!
//! # fn main() -> pradsort::Result<()> {
//! let original = vec![40u64, 10, 30, 10, 20];
//! let mut values = original.clone();
//! let mut keys = vec![0u32; values.len()];
//!
//! let mut timings = PhaseTimings::new();
//! sort(&mut values, &mut keys, original.len(), 8, Some(&mut timings))?;
//!
//! assert_eq!(values, vec![10, 10, 20, 30, 40]);
//! for (i, &k) in keys.iter().enumerate() {
//!     assert_eq!(original[i], values[k as usize]);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod algorithms;
pub mod config;
pub mod error;
pub mod memory;
pub mod system;

// Re-export core types
pub use algorithms::{sort, RadixKey, RadixSorter, SortIndex, SortStats, WideUint, U128x2, U256};
pub use config::{AffinityConfig, Config, FirstTouch, NumaBinding, SortConfig};
pub use error::{PradsortError, Result};
pub use system::{Phase, PhaseTimer, PhaseTimings};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Detect the host topology ahead of the first sort call
pub fn init() {
    let topo = system::topology();
    log::debug!(
        "Initializing pradsort v{}: {} CPUs on {} NUMA nodes, {} byte pages",
        VERSION,
        topo.online_cpus,
        topo.node_count(),
        topo.page_size
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        init();
        assert!(!VERSION.is_empty());

        let mut values = vec![3u32, 1, 2];
        let mut keys = vec![0u32; 3];
        sort(&mut values, &mut keys, 3, 8, None).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_version_info() {
        assert!(VERSION.contains('.'));
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2);
    }
}

//! # System Integration
//!
//! Host topology detection, worker placement and phase timing.
//!
//! - **Topology**: page size, online CPUs and NUMA nodes, detected once per process
//! - **Affinity**: best-effort CPU/NUMA pinning and first touch of scratch pages
//! - **Profiling**: the [`PhaseTimer`] hook and the [`PhaseTimings`] recorder

pub mod affinity;
pub mod profiling;
pub mod topology;

pub use affinity::{bind_worker, first_touch, pin_current_thread, plan_placement, BindOutcome, Placement};
pub use profiling::{Phase, PhaseTimer, PhaseTimings};
pub use topology::{topology, NumaNode, Topology};

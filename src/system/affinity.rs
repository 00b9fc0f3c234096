//! Worker placement
//!
//! Pins the calling worker thread to a CPU and/or NUMA node and first-touches
//! its share of the scratch buffers. Placement is best effort: when the host
//! refuses a binding the worker simply keeps running wherever the scheduler
//! put it.

use crate::config::{AffinityConfig, FirstTouch};
use crate::error::Result;
use crate::memory::SharedSlice;
use crate::system::topology::Topology;
use std::ops::Range;

/// Where one worker should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Kernel id of the chosen NUMA node, when NUMA binding is active
    pub node: Option<usize>,
    /// CPUs the worker may run on
    pub cpus: Vec<usize>,
}

/// Result of binding one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The configuration asks for no binding
    NotRequested,
    /// The worker is pinned
    Bound(Placement),
    /// Binding was requested but could not be applied
    Unbound {
        /// Why the platform refused
        reason: String,
    },
}

impl BindOutcome {
    /// True when the worker ended up pinned
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// True when a requested binding was not applied
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unbound { .. })
    }
}

/// Compute the placement of `worker` in a team of `workers`.
///
/// NUMA positions beyond the host's node count wrap, so a half split on a
/// single-node host lands every worker on node 0. With CPU binding each worker
/// gets one CPU, counted from the start of its node group; without it a
/// NUMA-bound worker may use every CPU of its node.
pub fn plan_placement(
    affinity: &AffinityConfig,
    worker: usize,
    workers: usize,
    topo: &Topology,
) -> Option<Placement> {
    let position = affinity.numa_binding.node_for(worker, workers);

    match (affinity.cpu_binding, position) {
        (false, None) => None,
        (true, None) => {
            let cpus = topo.all_cpus();
            if cpus.is_empty() {
                return None;
            }
            Some(Placement {
                node: None,
                cpus: vec![cpus[worker % cpus.len()]],
            })
        }
        (cpu_binding, Some(position)) => {
            let node = &topo.nodes[position % topo.node_count()];
            if node.cpus.is_empty() {
                return None;
            }
            let cpus = if cpu_binding {
                let rank = if position == 0 {
                    worker
                } else {
                    worker - affinity.numa_binding.split_point(workers).min(worker)
                };
                vec![node.cpus[rank % node.cpus.len()]]
            } else {
                node.cpus.clone()
            };
            Some(Placement {
                node: Some(node.id),
                cpus,
            })
        }
    }
}

/// Bind the calling thread as worker `worker` of `workers`.
pub fn bind_worker(
    affinity: &AffinityConfig,
    worker: usize,
    workers: usize,
    topo: &Topology,
) -> BindOutcome {
    let placement = match plan_placement(affinity, worker, workers, topo) {
        Some(placement) => placement,
        None if affinity.binds() => {
            return BindOutcome::Unbound {
                reason: "no CPUs available for placement".to_string(),
            }
        }
        None => return BindOutcome::NotRequested,
    };

    match pin_current_thread(&placement.cpus) {
        Ok(()) => {
            log::trace!("worker {} pinned to {:?}", worker, placement);
            BindOutcome::Bound(placement)
        }
        Err(e) => {
            log::debug!("worker {} left unbound: {}", worker, e);
            BindOutcome::Unbound {
                reason: e.to_string(),
            }
        }
    }
}

/// Restrict the calling thread to `cpus`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpus: &[usize]) -> Result<()> {
    use crate::error::PradsortError;

    let limit = libc::CPU_SETSIZE as usize;
    if cpus.is_empty() || cpus.iter().any(|&cpu| cpu >= limit) {
        return Err(PradsortError::invalid_input(format!(
            "cpu set {:?} outside 0..{}",
            cpus, limit
        )));
    }

    // SAFETY: cpu_set_t is a plain bitmask, every CPU index was checked against
    // CPU_SETSIZE, and pid 0 names the calling thread.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        for &cpu in cpus {
            libc::CPU_SET(cpu, &mut set);
        }
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().into())
    }
}

/// Restrict the calling thread to `cpus`.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpus: &[usize]) -> Result<()> {
    Err(crate::error::PradsortError::not_supported(
        "thread affinity on this platform",
    ))
}

/// Write zeros into `range` of `buffer` according to `policy`, returning the
/// number of elements written.
///
/// `EveryPage` writes the first element of each `page_elems`-sized run.
///
/// # Safety
///
/// `range` lies inside the buffer and belongs to the calling worker alone for
/// the duration of the phase.
pub unsafe fn first_touch<T: Copy + Default>(
    policy: FirstTouch,
    buffer: &SharedSlice<'_, T>,
    range: Range<usize>,
    page_elems: usize,
) -> usize {
    let step = match policy {
        FirstTouch::None => return 0,
        FirstTouch::EveryElement => 1,
        FirstTouch::EveryPage => page_elems.max(1),
    };

    let mut touched = 0;
    for index in range.step_by(step) {
        // SAFETY: the range is exclusive to this worker per the caller contract.
        unsafe { buffer.write(index, T::default()) };
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NumaBinding;
    use crate::system::topology::NumaNode;

    fn two_node_topology() -> Topology {
        Topology {
            page_size: 4096,
            online_cpus: 8,
            nodes: vec![
                NumaNode {
                    id: 0,
                    cpus: vec![0, 1, 2, 3],
                },
                NumaNode {
                    id: 1,
                    cpus: vec![4, 5, 6, 7],
                },
            ],
        }
    }

    fn affinity(cpu_binding: bool, numa_binding: NumaBinding) -> AffinityConfig {
        AffinityConfig {
            cpu_binding,
            numa_binding,
            first_touch: FirstTouch::None,
        }
    }

    #[test]
    fn test_no_binding_requested() {
        let topo = two_node_topology();
        let config = AffinityConfig::default();
        assert_eq!(plan_placement(&config, 0, 4, &topo), None);
        assert_eq!(bind_worker(&config, 0, 4, &topo), BindOutcome::NotRequested);
    }

    #[test]
    fn test_cpu_binding_round_robin() {
        let topo = two_node_topology();
        let config = affinity(true, NumaBinding::None);
        let cpus: Vec<usize> = (0..10)
            .map(|w| plan_placement(&config, w, 10, &topo).unwrap().cpus[0])
            .collect();
        assert_eq!(cpus, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
    }

    #[test]
    fn test_half_split_with_cpu_binding() {
        let topo = two_node_topology();
        let config = affinity(true, NumaBinding::HalfSplit);

        let placements: Vec<Placement> = (0..4)
            .map(|w| plan_placement(&config, w, 4, &topo).unwrap())
            .collect();
        assert_eq!(placements[0].node, Some(0));
        assert_eq!(placements[0].cpus, vec![0]);
        assert_eq!(placements[1].cpus, vec![1]);
        assert_eq!(placements[2].node, Some(1));
        assert_eq!(placements[2].cpus, vec![4]);
        assert_eq!(placements[3].cpus, vec![5]);
    }

    #[test]
    fn test_threshold_node_only() {
        let topo = two_node_topology();
        let config = affinity(false, NumaBinding::Threshold(3));

        let low = plan_placement(&config, 2, 8, &topo).unwrap();
        assert_eq!(low.node, Some(0));
        assert_eq!(low.cpus, vec![0, 1, 2, 3]);

        let high = plan_placement(&config, 3, 8, &topo).unwrap();
        assert_eq!(high.node, Some(1));
        assert_eq!(high.cpus, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_single_node_wraps() {
        let topo = Topology::uniform(2);
        let config = affinity(true, NumaBinding::HalfSplit);

        // A one-worker half split asks for node 1
        let placement = plan_placement(&config, 0, 1, &topo).unwrap();
        assert_eq!(placement.node, Some(0));
        assert_eq!(placement.cpus, vec![0]);

        let placement = plan_placement(&config, 3, 4, &topo).unwrap();
        assert_eq!(placement.cpus, vec![1]);
    }

    #[test]
    fn test_bind_worker_never_fails() {
        let topo = crate::system::topology::topology().clone();
        let config = affinity(true, NumaBinding::HalfSplit);

        let outcome = std::thread::spawn(move || bind_worker(&config, 0, 2, &topo))
            .join()
            .unwrap();
        assert!(outcome.is_bound() || outcome.is_degraded());
    }

    #[test]
    fn test_pin_rejects_empty_set() {
        assert!(pin_current_thread(&[]).is_err());
    }

    #[test]
    fn test_first_touch_policies() {
        let mut buffer = vec![7u64; 100];
        let shared = SharedSlice::new(&mut buffer);

        assert_eq!(unsafe { first_touch(FirstTouch::None, &shared, 0..100, 16) }, 0);
        assert_eq!(unsafe { first_touch(FirstTouch::EveryPage, &shared, 10..50, 16) }, 3);
        assert_eq!(unsafe { first_touch(FirstTouch::EveryElement, &shared, 90..100, 16) }, 10);
        drop(shared);

        assert_eq!(buffer[9], 7);
        assert_eq!(buffer[10], 0);
        assert_eq!(buffer[11], 7);
        assert_eq!(buffer[26], 0);
        assert_eq!(buffer[42], 0);
        assert_eq!(buffer[58], 7);
        assert!(buffer[90..].iter().all(|&v| v == 0));
    }
}

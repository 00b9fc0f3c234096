//! # Host Topology Detection
//!
//! Page size, online CPU count and NUMA node layout, detected once per
//! process. On Linux the node layout comes from sysfs; everywhere else (or
//! when sysfs is unreadable) the host is reported as a single node owning all
//! online CPUs.

use std::sync::OnceLock;

/// Fallback page size when the platform cannot report one
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// One NUMA node and the logical CPUs attached to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumaNode {
    /// Node id as numbered by the kernel
    pub id: usize,
    /// Logical CPUs on this node, ascending
    pub cpus: Vec<usize>,
}

/// Host topology relevant to worker placement
#[derive(Debug, Clone)]
pub struct Topology {
    /// Page size in bytes
    pub page_size: usize,
    /// Number of online logical CPUs
    pub online_cpus: usize,
    /// NUMA nodes, ascending by id; never empty
    pub nodes: Vec<NumaNode>,
}

impl Topology {
    /// Detect the topology of the running host
    pub fn detect() -> Self {
        let page_size = detect_page_size();
        let online_cpus = detect_online_cpus();
        let nodes = detect_numa_nodes()
            .filter(|nodes| !nodes.is_empty())
            .unwrap_or_else(|| vec![NumaNode {
                id: 0,
                cpus: (0..online_cpus).collect(),
            }]);

        Self {
            page_size,
            online_cpus,
            nodes,
        }
    }

    /// Single-node topology with `cpus` logical CPUs
    pub fn uniform(cpus: usize) -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            online_cpus: cpus,
            nodes: vec![NumaNode {
                id: 0,
                cpus: (0..cpus).collect(),
            }],
        }
    }

    /// Number of NUMA nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// CPUs of the node at position `node` (wrapping past the last node)
    pub fn cpus_of(&self, node: usize) -> &[usize] {
        &self.nodes[node % self.nodes.len()].cpus
    }

    /// Every CPU hosted by some node, ascending
    pub fn all_cpus(&self) -> Vec<usize> {
        let mut cpus: Vec<usize> = self.nodes.iter().flat_map(|n| n.cpus.iter().copied()).collect();
        cpus.sort_unstable();
        cpus.dedup();
        cpus
    }

    /// Page size expressed in elements of `elem_size` bytes, at least 1
    pub fn page_elems(&self, elem_size: usize) -> usize {
        (self.page_size / elem_size.max(1)).max(1)
    }
}

/// Topology of this process, detected on first use
pub fn topology() -> &'static Topology {
    static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
    TOPOLOGY.get_or_init(Topology::detect)
}

/// Parse a kernel CPU/node list such as `0-3,8,10-11`
pub fn parse_cpu_list(list: &str) -> Vec<usize> {
    let mut ids = Vec::new();
    for part in list.trim().split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((lo, hi)) => {
                if let (Ok(lo), Ok(hi)) = (lo.trim().parse::<usize>(), hi.trim().parse::<usize>()) {
                    ids.extend(lo..=hi);
                }
            }
            None => {
                if let Ok(id) = part.parse::<usize>() {
                    ids.push(id);
                }
            }
        }
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn detect_page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as usize;
        }
    }
    DEFAULT_PAGE_SIZE
}

fn detect_online_cpus() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions.
        let cpus = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if cpus > 0 {
            return cpus as usize;
        }
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(target_os = "linux")]
fn detect_numa_nodes() -> Option<Vec<NumaNode>> {
    let online = std::fs::read_to_string("/sys/devices/system/node/online").ok()?;
    let mut nodes = Vec::new();
    for id in parse_cpu_list(&online) {
        let path = format!("/sys/devices/system/node/node{}/cpulist", id);
        let cpus = std::fs::read_to_string(&path)
            .map(|list| parse_cpu_list(&list))
            .unwrap_or_default();
        // Memory-only nodes cannot host workers
        if !cpus.is_empty() {
            nodes.push(NumaNode { id, cpus });
        }
    }
    Some(nodes)
}

#[cfg(not(target_os = "linux"))]
fn detect_numa_nodes() -> Option<Vec<NumaNode>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_list() {
        assert_eq!(parse_cpu_list("0-3,8,10-11\n"), vec![0, 1, 2, 3, 8, 10, 11]);
        assert_eq!(parse_cpu_list("5"), vec![5]);
        assert_eq!(parse_cpu_list(""), Vec::<usize>::new());
        assert_eq!(parse_cpu_list("2,1,1"), vec![1, 2]);
        assert_eq!(parse_cpu_list("x,3"), vec![3]);
    }

    #[test]
    fn test_detect_is_sane() {
        let topo = topology();
        assert!(topo.page_size >= 512);
        assert!(topo.online_cpus >= 1);
        assert!(topo.node_count() >= 1);
        assert!(!topo.cpus_of(0).is_empty());
    }

    #[test]
    fn test_page_elems() {
        let topo = Topology::uniform(4);
        assert_eq!(topo.page_elems(8), DEFAULT_PAGE_SIZE / 8);
        assert_eq!(topo.page_elems(1 << 20), 1);
        assert_eq!(topo.page_elems(0), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_cpus_of_wraps() {
        let topo = Topology::uniform(2);
        assert_eq!(topo.cpus_of(0), &[0, 1]);
        assert_eq!(topo.cpus_of(1), &[0, 1]);
        assert_eq!(topo.all_cpus(), vec![0, 1]);
    }
}

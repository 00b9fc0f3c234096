//! Sort call configuration.
//!
//! Binding and first-touch policy are runtime values here, chosen per call
//! instead of per build.

use super::{parse_env_bool, parse_env_var, Config, ValidationError};
use crate::error::{PradsortError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Smallest accepted digit width
pub const MIN_DIGIT_BITS: u32 = 1;

/// Largest accepted digit width (65536 buckets per worker)
pub const MAX_DIGIT_BITS: u32 = 16;

/// How workers are spread over NUMA nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumaBinding {
    /// Workers run wherever the scheduler puts them
    None,
    /// First half of the workers on node 0, second half on node 1
    HalfSplit,
    /// Workers below the given index on node 0, the rest on node 1
    Threshold(usize),
}

impl Default for NumaBinding {
    fn default() -> Self {
        Self::None
    }
}

impl NumaBinding {
    /// Node position for `worker` in a team of `workers`, if binding is active.
    pub fn node_for(&self, worker: usize, workers: usize) -> Option<usize> {
        match *self {
            Self::None => None,
            Self::HalfSplit => Some(if worker < workers / 2 { 0 } else { 1 }),
            Self::Threshold(threshold) => Some(if worker < threshold { 0 } else { 1 }),
        }
    }

    /// First worker index placed on node 1
    pub fn split_point(&self, workers: usize) -> usize {
        match *self {
            Self::None => workers,
            Self::HalfSplit => workers / 2,
            Self::Threshold(threshold) => threshold.min(workers),
        }
    }
}

impl fmt::Display for NumaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::HalfSplit => write!(f, "half"),
            Self::Threshold(k) => write!(f, "threshold:{}", k),
        }
    }
}

impl FromStr for NumaBinding {
    type Err = PradsortError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "none" | "off" | "0" => Ok(Self::None),
            "half" | "half_split" | "1" => Ok(Self::HalfSplit),
            _ => s
                .strip_prefix("threshold:")
                .and_then(|k| k.trim().parse().ok())
                .map(Self::Threshold)
                .ok_or_else(|| PradsortError::configuration(format!("unknown NUMA binding '{}'", s))),
        }
    }
}

/// Which elements of its scratch partition a worker writes before sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstTouch {
    /// No first touch
    None,
    /// Write every element
    EveryElement,
    /// Write one element per page
    EveryPage,
}

impl Default for FirstTouch {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for FirstTouch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::EveryElement => write!(f, "element"),
            Self::EveryPage => write!(f, "page"),
        }
    }
}

impl FromStr for FirstTouch {
    type Err = PradsortError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "0" => Ok(Self::None),
            "element" | "every_element" | "1" => Ok(Self::EveryElement),
            "page" | "every_page" | "2" => Ok(Self::EveryPage),
            other => Err(PradsortError::configuration(format!("unknown first-touch policy '{}'", other))),
        }
    }
}

/// Worker placement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// Pin each worker to one logical CPU
    pub cpu_binding: bool,
    /// NUMA node assignment
    pub numa_binding: NumaBinding,
    /// Scratch buffer first-touch policy
    pub first_touch: FirstTouch,
}

impl AffinityConfig {
    /// True when any binding is requested
    pub fn binds(&self) -> bool {
        self.cpu_binding || self.numa_binding != NumaBinding::None
    }
}

/// Configuration for one sort call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Bits consumed per pass; the bucket count is `2^digit_bits`
    pub digit_bits: u32,
    /// Worker count, 0 for the ambient rayon thread count
    pub num_threads: usize,
    /// Size partitions in whole pages, remainder to the last worker
    pub page_aligned_partitions: bool,
    /// CPU / NUMA placement
    pub affinity: AffinityConfig,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            digit_bits: 8,
            num_threads: 0,
            page_aligned_partitions: false,
            affinity: AffinityConfig::default(),
        }
    }
}

impl SortConfig {
    /// Create a new sort configuration builder.
    pub fn builder() -> SortConfigBuilder {
        SortConfigBuilder::new()
    }

    /// Number of buckets per pass
    pub fn bucket_count(&self) -> usize {
        1usize << self.digit_bits
    }

    /// Worker count with 0 resolved to the ambient rayon thread count
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            rayon::current_num_threads().max(1)
        } else {
            self.num_threads
        }
    }
}

/// Validate a digit width before any work begins.
pub fn check_digit_bits(digit_bits: u32) -> Result<()> {
    if (MIN_DIGIT_BITS..=MAX_DIGIT_BITS).contains(&digit_bits) {
        Ok(())
    } else {
        Err(PradsortError::invalid_input(format!(
            "digit bits {} outside {}..={}",
            digit_bits, MIN_DIGIT_BITS, MAX_DIGIT_BITS
        )))
    }
}

impl Config for SortConfig {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(MIN_DIGIT_BITS..=MAX_DIGIT_BITS).contains(&self.digit_bits) {
            errors.push(
                ValidationError::new(
                    "digit_bits",
                    &self.digit_bits.to_string(),
                    "digit width must be between 1 and 16 bits",
                )
                .with_suggestion("typical values: 8, 11, 16"),
            );
        }

        if self.affinity.numa_binding == NumaBinding::Threshold(0) {
            errors.push(
                ValidationError::new(
                    "affinity.numa_binding",
                    &self.affinity.numa_binding.to_string(),
                    "threshold must leave at least one worker on node 0",
                )
                .with_suggestion("threshold:8, or half"),
            );
        }

        if !errors.is_empty() {
            return Err(PradsortError::configuration(format!(
                "Sort configuration validation failed: {}",
                errors
                    .into_iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )));
        }

        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();

        config.digit_bits = parse_env_var(&format!("{}DIGIT_BITS", prefix), config.digit_bits);
        config.num_threads = parse_env_var(&format!("{}NUM_THREADS", prefix), config.num_threads);
        config.page_aligned_partitions = parse_env_bool(
            &format!("{}PAGE_ALIGNED", prefix),
            config.page_aligned_partitions,
        );

        config.affinity.cpu_binding =
            parse_env_bool(&format!("{}CPU_BINDING", prefix), config.affinity.cpu_binding);
        config.affinity.numa_binding =
            parse_env_var(&format!("{}NUMA_BINDING", prefix), config.affinity.numa_binding);
        config.affinity.first_touch =
            parse_env_var(&format!("{}FIRST_TOUCH", prefix), config.affinity.first_touch);

        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            digit_bits: 8,
            num_threads: 0,
            page_aligned_partitions: true,
            affinity: AffinityConfig {
                cpu_binding: true,
                numa_binding: NumaBinding::HalfSplit,
                first_touch: FirstTouch::EveryPage,
            },
        }
    }

    fn memory_preset() -> Self {
        Self {
            digit_bits: 4,
            ..Self::default()
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| PradsortError::configuration(format!("Failed to serialize sort config: {}", e)))?;

        std::fs::write(path, serialized)
            .map_err(|e| PradsortError::configuration(format!("Failed to write sort config file: {}", e)))?;

        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PradsortError::configuration(format!("Failed to read sort config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| PradsortError::configuration(format!("Failed to parse sort config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }
}

/// Builder for constructing sort configurations.
#[derive(Debug, Clone)]
pub struct SortConfigBuilder {
    config: SortConfig,
}

impl SortConfigBuilder {
    /// Create a new builder starting from the defaults.
    pub fn new() -> Self {
        Self {
            config: SortConfig::default(),
        }
    }

    /// Set the digit width.
    pub fn digit_bits(mut self, bits: u32) -> Self {
        self.config.digit_bits = bits;
        self
    }

    /// Set the worker count (0 = ambient rayon thread count).
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Size partitions in whole pages.
    pub fn page_aligned_partitions(mut self, enabled: bool) -> Self {
        self.config.page_aligned_partitions = enabled;
        self
    }

    /// Pin workers to CPUs.
    pub fn cpu_binding(mut self, enabled: bool) -> Self {
        self.config.affinity.cpu_binding = enabled;
        self
    }

    /// Set the NUMA binding mode.
    pub fn numa_binding(mut self, binding: NumaBinding) -> Self {
        self.config.affinity.numa_binding = binding;
        self
    }

    /// Set the first-touch policy.
    pub fn first_touch(mut self, policy: FirstTouch) -> Self {
        self.config.affinity.first_touch = policy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<SortConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SortConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

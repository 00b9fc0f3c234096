//! # Phase Timing
//!
//! The sorter reports its phases to an optional [`PhaseTimer`] supplied by the
//! caller. Timing is purely observational: a timer never changes what the sort
//! produces. [`PhaseTimings`] is the stock recorder, built on
//! [`std::time::Instant`].
//!
//! A phase is either measured once (`start` then `stop`) or summed over the
//! pass loop (`start` then `accumulate` once per pass, then a single `commit`).

use std::fmt;
use std::time::{Duration, Instant};

/// Phases of one sort call, numbered by timer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Worker pinning and first touch
    Binding = 0,
    /// OR-reduction over all values
    BitExtent = 1,
    /// Per-worker digit counting
    Histogram = 2,
    /// Two-level prefix sum
    OffsetResolution = 3,
    /// Lock-free scatter
    Scatter = 4,
    /// Key inversion and copy-back
    Finalize = 5,
}

impl Phase {
    /// Number of phases
    pub const COUNT: usize = 6;

    /// Every phase in slot order
    pub const ALL: [Phase; Phase::COUNT] = [
        Phase::Binding,
        Phase::BitExtent,
        Phase::Histogram,
        Phase::OffsetResolution,
        Phase::Scatter,
        Phase::Finalize,
    ];

    /// Timer slot of this phase
    pub fn id(self) -> usize {
        self as usize
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Phase::Binding => "binding",
            Phase::BitExtent => "bit_extent",
            Phase::Histogram => "histogram",
            Phase::OffsetResolution => "offset_resolution",
            Phase::Scatter => "scatter",
            Phase::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of phase timing events.
pub trait PhaseTimer {
    /// Mark the beginning of `phase`
    fn start(&mut self, phase: Phase);

    /// End `phase` and record one sample
    fn stop(&mut self, phase: Phase);

    /// End `phase` and add the interval to its running sum
    fn accumulate(&mut self, phase: Phase);

    /// Record the running sum of `phase` as one sample and reset it
    fn commit(&mut self, phase: Phase);
}

#[derive(Debug, Clone, Default)]
struct Slot {
    started: Option<Instant>,
    running: Duration,
    samples: Vec<Duration>,
}

impl Slot {
    fn take_interval(&mut self) -> Option<Duration> {
        self.started.take().map(|t| t.elapsed())
    }
}

/// Recorder keeping every sample per phase
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    slots: [Slot; Phase::COUNT],
}

impl PhaseTimings {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples recorded for `phase`, oldest first
    pub fn samples(&self, phase: Phase) -> &[Duration] {
        &self.slots[phase.id()].samples
    }

    /// Most recent sample of `phase`
    pub fn last(&self, phase: Phase) -> Option<Duration> {
        self.slots[phase.id()].samples.last().copied()
    }

    /// Sum of all samples of `phase`
    pub fn total(&self, phase: Phase) -> Duration {
        self.slots[phase.id()].samples.iter().sum()
    }

    /// Sum of all samples of every phase
    pub fn grand_total(&self) -> Duration {
        Phase::ALL.iter().map(|&p| self.total(p)).sum()
    }

    /// Drop every sample and pending interval
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PhaseTimer for PhaseTimings {
    fn start(&mut self, phase: Phase) {
        self.slots[phase.id()].started = Some(Instant::now());
    }

    fn stop(&mut self, phase: Phase) {
        let slot = &mut self.slots[phase.id()];
        if let Some(elapsed) = slot.take_interval() {
            slot.samples.push(elapsed);
        }
    }

    fn accumulate(&mut self, phase: Phase) {
        let slot = &mut self.slots[phase.id()];
        if let Some(elapsed) = slot.take_interval() {
            slot.running += elapsed;
        }
    }

    fn commit(&mut self, phase: Phase) {
        let slot = &mut self.slots[phase.id()];
        slot.samples.push(std::mem::take(&mut slot.running));
    }
}

impl fmt::Display for PhaseTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}={}",
                phase,
                format_duration_auto(self.total(*phase).as_nanos() as u64)
            )?;
        }
        Ok(())
    }
}

/// Format duration with automatic unit selection
pub fn format_duration_auto(nanos: u64) -> String {
    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}μs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

//! Calibration outcome
//!
//! The search itself reports nothing back on a poor result. The report
//! exposes the final deviation and every probe taken so a caller can spot a
//! low-confidence calibration without changing control flow.

use heapless::Vec;

use crate::target::FrameTarget;
use crate::tuning::{TuningValue, NEIGHBORHOOD};

/// Binary search steps: 128, 64, 32, 16, 8, 4, 2, 1
pub const COARSE_STEPS: usize = 8;

/// Upper bound on frame measurements per calibration
pub const MAX_PROBES: usize = COARSE_STEPS + NEIGHBORHOOD;

/// Phase of the search a probe belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Coarse,
    Refine,
}

/// One tuning write and the frame reading that followed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Probe {
    pub phase: Phase,
    pub tuning: TuningValue,
    pub reading: i32,
}

/// Ordered record of probes
pub type ProbeLog = Vec<Probe, MAX_PROBES>;

/// Binary search result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoarseResult {
    /// Largest tuning value found to read below the target (+/- 1)
    pub trial: TuningValue,
    /// Last reading of the search, taken at `trial` or `trial + 1`
    ///
    /// `None` when a tuning ceiling kept every step from being probed.
    pub residual: Option<i32>,
}

/// Final calibration result
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// Value committed to the trim register
    pub tuning: TuningValue,
    /// Distance of its reading from the target, in ticks
    pub deviation: u32,
    pub target: FrameTarget,
    pub coarse: CoarseResult,
    pub probes: ProbeLog,
}

impl CalibrationReport {
    /// Deviation is inside the 1 % USB timing tolerance
    pub fn within_tolerance(&self) -> bool {
        self.deviation <= self.target.tolerance()
    }

    /// Number of frames measured
    pub fn measurement_count(&self) -> usize {
        self.probes.len()
    }

    /// Probes taken during one phase, in order
    pub fn probes_in(&self, phase: Phase) -> impl Iterator<Item = &Probe> + '_ {
        self.probes.iter().filter(move |p| p.phase == phase)
    }
}

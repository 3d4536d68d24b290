//! Calibration configuration structures

use crate::error::ConfigError;
use crate::target::FrameTarget;

/// Clock rates the USB bit-banging driver has timing code for (Hz)
pub const SUPPORTED_CLOCK_HZ: [u32; 7] = [
    12_000_000, 12_800_000, 15_000_000, 16_000_000, 16_500_000, 18_000_000, 20_000_000,
];

/// CPU clock handling at calibration entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupClock {
    /// Leave the prescaler alone
    #[default]
    Unchanged,
    /// Switch the prescaler to divide-by-1 before the search
    ///
    /// For low-voltage boards that boot with a divided clock. A USB reset
    /// implies bus power, so full speed is safe from here on.
    FullSpeed,
}

/// Handling of refinement candidates past the ends of the register range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolicy {
    /// Clamp to the edge value. Keeps the measurement count fixed at 11.
    #[default]
    Clamp,
    /// Drop the candidate without measuring it
    Skip,
}

/// Where the target frame length comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetSource {
    /// Nominal CPU clock in Hz, checked against [`SUPPORTED_CLOCK_HZ`]
    ClockHz(u32),
    /// Frame length given directly, not checked
    Raw(FrameTarget),
}

/// Oscillator calibration configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// Source of the target frame length
    pub target: TargetSource,
    /// Prescaler handling at entry
    pub startup: StartupClock,
    /// Out-of-range neighbor handling
    pub edge: EdgePolicy,
    /// Highest tuning value the search may write
    ///
    /// The binary search probes values up to 192 even when the optimum is
    /// far below. Low-voltage designs that must not exceed a maximum CPU
    /// clock set a ceiling here.
    pub tuning_ceiling: Option<u8>,
}

impl CalibrationConfig {
    /// Configuration with a fixed target and default policies
    pub const fn for_target(target: FrameTarget) -> Self {
        Self {
            target: TargetSource::Raw(target),
            startup: StartupClock::Unchanged,
            edge: EdgePolicy::Clamp,
            tuning_ceiling: None,
        }
    }

    /// Configuration for a nominal clock rate with default policies
    pub const fn for_clock_hz(hz: u32) -> Self {
        Self {
            target: TargetSource::ClockHz(hz),
            ..Self::for_target(FrameTarget::from_raw(0))
        }
    }

    /// Check the configuration and derive the target frame length
    pub fn validate(&self) -> Result<FrameTarget, ConfigError> {
        match self.target {
            TargetSource::Raw(target) => Ok(target),
            TargetSource::ClockHz(0) => Err(ConfigError::ZeroClockRate),
            TargetSource::ClockHz(hz) if SUPPORTED_CLOCK_HZ.contains(&hz) => {
                Ok(FrameTarget::from_clock_hz(hz))
            }
            TargetSource::ClockHz(hz) => Err(ConfigError::UnsupportedClockRate(hz)),
        }
    }

    /// Highest tuning value the search may write
    pub fn max_tuning(&self) -> u8 {
        self.tuning_ceiling.unwrap_or(u8::MAX)
    }
}

impl Default for CalibrationConfig {
    /// 16.5 MHz, the only rate that runs without a crystal
    fn default() -> Self {
        Self::for_clock_hz(16_500_000)
    }
}

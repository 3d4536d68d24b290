//! Configuration error types
//!
//! Calibration itself has no failure path: it always commits the least-bad
//! tuning value it found. Only an invalid configuration is reported.

/// Rejected calibration configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Clock rate of 0 Hz
    ZeroClockRate,
    /// Clock rate the USB driver has no bit timing for (Hz)
    UnsupportedClockRate(u32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroClockRate => write!(f, "Clock rate is zero"),
            Self::UnsupportedClockRate(hz) => write!(f, "Unsupported clock rate: {} Hz", hz),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for ConfigError {}

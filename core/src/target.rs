//! Expected frame length at the nominal clock
//!
//! The frame meter counts a fixed number of CPU cycles per tick, so a 1 ms
//! USB frame reads as `1499 * f_cpu / 10.5 MHz` ticks when the oscillator
//! runs exactly at `f_cpu`.

/// Frame length numerator
const FRAME_TICKS_NUM: u64 = 1499;

/// Clock rate at which one frame reads as `FRAME_TICKS_NUM` ticks
const FRAME_TICKS_DEN_HZ: u64 = 10_500_000;

/// Expected frame meter reading at the nominal clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameTarget(i32);

impl FrameTarget {
    /// Derive the target from the nominal CPU clock
    ///
    /// Integer form of `round(1499 * hz / 10_500_000)`, rounding halves up.
    /// Computed in u64, so every `u32` clock rate fits.
    pub const fn from_clock_hz(hz: u32) -> Self {
        let scaled = FRAME_TICKS_NUM * hz as u64;
        let ticks = (scaled + FRAME_TICKS_DEN_HZ / 2) / FRAME_TICKS_DEN_HZ;
        // Max is 1499 * u32::MAX / 10.5e6, roughly 613k ticks
        Self(ticks as i32)
    }

    /// Use a reading directly as the target
    pub const fn from_raw(ticks: i32) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> i32 {
        self.0
    }

    /// Absolute distance of a reading from the target
    pub const fn deviation(self, reading: i32) -> u32 {
        reading.abs_diff(self.0)
    }

    /// Largest deviation still inside the 1 % USB timing tolerance
    ///
    /// The crystal-less 16.5 MHz USB driver tolerates +/- 1 % of nominal.
    pub const fn tolerance(self) -> u32 {
        self.0.unsigned_abs() / 100
    }
}

//! Oscillator trim value and refinement neighborhood

use heapless::Vec;

use crate::config::EdgePolicy;

/// Number of candidates the refinement phase compares
pub const NEIGHBORHOOD: usize = 3;

/// 8-bit oscillator trim value
///
/// Steps never wrap. Moving past either end of the allowed range either
/// saturates at the edge or yields nothing, see [`EdgePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TuningValue(u8);

impl TuningValue {
    pub const MIN: Self = Self(u8::MIN);
    pub const MAX: Self = Self(u8::MAX);

    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Move by `delta`, clamping to `[MIN, max]`
    pub fn saturating_step(self, delta: i8, max: Self) -> Self {
        let moved = self.0.saturating_add_signed(delta);
        Self(moved.min(max.0))
    }

    /// Move by `delta`, or `None` when the result leaves `[MIN, max]`
    pub fn checked_step(self, delta: i8, max: Self) -> Option<Self> {
        self.0
            .checked_add_signed(delta)
            .filter(|&moved| moved <= max.0)
            .map(Self)
    }

    /// Apply `delta` under the given edge policy
    pub fn step(self, delta: i8, max: Self, policy: EdgePolicy) -> Option<Self> {
        match policy {
            EdgePolicy::Clamp => Some(self.saturating_step(delta, max)),
            EdgePolicy::Skip => self.checked_step(delta, max),
        }
    }
}

impl From<u8> for TuningValue {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<TuningValue> for u8 {
    fn from(value: TuningValue) -> Self {
        value.0
    }
}

/// Refinement candidates around `center`, ascending
///
/// `Clamp` always yields three entries, repeating the edge value when
/// `center` sits on it. `Skip` yields only the in-range ones.
pub fn neighborhood(
    center: TuningValue,
    max: TuningValue,
    policy: EdgePolicy,
) -> Vec<TuningValue, NEIGHBORHOOD> {
    let mut candidates = Vec::new();
    for delta in [-1i8, 0, 1] {
        if let Some(candidate) = center.step(delta, max, policy) {
            // At most one push per delta, capacity is exact
            let _ = candidates.push(candidate);
        }
    }
    candidates
}

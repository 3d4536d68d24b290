//! RC oscillator calibration against USB Start-of-Frame timing
//!
//! Right after a USB bus reset the host sends a Start-of-Frame every 1 ms.
//! The frame meter counts CPU ticks across one frame, which makes it a
//! frequency sensor for the internal oscillator. The search runs in two
//! phases:
//!
//! 1. **Coarse**: binary search over the 8-bit trim register, 8 probes.
//!    Leaves the trim within +/- 1 of the optimum.
//! 2. **Refine**: measure the three neighbors of the coarse result and keep
//!    the one closest to the target. Absorbs noise and non-monotonic
//!    behavior near the optimum.
//!
//! Every probe writes the trim register and then measures; no reading is
//! taken without a preceding write. The routine runs to completion with a
//! fixed number of probes (11 with default settings) and always commits a
//! value, however poor.
//!
//! # Usage
//!
//! ```ignore
//! use osccal_core::{calibrate_oscillator, CalibrationConfig};
//! use osccal_hal::NoPrescaler;
//!
//! // From the USB reset hook, before any further USB traffic:
//! let report = calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default())?;
//! if !report.within_tolerance() {
//!     // Enumeration will likely fail at this deviation
//! }
//! ```

use osccal_hal::{ClockPrescaler, FrameMeter, TuningRegister};

use crate::config::{CalibrationConfig, EdgePolicy, StartupClock};
use crate::error::ConfigError;
use crate::report::{CalibrationReport, CoarseResult, Phase, Probe, ProbeLog};
use crate::target::FrameTarget;
use crate::tuning::{neighborhood, TuningValue};

/// First binary search step, half the register range
const FIRST_STEP: u8 = 128;

/// Two-phase oscillator calibrator
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibrator {
    target: FrameTarget,
    startup: StartupClock,
    edge: EdgePolicy,
    max_tuning: TuningValue,
}

impl Calibrator {
    /// Create a calibrator from a validated configuration
    pub fn new(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        let target = config.validate()?;
        Ok(Self {
            target,
            startup: config.startup,
            edge: config.edge,
            max_tuning: TuningValue::new(config.max_tuning()),
        })
    }

    /// Calibrator for a fixed target with default policies
    pub const fn with_target(target: FrameTarget) -> Self {
        Self {
            target,
            startup: StartupClock::Unchanged,
            edge: EdgePolicy::Clamp,
            max_tuning: TuningValue::MAX,
        }
    }

    pub fn target(&self) -> FrameTarget {
        self.target
    }

    /// Run both phases and commit the result to the trim register
    ///
    /// Applies the startup clock policy first. Returns the committed value
    /// together with its deviation and the full probe log.
    pub fn calibrate<O, P>(&self, osc: &mut O, prescaler: &mut P) -> CalibrationReport
    where
        O: TuningRegister + FrameMeter + ?Sized,
        P: ClockPrescaler + ?Sized,
    {
        if self.startup == StartupClock::FullSpeed {
            debug!("switching CPU clock to full speed");
            prescaler.set_full_speed();
        }

        info!("calibrating oscillator, target {} ticks", self.target.ticks());

        let mut log = ProbeLog::new();
        let coarse = self.coarse_phase(osc, &mut log);
        self.refine_phase(osc, coarse, log)
    }

    /// Phase 1 only: binary search for the bracketing trim value
    ///
    /// Leaves the register at whatever the last probe wrote.
    pub fn coarse_search<O>(&self, osc: &mut O) -> CoarseResult
    where
        O: TuningRegister + FrameMeter + ?Sized,
    {
        self.coarse_phase(osc, &mut ProbeLog::new())
    }

    /// Phase 2 only: neighborhood search around a coarse result
    ///
    /// Commits the chosen value. The report holds only the refinement probes.
    /// A coarse result above the tuning ceiling is pulled down to it first.
    pub fn refine<O>(&self, osc: &mut O, coarse: CoarseResult) -> CalibrationReport
    where
        O: TuningRegister + FrameMeter + ?Sized,
    {
        self.refine_phase(osc, coarse, ProbeLog::new())
    }

    fn coarse_phase<O>(&self, osc: &mut O, log: &mut ProbeLog) -> CoarseResult
    where
        O: TuningRegister + FrameMeter + ?Sized,
    {
        let mut trial: u8 = 0;
        let mut step = FIRST_STEP;
        let mut residual = None;

        while step > 0 {
            // All set bits of `trial` lie above `step`, so this cannot overflow
            let candidate = TuningValue::new(trial + step);

            if candidate <= self.max_tuning {
                let reading = probe(osc, candidate, Phase::Coarse, log);
                trace!("coarse: tuning {} reads {}", candidate.get(), reading);
                residual = Some(reading);

                // Frequency still too low
                if reading < self.target.ticks() {
                    trial = candidate.get();
                }
            } else {
                trace!("coarse: tuning {} above ceiling", candidate.get());
            }

            step >>= 1;
        }

        let coarse = CoarseResult {
            trial: TuningValue::new(trial),
            residual,
        };
        debug!("coarse search settled on {}", trial);
        coarse
    }

    fn refine_phase<O>(
        &self,
        osc: &mut O,
        coarse: CoarseResult,
        mut log: ProbeLog,
    ) -> CalibrationReport
    where
        O: TuningRegister + FrameMeter + ?Sized,
    {
        // Loose bound from the last coarse reading. Any sane neighbor beats it.
        let mut best_deviation = match coarse.residual {
            Some(reading) => u32::try_from(reading).unwrap_or(0),
            None => u32::MAX,
        };
        // Center is always in range, so at least one candidate gets measured
        let center = coarse.trial.min(self.max_tuning);
        let mut best = center;
        let mut improved = false;
        let mut center_deviation = None;

        for candidate in neighborhood(center, self.max_tuning, self.edge) {
            let reading = probe(osc, candidate, Phase::Refine, &mut log);
            let deviation = self.target.deviation(reading);
            trace!("refine: tuning {} off by {}", candidate.get(), deviation);

            if candidate == center && center_deviation.is_none() {
                center_deviation = Some(deviation);
            }

            // Strict: ties keep the earlier, lower candidate
            if deviation < best_deviation {
                best = candidate;
                best_deviation = deviation;
                improved = true;
            }
        }

        osc.set_tuning(best.get());

        let deviation = if improved {
            best_deviation
        } else {
            center_deviation.unwrap_or(best_deviation)
        };

        let report = CalibrationReport {
            tuning: best,
            deviation,
            target: self.target,
            coarse,
            probes: log,
        };

        info!(
            "oscillator calibrated: tuning {}, deviation {} ticks",
            best.get(),
            deviation
        );
        if !report.within_tolerance() {
            warn!(
                "calibration deviation {} exceeds tolerance {}",
                deviation,
                self.target.tolerance()
            );
        }

        report
    }
}

/// Write `tuning`, then measure one frame against it
fn probe<O>(osc: &mut O, tuning: TuningValue, phase: Phase, log: &mut ProbeLog) -> i32
where
    O: TuningRegister + FrameMeter + ?Sized,
{
    osc.set_tuning(tuning.get());
    let reading = osc.measure_frame();
    // Probe count never exceeds MAX_PROBES
    let _ = log.push(Probe {
        phase,
        tuning,
        reading,
    });
    reading
}

/// Calibrate the oscillator in one call
///
/// Entry point for the USB reset hook. Fails only on an invalid
/// configuration; the calibration itself always commits a value.
pub fn calibrate_oscillator<O, P>(
    osc: &mut O,
    prescaler: &mut P,
    config: &CalibrationConfig,
) -> Result<CalibrationReport, ConfigError>
where
    O: TuningRegister + FrameMeter + ?Sized,
    P: ClockPrescaler + ?Sized,
{
    let calibrator = Calibrator::new(config)?;
    Ok(calibrator.calibrate(osc, prescaler))
}

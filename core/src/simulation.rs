//! Calibration runs against a simulated RC oscillator
//!
//! The model reads `offset + gain * tuning` ticks per frame, optionally with
//! a deterministic noise pattern and per-register glitches.

use crate::{
    calibrate_oscillator, CalibrationConfig, Calibrator, EdgePolicy, FrameTarget, Phase,
    TuningValue,
};
use osccal_hal::{FrameMeter, NoPrescaler, TuningRegister};

struct SimOscillator {
    tuning: u8,
    offset: i32,
    gain: i32,
    noise: &'static [i32],
    glitches: Vec<(u8, i32)>,
    measurements: usize,
    history: Vec<u8>,
}

impl SimOscillator {
    fn new(offset: i32, gain: i32) -> Self {
        Self {
            // Arbitrary prior state at entry
            tuning: 0x5A,
            offset,
            gain,
            noise: &[0],
            glitches: Vec::new(),
            measurements: 0,
            history: Vec::new(),
        }
    }

    fn with_noise(mut self, noise: &'static [i32]) -> Self {
        self.noise = noise;
        self
    }

    fn ideal(&self, tuning: u8) -> i32 {
        self.offset + self.gain * i32::from(tuning)
    }
}

impl TuningRegister for SimOscillator {
    fn set_tuning(&mut self, value: u8) {
        self.tuning = value;
        self.history.push(value);
    }

    fn tuning(&self) -> u8 {
        self.tuning
    }
}

impl FrameMeter for SimOscillator {
    fn measure_frame(&mut self) -> i32 {
        let noise = self.noise[self.measurements % self.noise.len()];
        self.measurements += 1;
        let glitch = self
            .glitches
            .iter()
            .find(|(at, _)| *at == self.tuning)
            .map_or(0, |(_, delta)| *delta);
        self.ideal(self.tuning) + noise + glitch
    }
}

#[test]
fn test_calibrates_to_16_5_mhz() {
    // Optimum is exactly 126: 1600 + 6 * 126 = 2356
    let mut osc = SimOscillator::new(1600, 6);
    let report =
        calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default()).unwrap();

    assert_eq!(report.target, FrameTarget::from_raw(2356));
    assert_eq!(report.coarse.trial, TuningValue::new(125));
    assert_eq!(report.tuning, TuningValue::new(126));
    assert_eq!(report.deviation, 0);
    assert!(report.within_tolerance());
    assert_eq!(osc.tuning(), 126);
    assert_eq!(osc.measurements, 11);
}

#[test]
fn test_linear_model_picks_closer_upper_neighbor() {
    let mut osc = SimOscillator::new(0, 10);
    let calibrator = Calibrator::with_target(FrameTarget::from_raw(1428));
    let report = calibrator.calibrate(&mut osc, &mut NoPrescaler);

    assert_eq!(report.tuning, TuningValue::new(143));
}

#[test]
fn test_coarse_search_brackets_target() {
    for target in (900..=3100).step_by(13) {
        let mut osc = SimOscillator::new(1000, 7);
        let calibrator = Calibrator::with_target(FrameTarget::from_raw(target));
        let trial = calibrator.coarse_search(&mut osc).trial.get();

        if trial > 0 {
            assert!(osc.ideal(trial) < target, "target {}", target);
        }
        if trial < u8::MAX {
            assert!(osc.ideal(trial + 1) >= target, "target {}", target);
        }
        assert_eq!(osc.measurements, 8);
    }
}

#[test]
fn test_noisy_oscillator_lands_near_optimum() {
    let mut osc = SimOscillator::new(1600, 6).with_noise(&[2, -1, 0, -2, 1]);
    let report =
        calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default()).unwrap();

    assert!(report.tuning.get().abs_diff(126) <= 1);
    assert!(report.within_tolerance());
    assert_eq!(report.measurement_count(), 11);
}

#[test]
fn test_glitch_at_coarse_result_is_avoided() {
    let mut osc = SimOscillator::new(1600, 6);
    // 126 reads 10 ticks slow, which drags the coarse search onto it
    osc.glitches.push((126, -10));
    let report =
        calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default()).unwrap();

    assert_eq!(report.coarse.trial, TuningValue::new(126));
    // 125 and 127 both read 6 off; the lower one wins the tie
    assert_eq!(report.tuning, TuningValue::new(125));
    assert_eq!(report.deviation, 6);
}

#[test]
fn test_lower_edge_does_not_wrap() {
    // Runs fast at every setting: coarse search bottoms out at 0
    for edge in [EdgePolicy::Clamp, EdgePolicy::Skip] {
        let mut osc = SimOscillator::new(3000, 1);
        let config = CalibrationConfig {
            edge,
            ..CalibrationConfig::default()
        };
        let report = calibrate_oscillator(&mut osc, &mut NoPrescaler, &config).unwrap();

        assert_eq!(report.coarse.trial, TuningValue::MIN);
        assert_eq!(report.tuning, TuningValue::MIN);
        assert!(report.probes_in(Phase::Refine).all(|p| p.tuning.get() <= 1));
        assert!(!report.within_tolerance());
    }
}

#[test]
fn test_upper_edge_does_not_wrap() {
    // Runs slow at every setting: coarse search tops out at 255
    let mut osc = SimOscillator::new(1000, 1);
    let report =
        calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default()).unwrap();

    assert_eq!(report.coarse.trial, TuningValue::MAX);
    assert_eq!(report.tuning, TuningValue::MAX);
    assert!(report.probes_in(Phase::Refine).all(|p| p.tuning.get() >= 254));
    assert_eq!(report.measurement_count(), 11);
}

#[test]
fn test_skip_policy_drops_edge_probe() {
    let mut osc = SimOscillator::new(3000, 1);
    let config = CalibrationConfig {
        edge: EdgePolicy::Skip,
        ..CalibrationConfig::default()
    };
    let report = calibrate_oscillator(&mut osc, &mut NoPrescaler, &config).unwrap();

    let refine: Vec<u8> = report
        .probes_in(Phase::Refine)
        .map(|p| p.tuning.get())
        .collect();
    assert_eq!(refine, [0, 1]);
    assert_eq!(report.measurement_count(), 10);
}

#[test]
fn test_ceiling_is_never_exceeded() {
    // Optimum would be 214, but the board may not run faster than trim 160
    let mut osc = SimOscillator::new(1500, 4);
    let config = CalibrationConfig {
        tuning_ceiling: Some(160),
        ..CalibrationConfig::default()
    };
    let report = calibrate_oscillator(&mut osc, &mut NoPrescaler, &config).unwrap();

    assert!(osc.history.iter().all(|&t| t <= 160));
    assert_eq!(report.coarse.trial, TuningValue::new(160));
    assert_eq!(report.tuning, TuningValue::new(160));
    assert_eq!(report.deviation, 216);
    // 128 and 160 in the coarse phase, 159/160/160 in refinement
    assert_eq!(report.measurement_count(), 5);
}

#[test]
fn test_every_measurement_follows_a_write() {
    let mut osc = SimOscillator::new(1600, 6);
    let report =
        calibrate_oscillator(&mut osc, &mut NoPrescaler, &CalibrationConfig::default()).unwrap();

    let probed: Vec<u8> = report.probes.iter().map(|p| p.tuning.get()).collect();
    // Every probe's write, then the final commit
    assert_eq!(osc.history[..probed.len()], probed[..]);
    assert_eq!(osc.history.last(), Some(&report.tuning.get()));
}

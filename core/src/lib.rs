//! Platform-agnostic RC oscillator calibration
//!
//! Tunes the internal RC oscillator of a crystal-less USB device against
//! the 1 ms Start-of-Frame cadence the host sends after a bus reset. The
//! bootloader supplies the hardware through the `osccal-hal` traits and
//! calls [`calibrate_oscillator`] from its USB reset hook.
//!
//! This crate has NO hardware dependencies.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

// Must come first so the logging macros are visible to later modules
mod fmt;

pub mod calibrator;
pub mod config;
pub mod error;
pub mod report;
pub mod target;
pub mod tuning;

#[cfg(test)]
mod simulation;

pub use calibrator::{calibrate_oscillator, Calibrator};
pub use config::{CalibrationConfig, EdgePolicy, StartupClock, TargetSource};
pub use error::ConfigError;
pub use report::{CalibrationReport, CoarseResult, Phase, Probe};
pub use target::FrameTarget;
pub use tuning::TuningValue;

//! Hardware abstraction traits for RC oscillator calibration
//!
//! This crate defines the narrow interface the calibration core needs from
//! the surrounding bootloader. BSPs implement these traits; a test harness
//! implements them with a simulated oscillator.
//!
//! The hardware handshake is two operations: write the trim register, then
//! take a measurement that reflects that write. Implementations must not
//! cache a reading across writes.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

mod prescaler;

pub use prescaler::{ClockPrescaler, NoPrescaler};

/// Trim register of the internal RC oscillator (OSCCAL on AVR)
///
/// Writing the register changes the running frequency immediately. There is
/// no pending state.
pub trait TuningRegister {
    /// Write a new trim value
    fn set_tuning(&mut self, value: u8);

    /// Read back the value currently in the register
    fn tuning(&self) -> u8;
}

/// Frame length sensor
///
/// Reports the duration of one USB Start-of-Frame interval in ticks of the
/// current (possibly mistuned) CPU clock. Readings grow with the oscillator
/// frequency and may carry a few ticks of noise.
pub trait FrameMeter {
    /// Measure one frame against the current tuning
    fn measure_frame(&mut self) -> i32;
}

impl<T: TuningRegister + ?Sized> TuningRegister for &mut T {
    fn set_tuning(&mut self, value: u8) {
        T::set_tuning(self, value)
    }

    fn tuning(&self) -> u8 {
        T::tuning(self)
    }
}

impl<T: FrameMeter + ?Sized> FrameMeter for &mut T {
    fn measure_frame(&mut self) -> i32 {
        T::measure_frame(self)
    }
}

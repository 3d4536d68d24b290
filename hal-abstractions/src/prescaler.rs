//! CPU clock prescaler control
//!
//! Low-voltage boards start with the CPU clock divided down. Once USB traffic
//! is seen the supply is known to be good and the divider can go to 1.

/// Switches the CPU clock divider
pub trait ClockPrescaler {
    /// Run the CPU undivided (`clock_div_1` on AVR)
    fn set_full_speed(&mut self);
}

impl<T: ClockPrescaler + ?Sized> ClockPrescaler for &mut T {
    fn set_full_speed(&mut self) {
        T::set_full_speed(self)
    }
}

/// Prescaler for boards that always run at full speed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrescaler;

impl ClockPrescaler for NoPrescaler {
    fn set_full_speed(&mut self) {}
}

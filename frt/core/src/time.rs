//! Timer handles and tick countdowns

use core::fmt;

/// Handle returned when a timer is registered
///
/// Handles are issued from a wrapping 32-bit counter, so a handle is only
/// reused after 2^32 registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u32);

impl TimerId {
    /// First handle issued after initialization
    pub const FIRST: Self = Self(0);

    /// Create a handle from a raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The handle issued after this one
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "timer#{}", self.0);
    }
}

/// Remaining ticks before a timer expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Countdown(u32);

impl Countdown {
    /// Expired countdown
    pub const ZERO: Self = Self(0);

    /// Create a countdown of `ticks`
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Check if the countdown has run out
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Count down by one tick.
    ///
    /// Returns `true` exactly when this call reached zero.
    pub fn decrement(&mut self) -> bool {
        if self.0 > 0 {
            self.0 -= 1;
            self.0 == 0
        } else {
            false
        }
    }

    /// Restart the countdown from `ticks`
    pub fn reload(&mut self, ticks: u32) {
        self.0 = ticks;
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Countdown {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks", self.0);
    }
}

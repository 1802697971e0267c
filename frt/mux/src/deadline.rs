//! Foreground waits on the tick count

use core::convert::Infallible;

use crate::mux::TimerMux;

/// A point a fixed number of ticks after its creation
///
/// Polled with [`Deadline::poll`] in the style of `nb`: `WouldBlock` until
/// enough ticks have been serviced. Survives the tick counter wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: u32,
    ticks: u32,
}

impl Deadline {
    /// Deadline `ticks` ticks from now on `mux`
    pub fn after<H, const N: usize>(mux: &TimerMux<H, N>, ticks: u32) -> Self {
        Self {
            start: mux.ticks_elapsed(),
            ticks,
        }
    }

    /// Check against an explicit tick count
    pub fn expired_at(&self, now: u32) -> bool {
        now.wrapping_sub(self.start) >= self.ticks
    }

    pub fn poll<H, const N: usize>(&self, mux: &TimerMux<H, N>) -> nb::Result<(), Infallible> {
        if self.expired_at(mux.ticks_elapsed()) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Deadline {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Deadline{{ start: {}, ticks: {} }}", self.start, self.ticks);
    }
}

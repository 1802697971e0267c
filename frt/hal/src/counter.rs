//! Free-running counter abstraction

use crate::error::HalResult;
use frt_core::IrqLevel;

/// Interrupt service routine installed on a counter event
pub type Isr = fn();

/// Prescaler applied to the peripheral clock before it reaches the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDivisor {
    Div8,
    Div32,
    Div128,
}

impl ClockDivisor {
    /// Division ratio
    pub const fn ratio(self) -> u32 {
        match self {
            Self::Div8 => 8,
            Self::Div32 => 32,
            Self::Div128 => 128,
        }
    }

    /// Counter increments per millisecond for a `clock_hz` input clock
    pub const fn counts_per_ms(self, clock_hz: u32) -> u32 {
        clock_hz / self.ratio() / 1000
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockDivisor {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Div{}", self.ratio());
    }
}

/// Free-running 16-bit counter with two compare channels and overflow
///
/// Methods take `&self`: the counter is a shared peripheral, reached from
/// both foreground code and its own interrupt handlers.
pub trait FreeRunningCounter: Sync {
    /// Select the counter clock
    fn configure(&self, divisor: ClockDivisor) -> HalResult<()>;

    /// Install the handler run when the counter wraps past `0xFFFF`
    fn set_overflow_handler(&self, handler: Isr);

    /// Program compare channel A; `handler` runs when the counter reaches
    /// `threshold`. A zero threshold is rejected.
    fn set_compare_a(&self, threshold: u16, handler: Isr) -> HalResult<()>;

    /// Program compare channel B, independent of channel A
    fn set_compare_b(&self, threshold: u16, handler: Isr) -> HalResult<()>;

    /// Current counter value
    fn count(&self) -> u16;

    /// Overwrite the counter value
    fn set_count(&self, value: u16);

    /// Priority at which all counter interrupts are raised
    fn set_interrupt_priority(&self, level: IrqLevel);
}

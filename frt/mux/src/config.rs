//! Timer configuration

use frt_hal::{ClockDivisor, HalError, HalResult, IrqLevel};

/// Counter programming and interrupt levels used by [`crate::TimerMux::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Counter clock prescaler
    pub divisor: ClockDivisor,
    /// Compare-A threshold, one tick (millisecond) of counts
    pub counts_per_tick: u16,
    /// Compare-B threshold for the sub-tick diagnostic counter
    pub sub_tick_counts: u16,
    /// Priority of the counter interrupts
    pub priority: IrqLevel,
    /// Mask level held while the slot table is mutated from the foreground
    pub mask_level: IrqLevel,
}

impl TimerConfig {
    /// 320-pixel NTSC dot clock with a /8 prescaler: 3359 counts per
    /// millisecond, sub-tick every 32 counts (about 9.5 us)
    pub const NTSC_320: Self = Self {
        divisor: ClockDivisor::Div8,
        counts_per_tick: 3359,
        sub_tick_counts: 32,
        priority: IrqLevel::saturating(8),
        mask_level: IrqLevel::MAX,
    };

    /// Derive the tick threshold from the peripheral clock.
    ///
    /// The remaining fields are taken from [`TimerConfig::NTSC_320`].
    pub fn for_clock(clock_hz: u32, divisor: ClockDivisor) -> HalResult<Self> {
        let counts = divisor.counts_per_ms(clock_hz);
        let counts_per_tick = u16::try_from(counts).map_err(|_| HalError::ConfigurationError)?;
        let config = Self {
            divisor,
            counts_per_tick,
            ..Self::NTSC_320
        };
        config.validate()?;
        Ok(config)
    }

    pub const fn with_divisor(mut self, divisor: ClockDivisor) -> Self {
        self.divisor = divisor;
        self
    }

    pub const fn with_counts_per_tick(mut self, counts: u16) -> Self {
        self.counts_per_tick = counts;
        self
    }

    pub const fn with_sub_tick_counts(mut self, counts: u16) -> Self {
        self.sub_tick_counts = counts;
        self
    }

    pub const fn with_priority(mut self, priority: IrqLevel) -> Self {
        self.priority = priority;
        self
    }

    pub const fn with_mask_level(mut self, level: IrqLevel) -> Self {
        self.mask_level = level;
        self
    }

    /// Check the thresholds are programmable and the foreground mask
    /// actually blocks the counter interrupts
    pub fn validate(&self) -> HalResult<()> {
        if self.counts_per_tick == 0 || self.sub_tick_counts == 0 {
            return Err(HalError::InvalidParameter);
        }
        if self.sub_tick_counts >= self.counts_per_tick {
            return Err(HalError::ConfigurationError);
        }
        if self.priority.preempts(self.mask_level) {
            return Err(HalError::ConfigurationError);
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::NTSC_320
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "TimerConfig{{ divisor: {}, counts_per_tick: {}, sub_tick_counts: {}, priority: {}, mask_level: {} }}",
            self.divisor,
            self.counts_per_tick,
            self.sub_tick_counts,
            self.priority,
            self.mask_level
        );
    }
}

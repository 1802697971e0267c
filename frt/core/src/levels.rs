//! Interrupt priority levels

use core::fmt;

/// Interrupt priority / mask level in the range `0..=15`
///
/// The same type serves as the priority assigned to an interrupt source and
/// as the CPU mask level: a source is serviced only while its priority is
/// strictly above the current mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IrqLevel(u8);

impl IrqLevel {
    /// Nothing masked
    pub const NONE: IrqLevel = IrqLevel(0);

    /// Every maskable source masked
    pub const MAX: IrqLevel = IrqLevel(15);

    /// Create a level, rejecting values above [`IrqLevel::MAX`]
    pub const fn new(level: u8) -> Option<Self> {
        if level > Self::MAX.0 {
            None
        } else {
            Some(IrqLevel(level))
        }
    }

    /// Create a level without validation, clamping to [`IrqLevel::MAX`]
    pub const fn saturating(level: u8) -> Self {
        if level > Self::MAX.0 {
            Self::MAX
        } else {
            IrqLevel(level)
        }
    }

    /// Get the raw level
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check if a source at this priority is serviced under `mask`
    pub const fn preempts(self, mask: IrqLevel) -> bool {
        self.0 > mask.0
    }
}

impl Default for IrqLevel {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for IrqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqLevel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Level({})", self.0);
    }
}

//! Software model of the free-running counter and its interrupt controller
//!
//! [`SimFrt`] behaves like the on-chip peripheral as far as the timer
//! multiplexer can observe: a 16-bit counter that wraps, compare matches on
//! channels A and B, an overflow event, a single interrupt priority for all
//! three sources, and a CPU mask level. A source raised while the mask is at
//! or above its priority stays pending until the mask drops.
//!
//! Time only moves when the test calls [`SimFrt::advance`], which steps from
//! event to event rather than count by count.

use core::cell::Cell;
use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering};

use critical_section::Mutex;
use frt_core::IrqLevel;

use crate::counter::{ClockDivisor, FreeRunningCounter, Isr};
use crate::error::{HalError, HalResult};
use crate::mask::InterruptMask;

const PENDING_OCA: u8 = 1 << 0;
const PENDING_OCB: u8 = 1 << 1;
const PENDING_OVF: u8 = 1 << 2;

/// Counts in one full counter period
const PERIOD: u32 = 0x1_0000;

#[derive(Clone, Copy)]
struct Vectors {
    compare_a: Option<Isr>,
    compare_b: Option<Isr>,
    overflow: Option<Isr>,
}

impl Vectors {
    const EMPTY: Self = Self {
        compare_a: None,
        compare_b: None,
        overflow: None,
    };
}

/// Simulated free-running counter
pub struct SimFrt {
    count: AtomicU16,
    divisor: AtomicU8,
    ocra: AtomicU16,
    ocrb: AtomicU16,
    vectors: Mutex<Cell<Vectors>>,
    priority: AtomicU8,
    mask: AtomicU8,
    pending: AtomicU8,
    latency: AtomicU16,
    elapsed: AtomicU32,
}

impl SimFrt {
    /// Create a counter in its reset state: stopped clock, no compare
    /// channels, priority zero (interrupts never serviced), nothing masked.
    pub const fn new() -> Self {
        Self {
            count: AtomicU16::new(0),
            divisor: AtomicU8::new(0),
            ocra: AtomicU16::new(0),
            ocrb: AtomicU16::new(0),
            vectors: Mutex::new(Cell::new(Vectors::EMPTY)),
            priority: AtomicU8::new(0),
            mask: AtomicU8::new(0),
            pending: AtomicU8::new(0),
            latency: AtomicU16::new(0),
            elapsed: AtomicU32::new(0),
        }
    }

    /// Counts that elapse between a compare-A match and handler entry.
    ///
    /// They are added to the counter before the handler runs and are charged
    /// against the budget of the [`SimFrt::advance`] call that serviced it.
    pub fn set_latency(&self, counts: u16) {
        self.latency.store(counts, Ordering::Relaxed);
    }

    /// Clock selected by the last `configure`
    pub fn divisor(&self) -> Option<ClockDivisor> {
        match self.divisor.load(Ordering::Relaxed) {
            8 => Some(ClockDivisor::Div8),
            32 => Some(ClockDivisor::Div32),
            128 => Some(ClockDivisor::Div128),
            _ => None,
        }
    }

    /// Compare channel A threshold, zero when unprogrammed
    pub fn compare_a(&self) -> u16 {
        self.ocra.load(Ordering::Relaxed)
    }

    /// Compare channel B threshold, zero when unprogrammed
    pub fn compare_b(&self) -> u16 {
        self.ocrb.load(Ordering::Relaxed)
    }

    /// Priority programmed for the counter interrupts
    pub fn priority(&self) -> IrqLevel {
        IrqLevel::saturating(self.priority.load(Ordering::Relaxed))
    }

    /// Current CPU mask level
    pub fn mask_level(&self) -> IrqLevel {
        IrqLevel::saturating(self.mask.load(Ordering::Relaxed))
    }

    /// Check if any counter interrupt is waiting to be serviced
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Relaxed) != 0
    }

    /// Total counts advanced since creation, latency included
    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Let `counts` counter increments elapse, servicing every interrupt the
    /// current mask allows as soon as it is raised.
    pub fn advance(&self, counts: u32) {
        let mut budget = counts;
        while budget > 0 {
            let now = self.count.load(Ordering::Relaxed);
            let step = self.counts_to_next_event(now).min(budget);
            let raw = u32::from(now) + step;
            let next = raw as u16;

            self.count.store(next, Ordering::Relaxed);
            self.elapsed.fetch_add(step, Ordering::Relaxed);
            budget -= step;

            let ocra = self.ocra.load(Ordering::Relaxed);
            if ocra != 0 && next == ocra {
                self.pending.fetch_or(PENDING_OCA, Ordering::Relaxed);
            }
            let ocrb = self.ocrb.load(Ordering::Relaxed);
            if ocrb != 0 && next == ocrb {
                self.pending.fetch_or(PENDING_OCB, Ordering::Relaxed);
            }
            if raw >= PERIOD {
                self.pending.fetch_or(PENDING_OVF, Ordering::Relaxed);
            }

            let consumed = self.service_pending();
            budget = budget.saturating_sub(consumed);
        }
    }

    fn counts_to_next_event(&self, now: u16) -> u32 {
        let mut distance = PERIOD - u32::from(now);
        for ocr in [self.ocra.load(Ordering::Relaxed), self.ocrb.load(Ordering::Relaxed)] {
            if ocr != 0 {
                distance = distance.min(counts_until(now, ocr));
            }
        }
        distance
    }

    /// Run pending handlers while the mask allows, highest source first.
    /// Returns the latency counts added on the way.
    fn service_pending(&self) -> u32 {
        let mut consumed = 0;
        loop {
            let priority = self.priority();
            if !priority.preempts(self.mask_level()) {
                break;
            }

            let pending = self.pending.load(Ordering::Relaxed);
            let source = if pending & PENDING_OCA != 0 {
                PENDING_OCA
            } else if pending & PENDING_OCB != 0 {
                PENDING_OCB
            } else if pending & PENDING_OVF != 0 {
                PENDING_OVF
            } else {
                break;
            };
            self.pending.fetch_and(!source, Ordering::Relaxed);

            let vectors = critical_section::with(|cs| self.vectors.borrow(cs).get());
            let handler = match source {
                PENDING_OCA => vectors.compare_a,
                PENDING_OCB => vectors.compare_b,
                _ => vectors.overflow,
            };

            if source == PENDING_OCA {
                let latency = self.latency.load(Ordering::Relaxed);
                if latency > 0 {
                    self.count.fetch_add(latency, Ordering::Relaxed);
                    self.elapsed.fetch_add(u32::from(latency), Ordering::Relaxed);
                    consumed += u32::from(latency);
                }
            }

            if let Some(handler) = handler {
                // Accepting an interrupt raises the mask to its priority
                let previous = self.mask.swap(priority.raw(), Ordering::Relaxed);
                handler();
                self.mask.store(previous, Ordering::Relaxed);
            }
        }
        consumed
    }

    fn update_vectors(&self, f: impl FnOnce(&mut Vectors)) {
        critical_section::with(|cs| {
            let cell = self.vectors.borrow(cs);
            let mut vectors = cell.get();
            f(&mut vectors);
            cell.set(vectors);
        });
    }
}

impl Default for SimFrt {
    fn default() -> Self {
        Self::new()
    }
}

fn counts_until(now: u16, target: u16) -> u32 {
    match u32::from(target.wrapping_sub(now)) {
        0 => PERIOD,
        distance => distance,
    }
}

impl FreeRunningCounter for SimFrt {
    fn configure(&self, divisor: ClockDivisor) -> HalResult<()> {
        self.divisor.store(divisor.ratio() as u8, Ordering::Relaxed);
        Ok(())
    }

    fn set_overflow_handler(&self, handler: Isr) {
        self.update_vectors(|v| v.overflow = Some(handler));
    }

    fn set_compare_a(&self, threshold: u16, handler: Isr) -> HalResult<()> {
        if threshold == 0 {
            return Err(HalError::InvalidParameter);
        }
        self.ocra.store(threshold, Ordering::Relaxed);
        self.update_vectors(|v| v.compare_a = Some(handler));
        Ok(())
    }

    fn set_compare_b(&self, threshold: u16, handler: Isr) -> HalResult<()> {
        if threshold == 0 {
            return Err(HalError::InvalidParameter);
        }
        self.ocrb.store(threshold, Ordering::Relaxed);
        self.update_vectors(|v| v.compare_b = Some(handler));
        Ok(())
    }

    fn count(&self) -> u16 {
        self.count.load(Ordering::Relaxed)
    }

    fn set_count(&self, value: u16) {
        self.count.store(value, Ordering::Relaxed);
    }

    fn set_interrupt_priority(&self, level: IrqLevel) {
        self.priority.store(level.raw(), Ordering::Relaxed);
    }
}

impl InterruptMask for SimFrt {
    fn mask(&self, level: IrqLevel) -> IrqLevel {
        IrqLevel::saturating(self.mask.fetch_max(level.raw(), Ordering::Relaxed))
    }

    fn restore(&self, previous: IrqLevel) {
        self.mask.store(previous.raw(), Ordering::Relaxed);
        self.service_pending();
    }
}

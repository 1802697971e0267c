//! The timer multiplexer
//!
//! [`TimerMux`] owns the slot table and the counter it is driven by. The
//! compare-A interrupt calls [`TimerMux::on_compare_a`] once per tick; the
//! foreground calls [`TimerMux::register`] and [`TimerMux::cancel`].
//!
//! Foreground mutation raises the interrupt mask to the configured ceiling
//! for its duration, so a tick can never observe a half-updated table. The
//! tick handler itself takes the table only for the countdown and the
//! settlement of each slot; callbacks run with the table released and may
//! register or cancel timers themselves.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use frt_core::{TResult, TimerId};
use frt_hal::{FreeRunningCounter, HalResult, InterruptMask, IrqLevel, Isr, MaskGuard};
use heapless::Vec;

use crate::config::TimerConfig;
use crate::request::TimerRequest;
use crate::table::{Settled, SlotTable, SlotView};
use crate::trace::{TraceHook, TraceRecord};
use crate::MAX_TIMERS;

/// Interrupt entry points installed on the counter by [`TimerMux::init`]
///
/// Each one forwards to the matching `on_*` method of a `static` mux;
/// [`crate::define_timer_mux!`] generates them.
#[derive(Clone, Copy)]
pub struct IsrVectors {
    pub compare_a: Isr,
    pub compare_b: Isr,
    pub overflow: Isr,
}

/// Counter event totals since the last [`TimerMux::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Compare-A interrupts (ticks) serviced
    pub ticks: u32,
    /// Counter wraps past `0xFFFF`
    pub overflows: u32,
    /// Compare-B interrupts serviced
    pub sub_ticks: u32,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Diagnostics {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Diagnostics{{ ticks: {}, overflows: {}, sub_ticks: {} }}",
            self.ticks,
            self.overflows,
            self.sub_ticks
        );
    }
}

/// Software timers multiplexed onto one free-running counter
pub struct TimerMux<H, const N: usize = MAX_TIMERS> {
    hw: H,
    vectors: IsrVectors,
    config: Mutex<Cell<TimerConfig>>,
    table: Mutex<RefCell<SlotTable<N>>>,
    trace: Mutex<Cell<Option<TraceHook>>>,
    ticks: AtomicU32,
    overflows: AtomicU32,
    sub_ticks: AtomicU32,
}

impl<H, const N: usize> TimerMux<H, N> {
    /// Create a multiplexer with every slot free.
    ///
    /// Nothing reaches the hardware until [`TimerMux::init`].
    pub const fn new(hw: H, vectors: IsrVectors) -> Self {
        Self {
            hw,
            vectors,
            config: Mutex::new(Cell::new(TimerConfig::NTSC_320)),
            table: Mutex::new(RefCell::new(SlotTable::new())),
            trace: Mutex::new(Cell::new(None)),
            ticks: AtomicU32::new(0),
            overflows: AtomicU32::new(0),
            sub_ticks: AtomicU32::new(0),
        }
    }

    /// Underlying counter
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Configuration applied by the last `init`
    pub fn config(&self) -> TimerConfig {
        critical_section::with(|cs| self.config.borrow(cs).get())
    }

    /// Install or remove the trace hook
    pub fn set_trace(&self, hook: Option<TraceHook>) {
        critical_section::with(|cs| self.trace.borrow(cs).set(hook));
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            ticks: self.ticks.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            sub_ticks: self.sub_ticks.load(Ordering::Relaxed),
        }
    }

    /// Ticks since `init`, wrapping
    pub fn ticks_elapsed(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.with_table(|table| table.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with_table(|table| table.is_empty())
    }

    /// Maximum number of concurrently armed timers
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Check if `id` is armed
    pub fn contains(&self, id: TimerId) -> bool {
        self.with_table(|table| table.contains(id))
    }

    /// Ticks before `id` fires next, `None` if it is not armed
    pub fn remaining(&self, id: TimerId) -> Option<u32> {
        self.with_table(|table| table.remaining(id))
    }

    /// Copy of every occupied slot, in slot order
    pub fn snapshot(&self) -> Vec<SlotView, N> {
        self.with_table(|table| table.views().collect())
    }

    /// Overflow interrupt body
    pub fn on_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Compare-B interrupt body
    pub fn on_compare_b(&self) {
        self.sub_ticks.fetch_add(1, Ordering::Relaxed);
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut SlotTable<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.table.borrow_ref_mut(cs)))
    }

    fn emit(&self, record: TraceRecord) {
        #[cfg(feature = "defmt")]
        defmt::trace!("{}", record);

        let hook = critical_section::with(|cs| self.trace.borrow(cs).get());
        if let Some(hook) = hook {
            hook(&record);
        }
    }
}

impl<H, const N: usize> TimerMux<H, N>
where
    H: FreeRunningCounter + InterruptMask,
{
    /// Free every slot and program the counter.
    ///
    /// Runs fully masked. Calling it again re-initializes: armed timers are
    /// dropped without firing and the diagnostics restart from zero.
    pub fn init(&self, config: TimerConfig) -> HalResult<()> {
        config.validate()?;
        let _guard = MaskGuard::new(&self.hw, IrqLevel::MAX);

        critical_section::with(|cs| {
            self.config.borrow(cs).set(config);
            self.table.borrow_ref_mut(cs).clear();
        });
        self.ticks.store(0, Ordering::Relaxed);
        self.overflows.store(0, Ordering::Relaxed);
        self.sub_ticks.store(0, Ordering::Relaxed);

        self.hw.configure(config.divisor)?;
        self.hw
            .set_compare_a(config.counts_per_tick, self.vectors.compare_a)?;
        self.hw
            .set_compare_b(config.sub_tick_counts, self.vectors.compare_b)?;
        self.hw.set_count(0);
        self.hw.set_overflow_handler(self.vectors.overflow);
        self.hw.set_interrupt_priority(config.priority);

        #[cfg(feature = "defmt")]
        defmt::debug!("timer mux ready: {}", config);

        Ok(())
    }

    /// Arm a periodic timer.
    ///
    /// The first fire happens exactly `request.interval` ticks from now.
    /// Fails with `InvalidArgument` for a zero interval or a missing
    /// callback and with `TableFull` when every slot is taken; in both
    /// cases the table is left unchanged.
    pub fn register(&self, request: TimerRequest) -> TResult<TimerId> {
        let valid = match request.validate() {
            Ok(valid) => valid,
            Err(error) => {
                self.emit(TraceRecord::Rejected { error });
                return Err(error);
            }
        };

        let _guard = self.masked();
        match self.with_table(|table| table.insert(valid)) {
            Ok((id, slot)) => {
                self.emit(TraceRecord::Armed {
                    id,
                    slot,
                    interval: valid.interval().get(),
                });
                Ok(id)
            }
            Err(error) => {
                self.emit(TraceRecord::Rejected { error });
                Err(error)
            }
        }
    }

    /// Disarm `id`; its callback will not run again
    pub fn cancel(&self, id: TimerId) -> TResult<()> {
        let _guard = self.masked();
        match self.with_table(|table| table.remove(id)) {
            Ok(slot) => {
                self.emit(TraceRecord::Disarmed { id, slot });
                Ok(())
            }
            Err(error) => {
                self.emit(TraceRecord::DisarmAttempt { id });
                Err(error)
            }
        }
    }

    /// Compare-A interrupt body: one tick.
    ///
    /// Counts that elapsed between the compare match and this handler are
    /// carried into the next period by rewinding the counter by one tick's
    /// worth instead of zeroing it. Then every slot armed before the tick
    /// began counts down, in slot order, and expired ones run their
    /// callback. Timers registered by those callbacks start counting on the
    /// next tick.
    pub fn on_compare_a(&self) {
        let counts_per_tick = self.config().counts_per_tick;
        if let Some(offset) = self.hw.count().checked_sub(counts_per_tick) {
            self.hw.set_count(offset);
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let epoch = self.with_table(|table| table.epoch());
        for index in 0..N {
            let Some(event) = self.with_table(|table| table.countdown(index, epoch)) else {
                continue;
            };
            let id = event.id();
            self.emit(TraceRecord::Fired { id, slot: index });

            let decision = event.dispatch();
            let settled = self.with_table(|table| table.settle(index, id, decision));
            if settled == Settled::Freed {
                self.emit(TraceRecord::AutoDisarm { id, slot: index });
            }
        }
    }

    fn masked(&self) -> MaskGuard<'_, H> {
        MaskGuard::new(&self.hw, self.config().mask_level)
    }
}

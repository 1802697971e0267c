//! Register / cancel / tick tests for frt-mux on the simulated counter

use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

use frt_mux::hal::sim::SimFrt;
use frt_mux::hal::{ClockDivisor, FreeRunningCounter, HalError, IrqLevel, MaskGuard};
use frt_mux::{
    define_timer_mux, Deadline, Diagnostics, Rearm, TimerConfig, TimerError, TimerEvent, TimerId,
    TimerRequest,
};

const TICK: u32 = TimerConfig::NTSC_320.counts_per_tick as u32;

fn count(event: &TimerEvent) -> Rearm {
    if let Some(counter) = event.work_as::<AtomicU32>() {
        counter.fetch_add(1, Ordering::Relaxed);
    }
    event.rearm()
}

fn count_once(event: &TimerEvent) -> Rearm {
    count(event);
    Rearm::Stop
}

fn count_then_slow_down(event: &TimerEvent) -> Rearm {
    count(event);
    Rearm::Continue(NonZeroU32::new(3).unwrap())
}

fn noop(event: &TimerEvent) -> Rearm {
    event.rearm()
}

#[test]
fn test_init_programs_counter() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););

    MUX.init(TimerConfig::NTSC_320).unwrap();

    let sim = MUX.hardware();
    assert_eq!(sim.divisor(), Some(ClockDivisor::Div8));
    assert_eq!(sim.compare_a(), 3359);
    assert_eq!(sim.compare_b(), 32);
    assert_eq!(sim.priority(), IrqLevel::saturating(8));
    assert_eq!(sim.count(), 0);
    assert_eq!(sim.mask_level(), IrqLevel::NONE);
    assert!(MUX.is_empty());
    assert_eq!(MUX.capacity(), 16);
}

#[test]
fn test_init_rejects_invalid_config() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););

    let config = TimerConfig::NTSC_320.with_mask_level(IrqLevel::saturating(2));
    assert_eq!(MUX.init(config), Err(HalError::ConfigurationError));
    assert_eq!(MUX.hardware().compare_a(), 0);
}

#[test]
fn test_register_then_cancel_restores_occupancy() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();

    let keep = MUX.register(TimerRequest::new(10, noop)).unwrap();
    let before = MUX.snapshot();

    let id = MUX.register(TimerRequest::new(20, noop)).unwrap();
    assert_ne!(id, keep);
    assert!(MUX.contains(id));
    assert_eq!(MUX.len(), 2);

    MUX.cancel(id).unwrap();
    assert!(!MUX.contains(id));
    assert_eq!(MUX.snapshot(), before);
    assert_eq!(MUX.cancel(id), Err(TimerError::NotFound));
}

#[test]
fn test_invalid_requests_leave_table_untouched() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.register(TimerRequest::new(4, noop)).unwrap();
    let before = MUX.snapshot();

    assert_eq!(
        MUX.register(TimerRequest::new(0, noop)),
        Err(TimerError::InvalidArgument)
    );
    let no_callback = TimerRequest {
        interval: 10,
        callback: None,
        work: None,
    };
    assert_eq!(MUX.register(no_callback), Err(TimerError::InvalidArgument));
    assert_eq!(MUX.snapshot(), before);
}

#[test]
fn test_table_full_leaves_slots_untouched() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();

    for interval in 1..=16 {
        MUX.register(TimerRequest::new(interval, noop)).unwrap();
    }
    let full = MUX.snapshot();
    assert_eq!(full.len(), 16);

    assert_eq!(
        MUX.register(TimerRequest::new(5, noop)),
        Err(TimerError::TableFull)
    );
    assert_eq!(MUX.snapshot(), full);
}

#[test]
fn test_const_slot_count() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(), slots = 2;);
    MUX.init(TimerConfig::NTSC_320).unwrap();

    assert_eq!(MUX.capacity(), 2);
    MUX.register(TimerRequest::new(1, noop)).unwrap();
    MUX.register(TimerRequest::new(1, noop)).unwrap();
    assert_eq!(
        MUX.register(TimerRequest::new(1, noop)),
        Err(TimerError::TableFull)
    );
}

#[test]
fn test_first_fire_after_exactly_interval_ticks() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);
    MUX.init(TimerConfig::NTSC_320).unwrap();

    let id = MUX
        .register(TimerRequest::new(5, count).with_work(&HITS))
        .unwrap();
    assert_eq!(MUX.remaining(id), Some(5));

    MUX.hardware().advance(4 * TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 0);
    assert_eq!(MUX.remaining(id), Some(1));

    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert_eq!(MUX.remaining(id), Some(5));

    MUX.hardware().advance(10 * TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 3);
}

#[test]
fn test_stop_fires_once() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);
    MUX.init(TimerConfig::NTSC_320).unwrap();

    let id = MUX
        .register(TimerRequest::new(2, count_once).with_work(&HITS))
        .unwrap();
    MUX.hardware().advance(10 * TICK);

    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert!(MUX.is_empty());
    assert_eq!(MUX.cancel(id), Err(TimerError::NotFound));
}

#[test]
fn test_continue_sets_new_period() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);
    MUX.init(TimerConfig::NTSC_320).unwrap();

    let id = MUX
        .register(TimerRequest::new(1, count_then_slow_down).with_work(&HITS))
        .unwrap();

    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert_eq!(MUX.remaining(id), Some(3));

    MUX.hardware().advance(2 * TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 2);
    assert_eq!(MUX.snapshot()[0].interval, 3);
}

#[test]
fn test_masked_foreground_defers_tick() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);
    MUX.init(TimerConfig::NTSC_320).unwrap();

    let id = MUX
        .register(TimerRequest::new(1, count).with_work(&HITS))
        .unwrap();

    {
        let _guard = MaskGuard::new(MUX.hardware(), MUX.config().mask_level);
        MUX.hardware().advance(TICK);
        assert!(MUX.hardware().is_pending());
        assert_eq!(HITS.load(Ordering::Relaxed), 0);
        assert_eq!(MUX.remaining(id), Some(1));
    }

    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert_eq!(MUX.hardware().count(), 0);
    assert_eq!(MUX.diagnostics().ticks, 1);
}

#[test]
fn test_masked_period_counts_overflow() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();

    {
        let _guard = MaskGuard::new(MUX.hardware(), IrqLevel::MAX);
        MUX.hardware().advance(70_000);
    }

    assert_eq!(
        MUX.diagnostics(),
        Diagnostics {
            ticks: 1,
            overflows: 1,
            sub_ticks: 1,
        }
    );
    // Drift correction keeps the counts past the tick threshold
    assert_eq!(MUX.hardware().count(), (70_000 - 65_536 - 3359) as u16);
}

#[test]
fn test_callback_cancelling_itself() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);

    fn cancel_self(event: &TimerEvent) -> Rearm {
        count(event);
        MUX.cancel(event.id()).unwrap();
        event.rearm()
    }

    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.register(TimerRequest::new(2, cancel_self).with_work(&HITS))
        .unwrap();

    MUX.hardware().advance(6 * TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
    assert!(MUX.is_empty());
}

#[test]
fn test_callback_registers_follow_up() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);

    fn spawn(_event: &TimerEvent) -> Rearm {
        MUX.register(TimerRequest::new(2, count).with_work(&HITS))
            .unwrap();
        Rearm::Stop
    }

    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.register(TimerRequest::new(1, spawn)).unwrap();

    // The follow-up lands in slot 1, but the spawning tick leaves it alone
    MUX.hardware().advance(TICK);
    assert_eq!(MUX.len(), 1);
    assert_eq!(MUX.snapshot()[0].slot, 1);
    assert_eq!(MUX.snapshot()[0].remaining, 2);
    assert_eq!(HITS.load(Ordering::Relaxed), 0);

    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 0);
    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_interval_one_follow_up_waits_a_tick() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static HITS: AtomicU32 = AtomicU32::new(0);

    fn spawn(_event: &TimerEvent) -> Rearm {
        MUX.register(TimerRequest::new(1, count).with_work(&HITS))
            .unwrap();
        Rearm::Stop
    }

    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.register(TimerRequest::new(1, spawn)).unwrap();

    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 0);
    MUX.hardware().advance(TICK);
    assert_eq!(HITS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_callback_sees_reloaded_countdown() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    static SEEN: AtomicU32 = AtomicU32::new(u32::MAX);

    fn look(event: &TimerEvent) -> Rearm {
        let remaining = MUX.remaining(event.id()).unwrap_or(0);
        SEEN.store(remaining, Ordering::Relaxed);
        for view in MUX.snapshot().iter() {
            assert!((1..=view.interval).contains(&view.remaining));
        }
        event.rearm()
    }

    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.register(TimerRequest::new(3, look)).unwrap();
    MUX.hardware().advance(3 * TICK);

    assert_eq!(SEEN.load(Ordering::Relaxed), 3);
}

#[test]
fn test_reinit_clears_table() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();

    MUX.register(TimerRequest::new(3, noop)).unwrap();
    MUX.register(TimerRequest::new(4, noop)).unwrap();
    MUX.hardware().advance(2 * TICK);
    assert_eq!(MUX.diagnostics().ticks, 2);

    MUX.init(TimerConfig::NTSC_320).unwrap();
    assert!(MUX.is_empty());
    assert_eq!(MUX.diagnostics(), Diagnostics::default());
    assert_eq!(
        MUX.register(TimerRequest::new(3, noop)),
        Ok(TimerId::FIRST)
    );
}

#[test]
fn test_deadline_polls_tick_count() {
    define_timer_mux!(static MUX: SimFrt = SimFrt::new(););
    MUX.init(TimerConfig::NTSC_320).unwrap();
    MUX.hardware().advance(7 * TICK);

    let deadline = Deadline::after(&MUX, 3);
    assert_eq!(deadline.poll(&MUX), Err(nb::Error::WouldBlock));

    MUX.hardware().advance(2 * TICK);
    assert_eq!(deadline.poll(&MUX), Err(nb::Error::WouldBlock));

    MUX.hardware().advance(TICK);
    assert_eq!(deadline.poll(&MUX), Ok(()));
}

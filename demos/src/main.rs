//! Four software timers on one simulated free-running counter
//!
//! Counters advance at 1 s, 2 s, 3 ms and 0.5 s. Every half second of
//! simulated time the demo prints them together with the overflow and
//! sub-tick diagnostics of the counter.
//!
//! Usage: `frt-counters [seconds]` (default 5)

use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};

use frt_hal::sim::SimFrt;
use frt_mux::{define_timer_mux, Rearm, TimerConfig, TimerEvent, TimerRequest};

define_timer_mux!(static TIMERS: SimFrt = SimFrt::new(););

static COUNTERS: [AtomicU32; 4] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

const INTERVALS: [u32; 4] = [1000, 2000, 3, 500];

/// Ticks between two status lines
const FRAME_TICKS: u32 = 500;

fn bump(event: &TimerEvent) -> Rearm {
    if let Some(counter) = event.work_as::<AtomicU32>() {
        counter.fetch_add(1, Ordering::Relaxed);
    }
    event.rearm()
}

fn main() -> ExitCode {
    let seconds = match std::env::args().nth(1).map(|arg| arg.parse::<u32>()) {
        None => 5,
        Some(Ok(seconds)) => seconds,
        Some(Err(err)) => {
            eprintln!("invalid duration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = TimerConfig::NTSC_320;
    if let Err(err) = TIMERS.init(config) {
        eprintln!("timer init failed: {err}");
        return ExitCode::FAILURE;
    }

    for (interval, counter) in INTERVALS.iter().zip(&COUNTERS) {
        if let Err(err) = TIMERS.register(TimerRequest::new(*interval, bump).with_work(counter)) {
            eprintln!("register {interval} ms failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    let frame_counts = FRAME_TICKS * u32::from(config.counts_per_tick);
    for _ in 0..seconds.saturating_mul(1000) / FRAME_TICKS {
        TIMERS.hardware().advance(frame_counts);

        let diagnostics = TIMERS.diagnostics();
        let values: Vec<u32> = COUNTERS
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .collect();
        println!(
            "t={:>6} ms  1s={:<3} 2s={:<3} 3ms={:<5} 0.5s={:<3} ovf={} ocb={}",
            diagnostics.ticks,
            values[0],
            values[1],
            values[2],
            values[3],
            diagnostics.overflows,
            diagnostics.sub_ticks
        );
    }

    ExitCode::SUCCESS
}

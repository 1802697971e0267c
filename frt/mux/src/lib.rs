//! # FRT Timer Multiplexer
//!
//! Millisecond software timers on top of one free-running 16-bit counter.
//!
//! A fixed table of [`MAX_TIMERS`] slots (or any `N` chosen through the
//! const parameter of [`TimerMux`]) is served by the counter's compare-A
//! interrupt, raised once per millisecond. Each tick decrements every armed
//! slot; an expired slot runs its callback, which answers with a [`Rearm`]
//! decision: keep firing, possibly at a new period, or stop.
//!
//! ```ignore
//! use frt_mux::{define_timer_mux, Rearm, TimerConfig, TimerEvent, TimerRequest};
//!
//! define_timer_mux!(static TIMERS: MyFrt = MyFrt::new(););
//!
//! fn blink(event: &TimerEvent) -> Rearm {
//!     toggle_led();
//!     event.rearm()
//! }
//!
//! TIMERS.init(TimerConfig::NTSC_320)?;
//! let id = TIMERS.register(TimerRequest::new(500, blink))?;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

pub mod config;
pub mod deadline;
pub mod mux;
pub mod request;
pub mod table;
pub mod trace;

pub use config::TimerConfig;
pub use deadline::Deadline;
pub use mux::{Diagnostics, IsrVectors, TimerMux};
pub use request::{Rearm, TimerCallback, TimerEvent, TimerRequest, ValidRequest, Work};
pub use table::{Settled, SlotTable, SlotView, TimerSlot};
pub use trace::{TraceHook, TraceRecord};

pub use frt_core::{TResult, TimerError, TimerId};
pub use frt_hal as hal;

/// Default number of timer slots
pub const MAX_TIMERS: usize = 16;

/// Declare a `static` [`TimerMux`] together with the interrupt handlers that
/// drive it.
///
/// ```ignore
/// define_timer_mux!(pub static TIMERS: SimFrt = SimFrt::new(););
/// define_timer_mux!(static SMALL: SimFrt = SimFrt::new(), slots = 4;);
/// ```
#[macro_export]
macro_rules! define_timer_mux {
    ($(#[$attr:meta])* $vis:vis static $name:ident: $hw:ty = $init:expr $(, slots = $slots:expr)?;) => {
        $(#[$attr])*
        $vis static $name: $crate::TimerMux<$hw $(, { $slots })?> = $crate::TimerMux::new(
            $init,
            $crate::IsrVectors {
                compare_a: {
                    fn compare_a() {
                        $name.on_compare_a()
                    }
                    compare_a
                },
                compare_b: {
                    fn compare_b() {
                        $name.on_compare_b()
                    }
                    compare_b
                },
                overflow: {
                    fn overflow() {
                        $name.on_overflow()
                    }
                    overflow
                },
            },
        );
    };
}

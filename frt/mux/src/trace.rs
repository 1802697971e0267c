//! Timer lifecycle trace records
//!
//! Records mirror the QS time-event records: arm, disarm, failed disarm,
//! expiry and the automatic disarm of a timer whose callback stopped it.
//! [`crate::TimerMux`] hands each record to an optional hook and, with the
//! `defmt` feature, logs it.

use frt_core::{TimerError, TimerId};

/// QS record: timer armed
pub const REC_ARM: u8 = 32;
/// QS record: timer freed because its callback returned `Stop`
pub const REC_AUTO_DISARM: u8 = 33;
/// QS record: cancel of an id that is not armed
pub const REC_DISARM_ATTEMPT: u8 = 34;
/// QS record: timer cancelled
pub const REC_DISARM: u8 = 35;
/// QS record: timer expired and its callback ran
pub const REC_POST: u8 = 37;
/// Registration refused
pub const REC_REJECTED: u8 = 70;

/// Lifecycle event of one timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRecord {
    Armed { id: TimerId, slot: usize, interval: u32 },
    Disarmed { id: TimerId, slot: usize },
    DisarmAttempt { id: TimerId },
    Fired { id: TimerId, slot: usize },
    AutoDisarm { id: TimerId, slot: usize },
    Rejected { error: TimerError },
}

impl TraceRecord {
    /// Numeric record type
    pub const fn code(&self) -> u8 {
        match self {
            TraceRecord::Armed { .. } => REC_ARM,
            TraceRecord::Disarmed { .. } => REC_DISARM,
            TraceRecord::DisarmAttempt { .. } => REC_DISARM_ATTEMPT,
            TraceRecord::Fired { .. } => REC_POST,
            TraceRecord::AutoDisarm { .. } => REC_AUTO_DISARM,
            TraceRecord::Rejected { .. } => REC_REJECTED,
        }
    }

    /// Timer the record refers to, if any
    pub const fn id(&self) -> Option<TimerId> {
        match self {
            TraceRecord::Armed { id, .. }
            | TraceRecord::Disarmed { id, .. }
            | TraceRecord::DisarmAttempt { id }
            | TraceRecord::Fired { id, .. }
            | TraceRecord::AutoDisarm { id, .. } => Some(*id),
            TraceRecord::Rejected { .. } => None,
        }
    }
}

/// Sink for trace records, run in the context that produced the record
pub type TraceHook = fn(&TraceRecord);

#[cfg(feature = "defmt")]
impl defmt::Format for TraceRecord {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TraceRecord::Armed { id, slot, interval } => {
                defmt::write!(fmt, "ARM {} slot={} interval={}", id, slot, interval)
            }
            TraceRecord::Disarmed { id, slot } => defmt::write!(fmt, "DISARM {} slot={}", id, slot),
            TraceRecord::DisarmAttempt { id } => defmt::write!(fmt, "DISARM_ATTEMPT {}", id),
            TraceRecord::Fired { id, slot } => defmt::write!(fmt, "POST {} slot={}", id, slot),
            TraceRecord::AutoDisarm { id, slot } => {
                defmt::write!(fmt, "AUTO_DISARM {} slot={}", id, slot)
            }
            TraceRecord::Rejected { error } => defmt::write!(fmt, "REJECTED {}", error),
        }
    }
}

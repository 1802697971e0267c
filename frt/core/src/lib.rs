#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # FRT Core
//!
//! Types shared by the free-running-timer crates: the error taxonomy, timer
//! handles, tick countdowns and interrupt priority levels. Nothing in here
//! touches hardware.

use core::fmt;

pub mod levels;
pub mod time;

pub use levels::*;
pub use time::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used by the timer operations
pub type TResult<T> = Result<T, TimerError>;

/// Errors reported by timer registration and cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Zero interval or missing callback
    InvalidArgument,
    /// Every slot of the table is occupied
    TableFull,
    /// No armed timer carries the requested id
    NotFound,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidArgument => write!(f, "Invalid timer request"),
            TimerError::TableFull => write!(f, "Timer table is full"),
            TimerError::NotFound => write!(f, "Timer not found"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TimerError::InvalidArgument => defmt::write!(fmt, "InvalidArgument"),
            TimerError::TableFull => defmt::write!(fmt, "TableFull"),
            TimerError::NotFound => defmt::write!(fmt, "NotFound"),
        }
    }
}

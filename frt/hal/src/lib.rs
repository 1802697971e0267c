//! Hardware abstraction for the free-running timer (FRT)
//!
//! The timer multiplexer consumes a single free-running 16-bit counter with
//! two compare channels and an overflow signal, plus an interrupt controller
//! whose mask level gates scoped critical sections. This crate describes
//! that contract as traits; a board port implements them on real registers.
//!
//! With the `sim` feature, [`sim::SimFrt`] provides a software model of both
//! pieces so the multiplexer can be driven deterministically on a host.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod counter;
pub mod error;
pub mod mask;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Re-export commonly used types
pub use counter::{ClockDivisor, FreeRunningCounter, Isr};
pub use error::{HalError, HalResult};
pub use frt_core::IrqLevel;
pub use mask::{with_masked, InterruptMask, MaskGuard};

//! Timer requests, fire events and the re-arm decision

use core::any::Any;
use core::fmt;
use core::num::NonZeroU32;

use frt_core::{TResult, TimerError, TimerId};

/// Opaque caller-owned context handed back on every fire
///
/// The multiplexer only copies the reference; the referent is never dropped
/// or mutated by it.
pub type Work = &'static (dyn Any + Send + Sync);

/// Callback run in interrupt context when a timer expires
pub type TimerCallback = fn(&TimerEvent) -> Rearm;

/// What a callback wants done with its timer after it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    /// Fire again after this many ticks, which also becomes the timer's
    /// interval from now on
    Continue(NonZeroU32),
    /// Free the slot; the timer never fires again
    Stop,
}

impl Rearm {
    /// Map a raw next interval to a decision, zero meaning [`Rearm::Stop`]
    pub const fn from_next_interval(ticks: u32) -> Self {
        match NonZeroU32::new(ticks) {
            Some(ticks) => Rearm::Continue(ticks),
            None => Rearm::Stop,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Rearm {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Rearm::Continue(ticks) => defmt::write!(fmt, "Continue({})", ticks.get()),
            Rearm::Stop => defmt::write!(fmt, "Stop"),
        }
    }
}

/// A timer as submitted by the caller
#[derive(Clone, Copy)]
pub struct TimerRequest {
    /// Period in milliseconds (ticks); zero is rejected
    pub interval: u32,
    /// Expiry callback; `None` is rejected
    pub callback: Option<TimerCallback>,
    /// Context passed back through [`TimerEvent::work`]
    pub work: Option<Work>,
}

impl TimerRequest {
    /// Request a periodic timer with no context
    pub const fn new(interval: u32, callback: TimerCallback) -> Self {
        Self {
            interval,
            callback: Some(callback),
            work: None,
        }
    }

    /// Attach a context reference
    pub const fn with_work(self, work: Work) -> Self {
        Self {
            work: Some(work),
            ..self
        }
    }

    /// Check the request, producing the form stored in the slot table
    pub fn validate(&self) -> TResult<ValidRequest> {
        let callback = self.callback.ok_or(TimerError::InvalidArgument)?;
        let interval = NonZeroU32::new(self.interval).ok_or(TimerError::InvalidArgument)?;
        Ok(ValidRequest {
            interval,
            callback,
            work: self.work,
        })
    }
}

impl fmt::Debug for TimerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRequest")
            .field("interval", &self.interval)
            .field("has_callback", &self.callback.is_some())
            .field("has_work", &self.work.is_some())
            .finish()
    }
}

/// A request that passed [`TimerRequest::validate`]
#[derive(Clone, Copy)]
pub struct ValidRequest {
    pub(crate) interval: NonZeroU32,
    pub(crate) callback: TimerCallback,
    pub(crate) work: Option<Work>,
}

impl ValidRequest {
    /// Validated interval
    pub fn interval(&self) -> NonZeroU32 {
        self.interval
    }
}

impl fmt::Debug for ValidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRequest")
            .field("interval", &self.interval)
            .field("has_work", &self.work.is_some())
            .finish()
    }
}

/// Built for each expiry and passed to the timer's callback
#[derive(Clone, Copy)]
pub struct TimerEvent {
    pub(crate) id: TimerId,
    pub(crate) request: ValidRequest,
}

impl TimerEvent {
    /// Handle of the expiring timer
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Interval the timer keeps if the callback returns [`TimerEvent::rearm`]
    pub fn next_interval(&self) -> NonZeroU32 {
        self.request.interval
    }

    /// Decision that keeps the current period
    pub fn rearm(&self) -> Rearm {
        Rearm::Continue(self.request.interval)
    }

    /// Context supplied at registration
    pub fn work(&self) -> Option<Work> {
        self.request.work
    }

    /// Context downcast to `T`, `None` if absent or of another type
    pub fn work_as<T: Any>(&self) -> Option<&'static T> {
        self.request.work.and_then(|work| work.downcast_ref::<T>())
    }

    /// Copy of the stored request
    pub fn request(&self) -> TimerRequest {
        TimerRequest {
            interval: self.request.interval.get(),
            callback: Some(self.request.callback),
            work: self.request.work,
        }
    }

    /// Run the callback and return its decision
    pub fn dispatch(&self) -> Rearm {
        (self.request.callback)(self)
    }
}

impl fmt::Debug for TimerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEvent")
            .field("id", &self.id)
            .field("next_interval", &self.request.interval)
            .finish()
    }
}

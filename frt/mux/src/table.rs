//! Fixed-capacity timer slot table
//!
//! The table is a plain data structure: it has no notion of interrupts or
//! locking. [`crate::TimerMux`] keeps one inside a critical-section mutex and
//! is the only thing that touches it from interrupt context.

use core::num::NonZeroU32;

use frt_core::{Countdown, TResult, TimerError, TimerId};

use crate::request::{Rearm, TimerEvent, ValidRequest};

/// An occupied table entry
#[derive(Clone, Copy)]
pub struct TimerSlot {
    id: TimerId,
    request: ValidRequest,
    remaining: Countdown,
}

impl TimerSlot {
    /// Handle issued at registration
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Current period
    pub fn interval(&self) -> NonZeroU32 {
        self.request.interval
    }

    /// Ticks left before the next fire
    pub fn remaining(&self) -> Countdown {
        self.remaining
    }
}

/// Read-only copy of an occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    pub slot: usize,
    pub id: TimerId,
    pub interval: u32,
    pub remaining: u32,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SlotView {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SlotView{{ slot: {}, id: {}, interval: {}, remaining: {} }}",
            self.slot,
            self.id,
            self.interval,
            self.remaining
        );
    }
}

/// How a fired slot ended up after its callback returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Countdown reloaded, slot still occupied
    Rearmed,
    /// Callback returned [`Rearm::Stop`], slot freed
    Freed,
    /// The slot no longer held the fired timer (cancelled during the
    /// callback); nothing was changed
    Vacated,
}

/// Table of `N` timer slots with a next-free hint and an id counter
pub struct SlotTable<const N: usize> {
    slots: [Option<TimerSlot>; N],
    next_free: usize,
    next_id: TimerId,
}

impl<const N: usize> SlotTable<N> {
    /// Create a table with every slot free
    pub const fn new() -> Self {
        const EMPTY: Option<TimerSlot> = None;
        Self {
            slots: [EMPTY; N],
            next_free: 0,
            next_id: TimerId::FIRST,
        }
    }

    /// Free every slot and restart id assignment
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.next_free = 0;
        self.next_id = TimerId::FIRST;
    }

    /// Occupy a slot with `request` and return its id and slot index.
    ///
    /// The hinted slot is tried first; when it is taken (or past the end) the
    /// table is scanned from index zero for the first free entry.
    pub fn insert(&mut self, request: ValidRequest) -> TResult<(TimerId, usize)> {
        let index = match self.slots.get(self.next_free) {
            Some(None) => self.next_free,
            _ => self
                .slots
                .iter()
                .position(Option::is_none)
                .ok_or(TimerError::TableFull)?,
        };

        let id = self.next_id;
        self.next_id = id.next();
        self.slots[index] = Some(TimerSlot {
            id,
            request,
            remaining: Countdown::new(request.interval.get()),
        });
        self.next_free = index + 1;

        Ok((id, index))
    }

    /// Free the slot holding `id` and return its index.
    ///
    /// The freed index becomes the hint for the next insertion.
    pub fn remove(&mut self, id: TimerId) -> TResult<usize> {
        let index = self.index_of(id).ok_or(TimerError::NotFound)?;
        self.slots[index] = None;
        self.next_free = index;
        Ok(index)
    }

    /// Id the next insertion will receive.
    ///
    /// Taken at the start of a tick and passed to [`SlotTable::countdown`]
    /// so that timers inserted while the tick runs wait for the next one.
    pub fn epoch(&self) -> TimerId {
        self.next_id
    }

    /// Count slot `index` down by one tick.
    ///
    /// Slots inserted at or after `epoch` are left alone. Returns the fire
    /// event when this tick expired the timer; the countdown is already
    /// reloaded with the current interval, and [`SlotTable::settle`] applies
    /// the callback's decision on top of it.
    pub fn countdown(&mut self, index: usize, epoch: TimerId) -> Option<TimerEvent> {
        let issued_since = self.next_id.raw().wrapping_sub(epoch.raw());
        let slot = self.slots.get_mut(index)?.as_mut()?;
        if slot.id.raw().wrapping_sub(epoch.raw()) < issued_since {
            return None;
        }
        if !slot.remaining.decrement() {
            return None;
        }
        slot.remaining.reload(slot.request.interval.get());
        Some(TimerEvent {
            id: slot.id,
            request: slot.request,
        })
    }

    /// Apply a callback's decision to slot `index`, provided it still
    /// holds timer `id`
    pub fn settle(&mut self, index: usize, id: TimerId, decision: Rearm) -> Settled {
        let Some(entry) = self.slots.get_mut(index) else {
            return Settled::Vacated;
        };
        if !matches!(entry, Some(slot) if slot.id == id) {
            return Settled::Vacated;
        }
        match decision {
            Rearm::Continue(ticks) => {
                if let Some(slot) = entry {
                    slot.request.interval = ticks;
                    slot.remaining.reload(ticks.get());
                }
                Settled::Rearmed
            }
            Rearm::Stop => {
                *entry = None;
                Settled::Freed
            }
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Maximum number of concurrent timers
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slot tried first by the next insertion
    pub fn next_free(&self) -> usize {
        self.next_free
    }

    /// Check if `id` is armed
    pub fn contains(&self, id: TimerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Occupied slot by index
    pub fn get(&self, index: usize) -> Option<&TimerSlot> {
        self.slots.get(index)?.as_ref()
    }

    /// Ticks before `id` fires next
    pub fn remaining(&self, id: TimerId) -> Option<u32> {
        let index = self.index_of(id)?;
        self.get(index).map(|slot| slot.remaining.ticks())
    }

    /// Views of the occupied slots in index order
    pub fn views(&self) -> impl Iterator<Item = SlotView> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.as_ref().map(|timer| SlotView {
                slot,
                id: timer.id,
                interval: timer.request.interval.get(),
                remaining: timer.remaining.ticks(),
            })
        })
    }

    fn index_of(&self, id: TimerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|entry| matches!(entry, Some(slot) if slot.id == id))
    }
}

impl<const N: usize> Default for SlotTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

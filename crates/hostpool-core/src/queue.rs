//! Time-ordered event queue and simulation clock.

use std::collections::{BTreeMap, VecDeque};

use crate::event::{Event, EventId, SimTime};

/// Event queue holding pending actions grouped by their fire time.
///
/// Events sharing a fire time are kept in scheduling order and are popped in that order. The queue also
/// owns the simulation clock: popping an event moves the clock to the event's time, and the clock never
/// moves backwards.
///
/// Draining the queue up to some time `t` is done by calling [`pop_due`](Self::pop_due) until it returns
/// `None`. Events scheduled while draining at the current time are appended to the current bucket, so
/// such chain reactions are fully settled before any later event is processed.
#[derive(Clone)]
pub struct EventQueue<A> {
    clock: SimTime,
    buckets: BTreeMap<SimTime, VecDeque<Event<A>>>,
    pending: usize,
    event_count: u64,
}

impl<A> Default for EventQueue<A> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<A> EventQueue<A> {
    /// Creates an empty queue with the clock set to `start`.
    pub fn new(start: SimTime) -> Self {
        Self {
            clock: start,
            buckets: BTreeMap::new(),
            pending: 0,
            event_count: 0,
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> SimTime {
        self.clock
    }

    /// Moves the clock forward to `time`.
    ///
    /// Panics if `time` is before the current time or if there are pending events before `time`.
    pub fn set_time(&mut self, time: SimTime) {
        if time < self.clock {
            panic!(
                "Clock can't move backwards (from {} to {})! It is not allowed to return to the past.",
                self.clock, time
            );
        }
        if let Some(next) = self.next_time() {
            if next < time {
                panic!(
                    "Clock can't skip pending events (next event at {}, requested time {})!",
                    next, time
                );
            }
        }
        self.clock = time;
    }

    /// Schedules an action at the given absolute time and returns the event id.
    ///
    /// Panics if `time` is before the current time.
    pub fn schedule(&mut self, time: SimTime, data: A) -> EventId {
        if time < self.clock {
            panic!(
                "Event time {} is before the current time {}! It is not allowed to add events from the past.",
                time, self.clock
            );
        }
        let id = self.event_count;
        self.buckets.entry(time).or_default().push_back(Event { id, time, data });
        self.event_count += 1;
        self.pending += 1;
        id
    }

    /// Schedules an action after the given delay.
    pub fn schedule_in(&mut self, delay: SimTime, data: A) -> EventId {
        self.schedule(self.clock + delay, data)
    }

    /// Schedules an action at the current time, after all actions already scheduled at this time.
    pub fn schedule_now(&mut self, data: A) -> EventId {
        self.schedule(self.clock, data)
    }

    /// Pops the next event if its fire time is not after `until`, moving the clock to the event's time.
    pub fn pop_due(&mut self, until: SimTime) -> Option<Event<A>> {
        let mut bucket = self.buckets.first_entry()?;
        if *bucket.key() > until {
            return None;
        }
        let event = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        let event = event?;
        self.pending -= 1;
        self.clock = event.time;
        Some(event)
    }

    /// Pops the next event regardless of its time.
    pub fn pop_next(&mut self) -> Option<Event<A>> {
        self.pop_due(SimTime::MAX)
    }

    /// Returns the fire time of the next pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.buckets.keys().next().copied()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.pending
    }

    /// Returns true if there are no pending events.
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Returns the total number of events scheduled so far.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Returns an iterator over pending events in the order they will fire.
    pub fn pending_events(&self) -> impl Iterator<Item = &Event<A>> {
        self.buckets.values().flat_map(|bucket| bucket.iter())
    }
}

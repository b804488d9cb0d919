//! Simulation events.

/// Simulation time in whole seconds.
///
/// Trace-driven runs use Unix timestamps, so the time also determines the calendar month used by statistics.
pub type SimTime = u64;

/// Event identifier.
///
/// Identifiers are assigned sequentially, so they also reflect the scheduling order.
pub type EventId = u64;

/// Action scheduled to fire at a given time.
#[derive(Clone, Debug, PartialEq)]
pub struct Event<A> {
    /// Unique event identifier.
    pub id: EventId,
    /// Time at which the event fires.
    pub time: SimTime,
    /// Action payload.
    pub data: A,
}

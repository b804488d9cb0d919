//! Discrete-event core of the host pool simulator.
//!
//! The core consists of a time-ordered [`EventQueue`] which doubles as the simulation clock, and a set of
//! logging macros ([`log_info!`], [`log_debug!`], etc.) which prefix messages with the simulation time and
//! the name of the logging component.
//!
//! Events are plain values of a user-defined action type. The queue does not know how to execute them:
//! the owner pops due events and dispatches them, which keeps the set of possible actions closed and
//! explicit.

#![warn(missing_docs)]

pub mod event;
pub mod log;
pub mod queue;

pub use colored;
pub use event::{Event, EventId, SimTime};
pub use queue::EventQueue;

//! Trace generators that are not needed to run the simulation itself.

pub mod synthetic_trace;

//! A library for capacity planning of dedicated host pools.
//!
//! The simulated pool leases hosts on demand up to a fixed limit. Every host is billed for a minimum usage
//! window, runs one instance at a time and must be scrubbed after each instance before it can be reused.
//! Workload requests that can't get a host right away wait in a FIFO backlog.
//!
//! The main entry point is [`simulation::PoolSimulation`]. Traces can be loaded from CSV files
//! ([`trace`]) or generated ([`extra::synthetic_trace`]).

pub mod action;
pub mod backlog;
pub mod config;
pub mod error;
pub mod extra;
pub mod host;
pub mod instance;
pub mod simulation;
pub mod stats;
pub mod trace;
pub mod util;

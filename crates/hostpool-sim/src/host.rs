//! Dedicated host model and the bounded host pool.
//!
//! Host lifecycle:
//!
//! ```text
//! created -> Available -> Busy -> Prescrubbing -> Scrubbing -> Available -> ...
//!                |                     |
//!                +-------> Released <--+
//! ```
//!
//! A host may be released only after its minimum usage window and only while nothing runs on it. Release
//! checks come from three sources (the minimum usage timer, the scrubbing decision after an instance
//! terminates, and the periodic scrubbing check of an idle host), so all of them are idempotent.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::Serialize;

use hostpool_core::{EventQueue, SimTime};

use crate::action::Action;
use crate::config::PoolConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::instance::InstanceId;
use crate::stats::PoolStats;
use crate::util::Counter;

pub type HostId = usize;

/// Status of a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HostState {
    /// Host is idle and can accept an instance.
    Available,
    /// Host runs an instance.
    Busy,
    /// Host is being scrubbed.
    Scrubbing,
    /// Instance has just terminated, scrubbing decision is pending.
    Prescrubbing,
    /// Host is returned to the provider.
    Released,
}

impl Display for HostState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            HostState::Available => write!(f, "available"),
            HostState::Busy => write!(f, "busy"),
            HostState::Scrubbing => write!(f, "scrubbing"),
            HostState::Prescrubbing => write!(f, "prescrubbing"),
            HostState::Released => write!(f, "released"),
        }
    }
}

/// Leased host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Host {
    pub id: HostId,
    /// Lease start.
    pub allocated_at: SimTime,
    /// Start of the period not yet accounted in host hours.
    pub available_at: SimTime,
    pub state: HostState,
    /// Instance occupying the host. Set if and only if the host is busy.
    pub instance: Option<InstanceId>,
    pub released_at: Option<SimTime>,
}

impl Host {
    fn new(id: HostId, time: SimTime) -> Self {
        Self {
            id,
            allocated_at: time,
            available_at: time,
            state: HostState::Available,
            instance: None,
            released_at: None,
        }
    }

    /// Returns the earliest time the host may be released.
    pub fn min_usage_end(&self, config: &PoolConfig) -> SimTime {
        self.allocated_at + config.min_usage
    }
}

/// Result of a host request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquired {
    /// An available host is reused.
    Reused(HostId),
    /// A new host is leased.
    Created(HostId),
}

impl Acquired {
    pub fn id(&self) -> HostId {
        match self {
            Acquired::Reused(id) | Acquired::Created(id) => *id,
        }
    }
}

/// Pool of leased hosts.
///
/// Live hosts are kept in id order, so reuse always picks the oldest available host.
#[derive(Clone, Default)]
pub struct HostPool {
    hosts: BTreeMap<HostId, Host>,
    available: BTreeSet<HostId>,
    released: Vec<Host>,
    host_counter: Counter,
}

impl HostPool {
    /// Returns an available host or leases a new one if the pool limit allows.
    ///
    /// The returned host is still available: the caller is expected to mark it busy right away.
    pub fn acquire(&mut self, config: &PoolConfig, queue: &mut EventQueue<Action>) -> Option<Acquired> {
        if let Some(&id) = self.available.iter().next() {
            return Some(Acquired::Reused(id));
        }
        if self.hosts.len() >= config.max_hosts {
            return None;
        }
        let id = self.host_counter.increment();
        let host = Host::new(id, queue.time());
        queue.schedule(host.min_usage_end(config), Action::HostRelease { host: id });
        self.hosts.insert(id, host);
        self.available.insert(id);
        Some(Acquired::Created(id))
    }

    /// Binds the instance to an available host.
    pub fn busy(&mut self, id: HostId, instance: InstanceId) -> SimulationResult<()> {
        let host = self.live_mut(id)?;
        if host.state != HostState::Available {
            return Err(SimulationError::InvalidHostTransition {
                id,
                state: host.state,
                operation: "busy",
            });
        }
        host.state = HostState::Busy;
        host.instance = Some(instance);
        self.available.remove(&id);
        Ok(())
    }

    /// Unbinds the terminated instance and leaves the host waiting for the scrubbing decision.
    pub fn unbind(&mut self, id: HostId, instance: InstanceId) -> SimulationResult<()> {
        let host = self.live_mut(id)?;
        if host.state != HostState::Busy || host.instance != Some(instance) {
            return Err(SimulationError::InvalidHostTransition {
                id,
                state: host.state,
                operation: "unbind",
            });
        }
        host.instance = None;
        host.state = HostState::Prescrubbing;
        Ok(())
    }

    /// Releases the host if it is due, otherwise starts scrubbing it.
    ///
    /// Returns true if scrubbing was started. Repeated requests, requests for a released host and requests
    /// for a host already taken by a new instance are ignored.
    pub fn scrubbing(
        &mut self,
        id: HostId,
        config: &PoolConfig,
        queue: &mut EventQueue<Action>,
        stats: &mut PoolStats,
    ) -> SimulationResult<bool> {
        if self.release(id, config, queue.time(), stats) {
            return Ok(false);
        }
        let Some(host) = self.hosts.get_mut(&id) else {
            return Ok(false);
        };
        match (host.state, host.instance) {
            (HostState::Scrubbing, _) => return Ok(false),
            (HostState::Busy, Some(_)) => return Ok(false),
            (HostState::Available | HostState::Prescrubbing, None) => {}
            (state, Some(instance)) => {
                return Err(SimulationError::HostBound {
                    id,
                    state,
                    instance,
                    operation: "scrub",
                })
            }
            (state, None) => {
                return Err(SimulationError::InvalidHostTransition {
                    id,
                    state,
                    operation: "scrub",
                })
            }
        }
        host.state = HostState::Scrubbing;
        self.available.remove(&id);
        queue.schedule_in(config.scrubbing_duration, Action::HostAvailable { host: id });
        Ok(true)
    }

    /// Finishes scrubbing. Returns false if the host was released meanwhile.
    pub fn available(
        &mut self,
        id: HostId,
        config: &PoolConfig,
        queue: &mut EventQueue<Action>,
        stats: &mut PoolStats,
    ) -> SimulationResult<bool> {
        let Some(host) = self.hosts.get_mut(&id) else {
            return Ok(false);
        };
        if host.state != HostState::Scrubbing {
            return Err(SimulationError::InvalidHostTransition {
                id,
                state: host.state,
                operation: "make available",
            });
        }
        let now = queue.time();
        stats.add_host_hours(now, now - host.available_at);
        host.state = HostState::Available;
        host.available_at = now;
        self.available.insert(id);
        queue.schedule_in(config.scrubbing_delay, Action::HostScrubbing { host: id });
        Ok(true)
    }

    /// Releases the host if its minimum usage window is over and it is idle or waiting for scrubbing.
    ///
    /// Returns true if the host was released by this call.
    pub fn release(&mut self, id: HostId, config: &PoolConfig, time: SimTime, stats: &mut PoolStats) -> bool {
        let Some(host) = self.hosts.get(&id) else {
            return false;
        };
        let releasable = matches!(host.state, HostState::Available | HostState::Prescrubbing);
        if !releasable || host.instance.is_some() || time < host.min_usage_end(config) {
            return false;
        }
        let Some(mut host) = self.hosts.remove(&id) else {
            return false;
        };
        stats.add_host_hours(time, time - host.available_at);
        host.state = HostState::Released;
        host.released_at = Some(time);
        self.available.remove(&id);
        self.released.push(host);
        true
    }

    /// Returns a live host.
    pub fn get(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(&id)
    }

    /// Returns the state of any host ever leased, including released ones.
    pub fn state(&self, id: HostId) -> Option<HostState> {
        if let Some(host) = self.hosts.get(&id) {
            Some(host.state)
        } else if id < self.host_counter.curr() {
            Some(HostState::Released)
        } else {
            None
        }
    }

    /// Returns an iterator over live hosts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// Returns released hosts in release order.
    pub fn released(&self) -> &[Host] {
        &self.released
    }

    /// Returns the number of live hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Returns the number of live hosts in the given state.
    ///
    /// Released hosts are not live, so for [`HostState::Released`] the number of hosts released so far is
    /// returned.
    pub fn count(&self, state: HostState) -> usize {
        match state {
            HostState::Available => self.available.len(),
            HostState::Released => self.released.len(),
            _ => self.hosts.values().filter(|h| h.state == state).count(),
        }
    }

    /// Returns the number of hosts leased since the start of the simulation.
    pub fn created_count(&self) -> usize {
        self.host_counter.curr()
    }

    fn live_mut(&mut self, id: HostId) -> SimulationResult<&mut Host> {
        let leased = self.host_counter.curr();
        match self.hosts.get_mut(&id) {
            Some(host) => Ok(host),
            None if id < leased => Err(SimulationError::InvalidHostTransition {
                id,
                state: HostState::Released,
                operation: "use",
            }),
            None => Err(SimulationError::UnknownHost(id)),
        }
    }
}

//! Instance model and registry.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::Serialize;

use hostpool_core::{EventQueue, SimTime};

use crate::action::Action;
use crate::backlog::{Backlog, WorkloadRequest};
use crate::config::PoolConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::host::{Acquired, HostId, HostPool};
use crate::stats::PoolStats;
use crate::util::Counter;

pub type InstanceId = usize;

/// Status of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum InstanceState {
    /// Instance is being initialized on its host.
    Initialize,
    /// Instance runs the workload.
    Busy,
    /// Instance is finished.
    Terminated,
}

impl Display for InstanceState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InstanceState::Initialize => write!(f, "initialize"),
            InstanceState::Busy => write!(f, "busy"),
            InstanceState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Execution of a single workload request on an exclusively occupied host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: InstanceId,
    pub allocated_at: SimTime,
    pub state: InstanceState,
    pub request: WorkloadRequest,
    pub host: HostId,
}

impl Instance {
    pub fn job(&self) -> &str {
        &self.request.job
    }

    pub fn stage(&self) -> &str {
        &self.request.stage
    }

    pub fn duration(&self) -> SimTime {
        self.request.duration
    }
}

/// Successful allocation of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub instance: InstanceId,
    pub host: Acquired,
}

/// Table of live instances.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    instances: IndexMap<InstanceId, Instance>,
    instance_counter: Counter,
}

impl InstanceRegistry {
    /// Creates an instance for the backlog request.
    ///
    /// Returns `None` if the request is no longer in the backlog (it was already served) or if no host can
    /// be acquired. The request itself is left in the backlog, removing it is up to the caller.
    pub fn allocate(
        &mut self,
        request: &WorkloadRequest,
        backlog: &Backlog,
        hosts: &mut HostPool,
        config: &PoolConfig,
        queue: &mut EventQueue<Action>,
    ) -> SimulationResult<Option<Allocation>> {
        if !backlog.contains(request) {
            return Ok(None);
        }
        let Some(acquired) = hosts.acquire(config, queue) else {
            return Ok(None);
        };
        let id = self.instance_counter.increment();
        hosts.busy(acquired.id(), id)?;
        let instance = Instance {
            id,
            allocated_at: queue.time(),
            state: InstanceState::Initialize,
            request: request.clone(),
            host: acquired.id(),
        };
        self.instances.insert(id, instance);
        queue.schedule_in(config.initialize_delay, Action::InstanceBusy { instance: id });
        Ok(Some(Allocation {
            instance: id,
            host: acquired,
        }))
    }

    /// Starts the workload on an initialized instance.
    pub fn busy(&mut self, id: InstanceId, queue: &mut EventQueue<Action>, stats: &mut PoolStats) -> SimulationResult<()> {
        let instance = self.live_mut(id, "set busy")?;
        if instance.state != InstanceState::Initialize {
            return Err(SimulationError::InvalidInstanceTransition {
                id,
                state: instance.state,
                operation: "set busy",
            });
        }
        instance.state = InstanceState::Busy;
        let duration = instance.duration();
        queue.schedule_in(duration, Action::InstanceTerminate { instance: id });
        stats.add_instance_hours(queue.time(), duration);
        Ok(())
    }

    /// Terminates the instance and passes its host to the scrubbing decision in the same instant.
    ///
    /// Returns the terminated instance, which is no longer kept in the registry.
    pub fn terminate(
        &mut self,
        id: InstanceId,
        hosts: &mut HostPool,
        config: &PoolConfig,
        queue: &mut EventQueue<Action>,
        stats: &mut PoolStats,
    ) -> SimulationResult<Instance> {
        self.live_mut(id, "terminate")?;
        let Some(mut instance) = self.instances.swap_remove(&id) else {
            return Err(SimulationError::UnknownInstance(id));
        };
        instance.state = InstanceState::Terminated;
        hosts.unbind(instance.host, id)?;
        hosts.scrubbing(instance.host, config, queue, stats)?;
        Ok(instance)
    }

    /// Returns a live instance.
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Returns the state of any instance ever created, including terminated ones.
    pub fn state(&self, id: InstanceId) -> Option<InstanceState> {
        if let Some(instance) = self.instances.get(&id) {
            Some(instance.state)
        } else if id < self.instance_counter.curr() {
            Some(InstanceState::Terminated)
        } else {
            None
        }
    }

    /// Returns an iterator over live instances.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    /// Returns the number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns the number of instances created since the start of the simulation.
    pub fn created_count(&self) -> usize {
        self.instance_counter.curr()
    }

    fn live_mut(&mut self, id: InstanceId, operation: &'static str) -> SimulationResult<&mut Instance> {
        let created = self.instance_counter.curr();
        match self.instances.get_mut(&id) {
            Some(instance) => Ok(instance),
            None if id < created => Err(SimulationError::InvalidInstanceTransition {
                id,
                state: InstanceState::Terminated,
                operation,
            }),
            None => Err(SimulationError::UnknownInstance(id)),
        }
    }
}

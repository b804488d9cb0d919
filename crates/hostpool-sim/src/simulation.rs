//! Simulation driver.

use std::fmt::{Display, Formatter};

use log::Level::Trace;
use log::log_enabled;
use serde::Serialize;
use serde_json::json;

use hostpool_core::{log_debug, log_error, log_info, log_trace, log_warn};
use hostpool_core::{Event, EventQueue, SimTime};

use crate::action::Action;
use crate::backlog::{Backlog, WorkloadRequest};
use crate::config::PoolConfig;
use crate::error::SimulationResult;
use crate::host::{Acquired, Host, HostId, HostPool, HostState};
use crate::instance::{Instance, InstanceId, InstanceRegistry};
use crate::stats::{PoolStats, MONTHS};
use crate::trace::WorkloadRecord;

/// Live counters of the pool at some moment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub time: SimTime,
    pub instances: usize,
    pub hosts: usize,
    pub busy: usize,
    pub scrubbing: usize,
    pub prescrubbing: usize,
    pub available: usize,
    pub events: usize,
    pub backlog: usize,
}

impl Display for PoolSnapshot {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "INSTANCES: {} HOSTS: total: {} busy: {} scrub: {} avail: {} EVENTS: {} QUEUE: {}",
            self.instances, self.hosts, self.busy, self.scrubbing, self.available, self.events, self.backlog
        )
    }
}

/// Aggregated results of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub end_time: SimTime,
    pub requests: u64,
    pub allocations: u64,
    pub delayed_allocations: u64,
    pub hosts_created: usize,
    pub max_instances: usize,
    pub max_hosts: usize,
    pub max_backlog: usize,
    pub max_wait_minutes: f64,
    pub host_hours: [f64; MONTHS],
    pub instance_hours: [f64; MONTHS],
    pub queue_hours: [f64; MONTHS],
    pub mean_wait_minutes: [f64; MONTHS],
}

/// Simulation of a dedicated host pool serving a stream of workload requests.
///
/// The driver is expected to [submit](Self::submit_workload) requests in non-decreasing order of their
/// start times and to [advance](Self::advance_to) the simulation to each start time, then call
/// [`finalize`](Self::finalize). [`run_trace`](Self::run_trace) does exactly that.
///
/// A returned error means that the simulation state is inconsistent, so the simulation must not be used
/// after it.
pub struct PoolSimulation {
    name: String,
    config: PoolConfig,
    queue: EventQueue<Action>,
    hosts: HostPool,
    instances: InstanceRegistry,
    backlog: Backlog,
    stats: PoolStats,
    requests: u64,
}

impl PoolSimulation {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            name: "pool".to_string(),
            config,
            queue: EventQueue::new(0),
            hosts: HostPool::default(),
            instances: InstanceRegistry::default(),
            backlog: Backlog::default(),
            stats: PoolStats::default(),
            requests: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> SimTime {
        self.queue.time()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Puts a new request into the backlog.
    ///
    /// The first allocation attempt for the request is made by the next [`advance_to`](Self::advance_to)
    /// call reaching its start time.
    pub fn submit_workload(&mut self, start: SimTime, duration: SimTime, job: impl Into<String>, stage: impl Into<String>) {
        self.submit(WorkloadRequest::new(start, duration, job, stage));
    }

    /// Submits the trace record and advances the simulation to its start time.
    pub fn run_request(&mut self, record: &WorkloadRecord) -> SimulationResult<()> {
        self.submit(record.into());
        self.advance_to(record.start_time)
    }

    /// Runs the whole trace and returns the final statistics.
    pub fn run_trace<'a, I>(&mut self, records: I) -> SimulationResult<Summary>
    where
        I: IntoIterator<Item = &'a WorkloadRecord>,
    {
        for record in records {
            self.run_request(record)?;
        }
        self.finalize()
    }

    /// Makes a tick at `time`: offers every arrived backlog request an allocation attempt and processes all
    /// events up to `time`, including the ones caused by processing.
    ///
    /// A tick before the current time is made at the current time.
    pub fn advance_to(&mut self, time: SimTime) -> SimulationResult<()> {
        let now = self.queue.time();
        let tick = if time < now {
            log_warn!(self, "tick {} is in the past, reconciling at the current time", time);
            now
        } else {
            time
        };
        for request in self.backlog.iter().filter(|r| r.start_time <= tick) {
            self.queue.schedule(tick, Action::AllocateRequest(request.clone()));
        }
        while let Some(event) = self.queue.pop_due(tick) {
            if let Err(err) = self.on_event(event) {
                log_error!(self, "simulation aborted: {}", err);
                return Err(err);
            }
        }
        self.queue.set_time(tick);
        self.stats
            .update_peaks(self.instances.len(), self.hosts.len(), self.backlog.len());
        log_debug!(self, "{}", self.snapshot());
        Ok(())
    }

    /// Ticks in `tick_step` increments until there are neither pending events nor waiting requests.
    pub fn finalize(&mut self) -> SimulationResult<Summary> {
        self.finalize_with(|_| {})
    }

    /// Same as [`finalize`](Self::finalize), calling `on_tick` after every tick.
    pub fn finalize_with<F>(&mut self, mut on_tick: F) -> SimulationResult<Summary>
    where
        F: FnMut(&PoolSimulation),
    {
        while !self.backlog.is_empty() || !self.queue.is_empty() {
            let tick = self.queue.time() + self.config.tick_step;
            self.advance_to(tick)?;
            on_tick(self);
        }
        let summary = self.summary();
        log_info!(
            self,
            "finished: {} requests, {} hosts leased, peak {} hosts, peak wait {:.2} min",
            summary.requests,
            summary.hosts_created,
            summary.max_hosts,
            summary.max_wait_minutes
        );
        Ok(summary)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            time: self.queue.time(),
            instances: self.instances.len(),
            hosts: self.hosts.len(),
            busy: self.hosts.count(HostState::Busy),
            scrubbing: self.hosts.count(HostState::Scrubbing),
            prescrubbing: self.hosts.count(HostState::Prescrubbing),
            available: self.hosts.count(HostState::Available),
            events: self.queue.len(),
            backlog: self.backlog.len(),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            end_time: self.queue.time(),
            requests: self.requests,
            allocations: self.stats.allocations,
            delayed_allocations: self.stats.delayed_allocations,
            hosts_created: self.hosts.created_count(),
            max_instances: self.stats.max_instances,
            max_hosts: self.stats.max_hosts,
            max_backlog: self.stats.max_backlog,
            max_wait_minutes: self.stats.max_wait_minutes,
            host_hours: self.stats.host_hours,
            instance_hours: self.stats.instance_hours,
            queue_hours: self.stats.queue_hours,
            mean_wait_minutes: self.stats.mean_wait_minutes(),
        }
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub fn hosts(&self) -> &HostPool {
        &self.hosts
    }

    pub fn host(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn backlog(&self) -> &Backlog {
        &self.backlog
    }

    /// Returns the number of pending events.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &EventQueue<Action> {
        &self.queue
    }

    fn submit(&mut self, request: WorkloadRequest) {
        log_trace!(self, "new request {}", request);
        self.backlog.push(request);
        self.requests += 1;
    }

    fn on_event(&mut self, event: Event<Action>) -> SimulationResult<()> {
        if log_enabled!(Trace) {
            log_trace!(self, "{}", json!({"id": event.id, "time": event.time, "action": event.data}));
        }
        match event.data {
            Action::AllocateRequest(request) => self.on_allocate_request(request),
            Action::InstanceBusy { instance } => self.instances.busy(instance, &mut self.queue, &mut self.stats),
            Action::InstanceTerminate { instance } => self.on_instance_terminate(instance),
            Action::HostAvailable { host } => self.on_host_available(host),
            Action::HostScrubbing { host } => {
                self.hosts
                    .scrubbing(host, &self.config, &mut self.queue, &mut self.stats)?;
                self.log_if_released(host);
                Ok(())
            }
            Action::HostRelease { host } => {
                let now = self.queue.time();
                self.hosts.release(host, &self.config, now, &mut self.stats);
                self.log_if_released(host);
                Ok(())
            }
        }
    }

    fn on_allocate_request(&mut self, request: WorkloadRequest) -> SimulationResult<()> {
        let allocation = self.instances.allocate(
            &request,
            &self.backlog,
            &mut self.hosts,
            &self.config,
            &mut self.queue,
        )?;
        let Some(allocation) = allocation else {
            return Ok(());
        };
        let now = self.queue.time();
        match allocation.host {
            Acquired::Created(host) => {
                log_debug!(self, "instance i-{} for {} on new host h-{}", allocation.instance, request, host)
            }
            Acquired::Reused(host) => {
                log_debug!(self, "instance i-{} for {} on host h-{}", allocation.instance, request, host)
            }
        }
        if let Some(wait) = self.stats.on_allocation(now, request.start_time) {
            if self.config.is_long_wait(now - request.start_time) {
                log_warn!(self, "too long time waited in queue: {:.2} min for {}", wait, request);
            }
        }
        self.backlog.remove(&request);
        Ok(())
    }

    fn on_instance_terminate(&mut self, id: InstanceId) -> SimulationResult<()> {
        let instance = self
            .instances
            .terminate(id, &mut self.hosts, &self.config, &mut self.queue, &mut self.stats)?;
        log_debug!(self, "instance i-{} for {} terminated", id, instance.request);
        self.log_if_released(instance.host);
        Ok(())
    }

    fn on_host_available(&mut self, host: HostId) -> SimulationResult<()> {
        let became_available = self
            .hosts
            .available(host, &self.config, &mut self.queue, &mut self.stats)?;
        if !became_available {
            return Ok(());
        }
        // serve the oldest waiting request right away instead of waiting for the next tick
        let now = self.queue.time();
        let oldest = self.backlog.front().filter(|r| r.start_time <= now).cloned();
        if let Some(request) = oldest {
            self.on_allocate_request(request)?;
        }
        Ok(())
    }

    fn log_if_released(&self, host: HostId) {
        if let Some(released) = self.hosts.released().last() {
            if released.id == host && released.released_at == Some(self.queue.time()) {
                log_debug!(self, "host h-{} released", host);
            }
        }
    }
}

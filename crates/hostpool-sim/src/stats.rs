//! Monthly utilization and queue statistics.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use hostpool_core::SimTime;

pub const MONTHS: usize = 12;

pub const MONTH_NAMES: [&str; MONTHS] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Returns the zero-based calendar month (UTC) of the simulation time.
pub fn month_of(time: SimTime) -> usize {
    i64::try_from(time)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|date| date.month0() as usize)
        .unwrap_or(0)
}

fn hours(seconds: SimTime) -> f64 {
    seconds as f64 / 3600.
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SampleMetric {
    data: Vec<f64>,
}

impl SampleMetric {
    pub fn add(&mut self, x: f64) {
        self.data.push(x);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Returns the sample mean, or zero for an empty sample.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            0.
        } else {
            self.sum() / (self.data.len() as f64)
        }
    }
}

/// Counters accumulated during the run.
///
/// Monthly buckets are indexed by the month of the time at which a value is accrued.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PoolStats {
    pub host_hours: [f64; MONTHS],
    pub instance_hours: [f64; MONTHS],
    pub queue_hours: [f64; MONTHS],
    pub queue_wait_minutes: [SampleMetric; MONTHS],
    pub allocations: u64,
    pub delayed_allocations: u64,
    pub max_instances: usize,
    pub max_hosts: usize,
    pub max_backlog: usize,
    pub max_wait_minutes: f64,
}

impl PoolStats {
    pub fn add_host_hours(&mut self, time: SimTime, seconds: SimTime) {
        self.host_hours[month_of(time)] += hours(seconds);
    }

    pub fn add_instance_hours(&mut self, time: SimTime, seconds: SimTime) {
        self.instance_hours[month_of(time)] += hours(seconds);
    }

    /// Accounts a successful allocation made at `time` for a request that was expected to start at
    /// `requested`. Returns the queue wait in minutes if the allocation was delayed.
    pub fn on_allocation(&mut self, time: SimTime, requested: SimTime) -> Option<f64> {
        self.allocations += 1;
        if time == requested {
            return None;
        }
        let wait = time.saturating_sub(requested);
        let month = month_of(time);
        let minutes = wait as f64 / 60.;
        self.delayed_allocations += 1;
        self.queue_hours[month] += hours(wait);
        self.queue_wait_minutes[month].add(minutes);
        self.max_wait_minutes = self.max_wait_minutes.max(minutes);
        Some(minutes)
    }

    pub fn update_peaks(&mut self, instances: usize, hosts: usize, backlog: usize) {
        self.max_instances = self.max_instances.max(instances);
        self.max_hosts = self.max_hosts.max(hosts);
        self.max_backlog = self.max_backlog.max(backlog);
    }

    pub fn mean_wait_minutes(&self) -> [f64; MONTHS] {
        let mut res = [0.; MONTHS];
        for (month, metric) in self.queue_wait_minutes.iter().enumerate() {
            res[month] = metric.mean();
        }
        res
    }

    pub fn total_host_hours(&self) -> f64 {
        self.host_hours.iter().sum()
    }

    pub fn total_instance_hours(&self) -> f64 {
        self.instance_hours.iter().sum()
    }

    pub fn total_queue_hours(&self) -> f64 {
        self.queue_hours.iter().sum()
    }
}

//! Backlog of workload requests waiting for a host.

use std::collections::{HashMap, VecDeque};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use hostpool_core::SimTime;

/// Workload request as it arrives from the trace.
///
/// The whole tuple is the identity of a request: two requests with equal fields are indistinguishable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadRequest {
    /// Requested start time.
    pub start_time: SimTime,
    /// Execution time in seconds.
    pub duration: SimTime,
    /// Job name.
    pub job: String,
    /// Stage name.
    pub stage: String,
}

impl WorkloadRequest {
    /// Creates new request.
    pub fn new(start_time: SimTime, duration: SimTime, job: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            start_time,
            duration,
            job: job.into(),
            stage: stage.into(),
        }
    }
}

impl Display for WorkloadRequest {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.start_time, self.duration, self.job, self.stage)
    }
}

/// FIFO of requests not yet bound to an instance.
///
/// Identical requests are counted, so membership checks behave as for a multiset.
#[derive(Clone, Default)]
pub struct Backlog {
    queue: VecDeque<WorkloadRequest>,
    counts: HashMap<WorkloadRequest, usize>,
}

impl Backlog {
    /// Appends a request to the end of the backlog.
    pub fn push(&mut self, request: WorkloadRequest) {
        *self.counts.entry(request.clone()).or_default() += 1;
        self.queue.push_back(request);
    }

    /// Checks whether the backlog still holds the request.
    pub fn contains(&self, request: &WorkloadRequest) -> bool {
        self.counts.contains_key(request)
    }

    /// Removes the oldest occurrence of the request. Returns false if there is none.
    pub fn remove(&mut self, request: &WorkloadRequest) -> bool {
        let Some(count) = self.counts.get_mut(request) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(request);
        }
        if let Some(pos) = self.queue.iter().position(|r| r == request) {
            self.queue.remove(pos);
        }
        true
    }

    /// Returns the oldest request.
    pub fn front(&self) -> Option<&WorkloadRequest> {
        self.queue.front()
    }

    /// Returns an iterator over requests, oldest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, WorkloadRequest> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_requests_are_counted() {
        let mut backlog = Backlog::default();
        let a = WorkloadRequest::new(0, 60, "job", "build");
        let b = WorkloadRequest::new(0, 60, "job", "test");
        backlog.push(a.clone());
        backlog.push(b.clone());
        backlog.push(a.clone());
        assert_eq!(backlog.len(), 3);

        assert!(backlog.remove(&a));
        assert!(backlog.contains(&a));
        assert_eq!(backlog.front(), Some(&b));
        assert!(backlog.remove(&a));
        assert!(!backlog.contains(&a));
        assert!(!backlog.remove(&a));
        assert_eq!(backlog.len(), 1);
    }
}

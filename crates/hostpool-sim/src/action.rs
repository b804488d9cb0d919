//! Actions that can be scheduled in the simulation.

use serde::Serialize;

use crate::backlog::WorkloadRequest;
use crate::host::HostId;
use crate::instance::InstanceId;

/// Closed set of actions carried by simulation events.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Action {
    /// Try to create an instance for the backlog request.
    AllocateRequest(WorkloadRequest),
    /// Instance finished initializing and starts running its workload.
    InstanceBusy { instance: InstanceId },
    /// Instance finished its workload.
    InstanceTerminate { instance: InstanceId },
    /// Host finished scrubbing.
    HostAvailable { host: HostId },
    /// Periodic scrubbing check of an idle host.
    HostScrubbing { host: HostId },
    /// Minimum usage window of a host has expired.
    HostRelease { host: HostId },
}

//! Error types.

use thiserror::Error;

use crate::host::{HostId, HostState};
use crate::instance::{InstanceId, InstanceState};

/// Fatal simulation errors.
///
/// Each of them means that an impossible sequence of events was scheduled. The run has to stop because
/// statistics collected after a broken invariant are meaningless.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("unable to {operation} host h-{id} in state {state}")]
    InvalidHostTransition {
        id: HostId,
        state: HostState,
        operation: &'static str,
    },

    #[error("unable to {operation} host h-{id} in state {state}: bound to instance i-{instance}")]
    HostBound {
        id: HostId,
        state: HostState,
        instance: InstanceId,
        operation: &'static str,
    },

    #[error("unable to {operation} instance i-{id} in state {state}")]
    InvalidInstanceTransition {
        id: InstanceId,
        state: InstanceState,
        operation: &'static str,
    },

    #[error("host h-{0} does not exist")]
    UnknownHost(HostId),

    #[error("instance i-{0} does not exist")]
    UnknownInstance(InstanceId),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

/// Errors of loading the pool configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("can't parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors of reading or generating workload traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("can't read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("can't parse trace: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid synthetic trace config: {0}")]
    InvalidSynthetic(String),
}

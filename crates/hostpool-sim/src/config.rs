//! Pool configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use hostpool_core::SimTime;

use crate::error::ConfigError;

/// Maximum number of hosts leased at the same time.
pub const POOL_MAX_HOSTS: usize = 500;
/// Minimum billable usage of a host (24h).
pub const POOL_MIN_USAGE_SEC: SimTime = 24 * 3600;
/// Duration of host scrubbing (1h30m).
pub const POOL_SCRUBBING_SEC: SimTime = 90 * 60;
/// Delay between a host becoming available and the next scrubbing check (5m).
pub const POOL_SCRUBBING_DELAY_SEC: SimTime = 5 * 60;
/// Instance initialization time (7m).
pub const POOL_INSTANCE_INITIALIZE_SEC: SimTime = 7 * 60;
/// Step of the driver once the input is exhausted (10m).
pub const TICK_STEP_SEC: SimTime = 10 * 60;
/// Queue wait after which a warning is logged (10m).
pub const WAIT_WARNING_THRESHOLD_SEC: SimTime = 10 * 60;

/// Holds raw pool config parsed from YAML file.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
struct RawPoolConfig {
    pub max_hosts: Option<usize>,
    pub min_usage: Option<SimTime>,
    pub scrubbing_duration: Option<SimTime>,
    pub scrubbing_delay: Option<SimTime>,
    pub initialize_delay: Option<SimTime>,
    pub tick_step: Option<SimTime>,
    pub wait_warning_threshold: Option<SimTime>,
}

/// Represents pool policy. All durations are in seconds.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Maximum number of hosts in the pool.
    pub max_hosts: usize,
    /// Minimum time a host is kept (and billed) after its allocation.
    pub min_usage: SimTime,
    /// Time needed to scrub a host after an instance terminated on it.
    pub scrubbing_duration: SimTime,
    /// Delay after a host becomes available before it is checked for release or scrubbed again.
    pub scrubbing_delay: SimTime,
    /// Time from instance allocation until it starts running the workload.
    pub initialize_delay: SimTime,
    /// Driver step used to finish the simulation after the input is exhausted.
    pub tick_step: SimTime,
    /// Queue wait above which a warning is logged.
    pub wait_warning_threshold: SimTime,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_raw(RawPoolConfig::default())
    }
}

impl PoolConfig {
    fn from_raw(raw: RawPoolConfig) -> Self {
        Self {
            max_hosts: raw.max_hosts.unwrap_or(POOL_MAX_HOSTS),
            min_usage: raw.min_usage.unwrap_or(POOL_MIN_USAGE_SEC),
            scrubbing_duration: raw.scrubbing_duration.unwrap_or(POOL_SCRUBBING_SEC),
            scrubbing_delay: raw.scrubbing_delay.unwrap_or(POOL_SCRUBBING_DELAY_SEC),
            initialize_delay: raw.initialize_delay.unwrap_or(POOL_INSTANCE_INITIALIZE_SEC),
            tick_step: raw.tick_step.unwrap_or(TICK_STEP_SEC),
            wait_warning_threshold: raw.wait_warning_threshold.unwrap_or(WAIT_WARNING_THRESHOLD_SEC),
        }
    }

    /// Creates pool config from YAML text (uses default values if some parameters are absent).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawPoolConfig = if yaml.trim().is_empty() {
            RawPoolConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let config = Self::from_raw(raw);
        config.validate()?;
        Ok(config)
    }

    /// Creates pool config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks that the simulation can make progress with this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hosts == 0 {
            return Err(ConfigError::Invalid("max_hosts must be positive".to_string()));
        }
        if self.tick_step == 0 {
            return Err(ConfigError::Invalid("tick_step must be positive".to_string()));
        }
        // an idle host cycles through scrubbing until its release, the cycle must take time
        if self.scrubbing_duration + self.scrubbing_delay == 0 {
            return Err(ConfigError::Invalid(
                "scrubbing_duration and scrubbing_delay can't both be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks whether a queue wait (in seconds) is long enough to be reported.
    pub fn is_long_wait(&self, wait: SimTime) -> bool {
        wait > self.wait_warning_threshold
    }
}

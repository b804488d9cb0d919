use std::io::Write;

use hostpool_sim::config::{PoolConfig, POOL_MAX_HOSTS, POOL_SCRUBBING_SEC};
use hostpool_sim::error::{ConfigError, TraceError};
use hostpool_sim::simulation::PoolSimulation;
use hostpool_sim::trace::{is_ordered_by_time, load_trace, read_trace, write_trace, WorkloadRecord};

mod common;
use common::assert_float_eq;

#[test]
fn test_partial_yaml_config() {
    let config = PoolConfig::from_yaml_str("max_hosts: 20\nmin_usage: 3600\n").unwrap();
    assert_eq!(config.max_hosts, 20);
    assert_eq!(config.min_usage, 3600);
    assert_eq!(config.scrubbing_duration, POOL_SCRUBBING_SEC);
    assert_eq!(PoolConfig::from_yaml_str("").unwrap(), PoolConfig::default());
    assert_eq!(PoolConfig::default().max_hosts, POOL_MAX_HOSTS);
}

#[test]
fn test_invalid_config() {
    assert!(matches!(
        PoolConfig::from_yaml_str("max_hosts: 0"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        PoolConfig::from_yaml_str("tick_step: 0"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        PoolConfig::from_yaml_str("max_hosts: [1, 2]"),
        Err(ConfigError::Yaml(_))
    ));
    assert!(matches!(
        PoolConfig::from_yaml_str("scrubbing_duration: 0\nscrubbing_delay: 0\n"),
        Err(ConfigError::Invalid(_))
    ));
    let config = PoolConfig::from_yaml_str("scrubbing_duration: 0\nscrubbing_delay: 60\n").unwrap();
    assert_eq!(config.scrubbing_duration, 0);
    assert!(matches!(
        PoolConfig::from_file("/nonexistent/pool.yaml"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_trace_file() {
    let records = vec![
        WorkloadRecord::new(0, 3600, "nightly", "build"),
        WorkloadRecord::new(60, 1800, "nightly", "test"),
        WorkloadRecord::new(60, 1800, "pr-17", "test"),
    ];
    let path = std::env::temp_dir().join(format!("hostpool-trace-{}.csv", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    write_trace(&mut file, &records).unwrap();
    file.flush().unwrap();

    let loaded = load_trace(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, records);
    assert!(is_ordered_by_time(&loaded));

    let mut sim = PoolSimulation::new(PoolConfig::default());
    let summary = sim.run_trace(&loaded).unwrap();
    assert_eq!(summary.allocations, 3);
    assert_eq!(summary.hosts_created, 3);
    assert_float_eq(summary.instance_hours.iter().sum(), 2., 1e-9);
}

#[test]
fn test_missing_trace_file() {
    assert!(matches!(load_trace("/nonexistent/trace.csv"), Err(TraceError::Io(_))));
}

#[test]
fn test_unordered_trace() {
    let data = "startTime,endTime,executionTime,jobName,stageName\n300,360,60,a,b\n100,160,60,a,c\n";
    let records = read_trace(data.as_bytes()).unwrap();
    assert!(!is_ordered_by_time(&records));
}

#[test]
fn test_long_wait_threshold() {
    let config = PoolConfig::default();
    assert!(!config.is_long_wait(599));
    assert!(!config.is_long_wait(600));
    assert!(config.is_long_wait(601));
}

#[test]
fn test_zero_scrubbing_delay_makes_progress() {
    let config = PoolConfig::from_yaml_str("scrubbing_duration: 60\nscrubbing_delay: 0\n").unwrap();
    let mut sim = PoolSimulation::new(config);
    sim.submit_workload(0, 60, "A", "1");
    sim.advance_to(0).unwrap();
    sim.advance_to(480).unwrap();
    let summary = sim.finalize().unwrap();
    assert_eq!(summary.allocations, 1);
    assert!(sim.hosts().is_empty());
}

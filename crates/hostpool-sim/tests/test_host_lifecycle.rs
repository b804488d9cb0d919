use hostpool_core::EventQueue;
use hostpool_sim::action::Action;
use hostpool_sim::config::PoolConfig;
use hostpool_sim::error::SimulationError;
use hostpool_sim::host::{Acquired, HostPool, HostState};
use hostpool_sim::stats::PoolStats;

mod common;
use common::assert_float_eq;

fn small_config() -> PoolConfig {
    PoolConfig {
        max_hosts: 2,
        ..Default::default()
    }
}

#[test]
fn test_acquire_reuses_available_host() {
    let config = small_config();
    let mut queue = EventQueue::<Action>::new(0);
    let mut pool = HostPool::default();

    assert_eq!(pool.acquire(&config, &mut queue), Some(Acquired::Created(0)));
    // not bound yet, so the same host is offered again
    assert_eq!(pool.acquire(&config, &mut queue), Some(Acquired::Reused(0)));
    pool.busy(0, 0).unwrap();
    assert_eq!(pool.acquire(&config, &mut queue), Some(Acquired::Created(1)));
    pool.busy(1, 1).unwrap();
    assert_eq!(pool.acquire(&config, &mut queue), None);
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.count(HostState::Busy), 2);

    let releases: Vec<_> = queue.pending_events().map(|e| (e.time, e.data.clone())).collect();
    assert_eq!(
        releases,
        vec![
            (config.min_usage, Action::HostRelease { host: 0 }),
            (config.min_usage, Action::HostRelease { host: 1 }),
        ]
    );
}

#[test]
fn test_busy_requires_available_host() {
    let config = small_config();
    let mut queue = EventQueue::<Action>::new(0);
    let mut pool = HostPool::default();
    pool.acquire(&config, &mut queue);
    pool.busy(0, 7).unwrap();
    assert_eq!(
        pool.busy(0, 8),
        Err(SimulationError::InvalidHostTransition {
            id: 0,
            state: HostState::Busy,
            operation: "busy",
        })
    );
    assert_eq!(pool.busy(5, 8), Err(SimulationError::UnknownHost(5)));
    assert_eq!(pool.get(0).unwrap().instance, Some(7));
}

#[test]
fn test_scrubbing_cycle() {
    let config = small_config();
    let mut queue = EventQueue::<Action>::new(0);
    let mut stats = PoolStats::default();
    let mut pool = HostPool::default();
    pool.acquire(&config, &mut queue);
    pool.busy(0, 0).unwrap();

    queue.set_time(1000);
    // still running its instance
    assert_eq!(pool.scrubbing(0, &config, &mut queue, &mut stats), Ok(false));
    pool.unbind(0, 0).unwrap();
    assert_eq!(pool.state(0), Some(HostState::Prescrubbing));
    assert_eq!(pool.scrubbing(0, &config, &mut queue, &mut stats), Ok(true));
    assert_eq!(pool.state(0), Some(HostState::Scrubbing));
    // repeated request is a no-op
    assert_eq!(pool.scrubbing(0, &config, &mut queue, &mut stats), Ok(false));

    let available_at = 1000 + config.scrubbing_duration;
    assert_eq!(
        queue.pending_events().next().map(|e| (e.time, e.data.clone())),
        Some((available_at, Action::HostAvailable { host: 0 }))
    );
    queue.set_time(available_at);
    assert_eq!(pool.available(0, &config, &mut queue, &mut stats), Ok(true));
    assert_eq!(pool.state(0), Some(HostState::Available));
    assert_float_eq(stats.total_host_hours(), available_at as f64 / 3600., 1e-9);
    assert_eq!(pool.get(0).unwrap().available_at, available_at);
    assert_eq!(
        pool.available(0, &config, &mut queue, &mut stats),
        Err(SimulationError::InvalidHostTransition {
            id: 0,
            state: HostState::Available,
            operation: "make available",
        })
    );
}

#[test]
fn test_release_respects_min_usage() {
    let config = small_config();
    let mut queue = EventQueue::<Action>::new(0);
    let mut stats = PoolStats::default();
    let mut pool = HostPool::default();
    pool.acquire(&config, &mut queue);

    assert!(!pool.release(0, &config, config.min_usage - 1, &mut stats));
    pool.busy(0, 0).unwrap();
    assert!(!pool.release(0, &config, config.min_usage, &mut stats));
    pool.unbind(0, 0).unwrap();

    queue.set_time(config.min_usage);
    // the scrubbing decision releases a host that is due
    assert_eq!(pool.scrubbing(0, &config, &mut queue, &mut stats), Ok(false));
    assert_eq!(pool.state(0), Some(HostState::Released));
    assert!(pool.is_empty());
    assert_eq!(pool.released()[0].released_at, Some(config.min_usage));
    assert_float_eq(stats.total_host_hours(), 24., 1e-9);

    // every later trigger is a no-op
    assert!(!pool.release(0, &config, config.min_usage + 1, &mut stats));
    assert_eq!(pool.scrubbing(0, &config, &mut queue, &mut stats), Ok(false));
    assert_eq!(pool.available(0, &config, &mut queue, &mut stats), Ok(false));
    assert_eq!(
        pool.busy(0, 1),
        Err(SimulationError::InvalidHostTransition {
            id: 0,
            state: HostState::Released,
            operation: "use",
        })
    );
    assert_eq!(pool.state(1), None);
}

#[test]
fn test_released_host_frees_capacity() {
    let config = PoolConfig {
        max_hosts: 1,
        ..Default::default()
    };
    let mut queue = EventQueue::<Action>::new(0);
    let mut stats = PoolStats::default();
    let mut pool = HostPool::default();
    pool.acquire(&config, &mut queue);
    pool.busy(0, 0).unwrap();
    assert_eq!(pool.acquire(&config, &mut queue), None);
    pool.unbind(0, 0).unwrap();
    queue.set_time(config.min_usage);
    assert!(pool.release(0, &config, queue.time(), &mut stats));
    assert_eq!(pool.acquire(&config, &mut queue), Some(Acquired::Created(1)));
    assert_eq!(pool.created_count(), 2);
}

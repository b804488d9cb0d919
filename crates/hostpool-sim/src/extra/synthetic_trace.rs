//! Synthetic trace generator.
use rand::prelude::*;
use rand_distr::{Exp, LogNormal};
use rand_pcg::Pcg64;

use hostpool_core::SimTime;

use crate::error::TraceError;
use crate::trace::WorkloadRecord;

/// Generator of request arrival times.
#[derive(Clone, Debug)]
pub enum ArrivalGenerator {
    /// Generates equally spaced arrival times with given interval between consecutive arrivals.
    EquallySpaced(SimTime),
    /// Poisson arrivals with given mean interval.
    Exponential { mean: f64 },
    /// Explicitly given arrivals.
    Fixed(Vec<SimTime>),
}

/// Generator of request durations.
#[derive(Clone, Debug)]
pub enum DurationGenerator {
    /// Equal durations.
    Equal(SimTime),
    /// Log-normal durations, at least one second.
    LogNormal { mu: f64, sigma: f64 },
    /// Durations uniformly distributed in the inclusive range.
    Uniform(SimTime, SimTime),
    /// Explicitly given durations.
    Fixed(Vec<SimTime>),
}

/// Synthetic trace generation settings.
#[derive(Clone, Debug)]
pub struct SyntheticTraceConfig {
    /// Time interval that will contain all arrival times.
    pub activity_window: (SimTime, SimTime),
    /// Arrival times generator.
    pub arrival_generator: ArrivalGenerator,
    /// Request durations generator.
    pub duration_generator: DurationGenerator,
    /// Job names, one is picked at random for each request.
    pub jobs: Vec<String>,
    /// Stage names, one is picked at random for each request.
    pub stages: Vec<String>,
    /// Random generator seed.
    pub random_seed: u64,
    /// Upper bound on the number of generated requests.
    pub max_requests: Option<usize>,
}

impl Default for SyntheticTraceConfig {
    fn default() -> Self {
        Self {
            activity_window: (0, 24 * 3600),
            arrival_generator: ArrivalGenerator::EquallySpaced(600),
            duration_generator: DurationGenerator::Equal(3600),
            jobs: vec!["job".to_string()],
            stages: vec!["build".to_string()],
            random_seed: 123,
            max_requests: None,
        }
    }
}

fn invalid(msg: &str) -> TraceError {
    TraceError::InvalidSynthetic(msg.to_string())
}

fn gen_arrivals(config: &SyntheticTraceConfig, gen: &mut Pcg64) -> Result<Vec<SimTime>, TraceError> {
    let (win_l, win_r) = config.activity_window;
    let limit = config.max_requests.unwrap_or(usize::MAX);
    let mut arrivals = Vec::new();
    match &config.arrival_generator {
        ArrivalGenerator::EquallySpaced(step) => {
            if *step == 0 {
                return Err(invalid("arrival interval must be positive"));
            }
            let mut t = win_l;
            while t <= win_r && arrivals.len() < limit {
                arrivals.push(t);
                t += step;
            }
        }
        ArrivalGenerator::Exponential { mean } => {
            if !mean.is_finite() || *mean <= 0. {
                return Err(invalid("mean arrival interval must be positive"));
            }
            let dist = Exp::new(1. / mean).map_err(|_| invalid("mean arrival interval must be positive"))?;
            let mut t = win_l as f64;
            while t <= win_r as f64 && arrivals.len() < limit {
                arrivals.push(t.round() as SimTime);
                t += dist.sample(gen);
            }
        }
        ArrivalGenerator::Fixed(vec) => {
            arrivals = vec.iter().copied().take(limit).collect();
        }
    }
    Ok(arrivals)
}

fn gen_durations(config: &SyntheticTraceConfig, count: usize, gen: &mut Pcg64) -> Result<Vec<SimTime>, TraceError> {
    let durations = match &config.duration_generator {
        DurationGenerator::Equal(duration) => vec![*duration; count],
        DurationGenerator::LogNormal { mu, sigma } => {
            let dist = LogNormal::new(*mu, *sigma).map_err(|_| invalid("bad log-normal parameters"))?;
            (0..count)
                .map(|_| (dist.sample(gen).round() as SimTime).max(1))
                .collect()
        }
        DurationGenerator::Uniform(lo, hi) => {
            if lo > hi {
                return Err(invalid("empty duration range"));
            }
            (0..count).map(|_| gen.gen_range(*lo..=*hi)).collect()
        }
        DurationGenerator::Fixed(vec) => {
            if vec.len() < count {
                return Err(invalid("fixed duration vector is shorter than arrivals"));
            }
            vec[..count].to_vec()
        }
    };
    Ok(durations)
}

/// Generates synthetic trace sorted by start time.
pub fn generate_synthetic_trace(config: &SyntheticTraceConfig) -> Result<Vec<WorkloadRecord>, TraceError> {
    if config.jobs.is_empty() || config.stages.is_empty() {
        return Err(invalid("job and stage names must not be empty"));
    }
    let mut gen = Pcg64::seed_from_u64(config.random_seed);
    let arrivals = gen_arrivals(config, &mut gen)?;
    let durations = gen_durations(config, arrivals.len(), &mut gen)?;
    let mut records = Vec::with_capacity(arrivals.len());
    for (start, duration) in arrivals.into_iter().zip(durations) {
        let job = &config.jobs[gen.gen_range(0..config.jobs.len())];
        let stage = &config.stages[gen.gen_range(0..config.stages.len())];
        records.push(WorkloadRecord::new(start, duration, job, stage));
    }
    records.sort_by_key(|r| r.start_time);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equally_spaced() {
        let config = SyntheticTraceConfig {
            activity_window: (100, 1000),
            arrival_generator: ArrivalGenerator::EquallySpaced(300),
            ..Default::default()
        };
        let trace = generate_synthetic_trace(&config).unwrap();
        let starts: Vec<_> = trace.iter().map(|r| r.start_time).collect();
        assert_eq!(starts, vec![100, 400, 700, 1000]);
        assert!(trace.iter().all(|r| r.execution_time == 3600));
    }

    #[test]
    fn test_same_seed_same_trace() {
        let config = SyntheticTraceConfig {
            arrival_generator: ArrivalGenerator::Exponential { mean: 120. },
            duration_generator: DurationGenerator::LogNormal { mu: 7., sigma: 1. },
            jobs: vec!["a".to_string(), "b".to_string()],
            max_requests: Some(50),
            ..Default::default()
        };
        let first = generate_synthetic_trace(&config).unwrap();
        let second = generate_synthetic_trace(&config).unwrap();
        assert_eq!(first.len(), 50);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.execution_time >= 1));
        assert!(crate::trace::is_ordered_by_time(&first));
    }

    #[test]
    fn test_invalid_config() {
        let config = SyntheticTraceConfig {
            arrival_generator: ArrivalGenerator::EquallySpaced(0),
            ..Default::default()
        };
        assert!(matches!(
            generate_synthetic_trace(&config),
            Err(TraceError::InvalidSynthetic(_))
        ));
    }
}

use std::error::Error;
use std::fs::File;
use std::process;

use chrono::{DateTime, Utc};
use clap::Parser;

use hostpool_core::log_info;
use hostpool_core::SimTime;
use hostpool_sim::config::PoolConfig;
use hostpool_sim::extra::synthetic_trace::{
    generate_synthetic_trace, ArrivalGenerator, DurationGenerator, SyntheticTraceConfig,
};
use hostpool_sim::simulation::{PoolSimulation, Summary};
use hostpool_sim::stats::{MONTHS, MONTH_NAMES};
use hostpool_sim::trace::{is_ordered_by_time, load_trace, WorkloadRecord};

#[derive(Parser, Debug)]
#[clap(about = "Simulates a dedicated host pool serving a workload trace", long_about = None)]
struct Args {
    /// CSV trace with startTime,endTime,executionTime,jobName,stageName columns
    #[clap(short, long, conflicts_with = "synthetic")]
    trace: Option<String>,

    /// Generate a synthetic trace with at most this many requests instead
    #[clap(long)]
    synthetic: Option<usize>,

    /// Start of the synthetic trace (unix seconds)
    #[clap(long, default_value = "1672531200")]
    start: SimTime,

    /// Mean interval between synthetic arrivals (seconds)
    #[clap(long, default_value = "300")]
    interarrival: f64,

    /// Random seed of the synthetic trace
    #[clap(long, default_value = "123")]
    seed: u64,

    /// YAML file with pool parameters
    #[clap(short, long)]
    config: Option<String>,

    /// Print pool state after every tick
    #[clap(short, long)]
    progress: bool,

    /// Write the final statistics as JSON to this file
    #[clap(long)]
    json: Option<String>,
}

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn format_time(time: SimTime) -> String {
    i64::try_from(time)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| time.to_string())
}

fn print_progress(sim: &PoolSimulation) {
    println!("{} -> {}", format_time(sim.time()), sim.snapshot());
}

fn format_row(values: &[f64; MONTHS]) -> String {
    values.iter().map(|v| format!("{:>10.2}", v)).collect::<Vec<_>>().join(" ")
}

fn print_summary(summary: &Summary) {
    println!();
    println!("Simulator statistics:");
    println!(
        "Max: Instances: {} Hosts: {} Queue: {} wait (minutes): {:.2}",
        summary.max_instances, summary.max_hosts, summary.max_backlog, summary.max_wait_minutes
    );
    println!();
    let months: Vec<_> = MONTH_NAMES.iter().map(|m| format!("{:>10}", m)).collect();
    println!("                       {}", months.join(" "));
    println!("Instances       h/mon: {}", format_row(&summary.instance_hours));
    println!("Hosts           h/mon: {}", format_row(&summary.host_hours));
    println!("Queue           h/mon: {}", format_row(&summary.queue_hours));
    println!("Queue Mean wait m/mon: {}", format_row(&summary.mean_wait_minutes));
}

fn load_records(args: &Args) -> Result<Vec<WorkloadRecord>, Box<dyn Error>> {
    if let Some(path) = &args.trace {
        return Ok(load_trace(path)?);
    }
    let Some(count) = args.synthetic else {
        return Err("either --trace or --synthetic must be given".into());
    };
    let config = SyntheticTraceConfig {
        activity_window: (args.start, args.start + 365 * 24 * 3600),
        arrival_generator: ArrivalGenerator::Exponential {
            mean: args.interarrival,
        },
        duration_generator: DurationGenerator::LogNormal { mu: 7.5, sigma: 1. },
        jobs: (0..50).map(|i| format!("job-{}", i)).collect(),
        stages: ["build", "test", "package", "deploy"].iter().map(|s| s.to_string()).collect(),
        random_seed: args.seed,
        max_requests: Some(count),
    };
    Ok(generate_synthetic_trace(&config)?)
}

fn run(args: &Args) -> Result<Summary, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => PoolConfig::from_file(path)?,
        None => PoolConfig::default(),
    };
    let records = load_records(args)?;
    if !is_ordered_by_time(&records) {
        return Err("trace records must be sorted by startTime".into());
    }

    let mut sim = PoolSimulation::new(config);
    log_info!(sim, "simulating {} requests", records.len());
    for record in records.iter() {
        sim.run_request(record)?;
        if args.progress {
            print_progress(&sim);
        }
    }
    let summary = if args.progress {
        sim.finalize_with(print_progress)?
    } else {
        sim.finalize()?
    };

    if let Some(path) = &args.json {
        serde_json::to_writer_pretty(File::create(path)?, &summary)?;
    }
    Ok(summary)
}

fn main() {
    init_logger();
    let args = Args::parse();
    match run(&args) {
        Ok(summary) => print_summary(&summary),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

//! Workload trace input.
//!
//! A trace is a CSV file with the header `startTime,endTime,executionTime,jobName,stageName`. Times are
//! in seconds. Records are expected to be sorted by start time, which is not checked while reading
//! (see [`is_ordered_by_time`]).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use hostpool_core::SimTime;

use crate::backlog::WorkloadRequest;
use crate::error::TraceError;

/// Single trace row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRecord {
    pub start_time: SimTime,
    /// Informational, the simulation uses `execution_time`.
    #[serde(default)]
    pub end_time: Option<SimTime>,
    pub execution_time: SimTime,
    pub job_name: String,
    pub stage_name: String,
}

impl WorkloadRecord {
    pub fn new(start_time: SimTime, execution_time: SimTime, job_name: &str, stage_name: &str) -> Self {
        Self {
            start_time,
            end_time: Some(start_time + execution_time),
            execution_time,
            job_name: job_name.to_string(),
            stage_name: stage_name.to_string(),
        }
    }
}

impl From<&WorkloadRecord> for WorkloadRequest {
    fn from(record: &WorkloadRecord) -> Self {
        WorkloadRequest::new(
            record.start_time,
            record.execution_time,
            record.job_name.as_str(),
            record.stage_name.as_str(),
        )
    }
}

/// Reads trace records from CSV data.
pub fn read_trace<R: Read>(reader: R) -> Result<Vec<WorkloadRecord>, TraceError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Reads trace records from CSV file.
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<WorkloadRecord>, TraceError> {
    let file = File::open(path)?;
    read_trace(file)
}

/// Checks that records are sorted by start time.
pub fn is_ordered_by_time(records: &[WorkloadRecord]) -> bool {
    records.windows(2).all(|w| w[0].start_time <= w[1].start_time)
}

/// Writes trace records as CSV.
pub fn write_trace<W: std::io::Write>(writer: W, records: &[WorkloadRecord]) -> Result<(), TraceError> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_trace() {
        let data = "startTime,endTime,executionTime,jobName,stageName\n\
                    100, 160, 60, job-a, build\n\
                    200,,30,job-b,test\n";
        let records = read_trace(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], WorkloadRecord::new(100, 60, "job-a", "build"));
        assert_eq!(records[1].end_time, None);
        assert_eq!(records[1].execution_time, 30);
        assert!(is_ordered_by_time(&records));
    }

    #[test]
    fn test_read_malformed_trace() {
        let data = "startTime,endTime,executionTime,jobName,stageName\nabc,1,2,job,stage\n";
        assert!(matches!(read_trace(data.as_bytes()), Err(TraceError::Csv(_))));
    }
}

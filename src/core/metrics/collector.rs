use crate::core::components::Job;
use crate::core::factory::Factory;
use crate::core::metrics::analysis::time_average;
use crate::core::types::{JobId, JobType, StationId};
use serde::Serialize;

/// One row of the queue log
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueSample {
    pub time: f64,
    pub station: StationId,
    pub queue_length: usize,
}

/// Lifetime of a retired job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub job: JobId,
    pub job_type: JobType,
    pub arrival_time: f64,
    pub completion_time: f64,
    pub flow_time: f64,
}

/// Accumulates queue-length samples after every tick and a record for every
/// retired job
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    queue_log: Vec<QueueSample>,
    /// `(time, queue length)` per station, for integration
    series: Vec<Vec<(f64, f64)>>,
    completed: Vec<JobRecord>,
}

impl MetricsCollector {
    pub fn new(num_stations: usize) -> Self {
        Self {
            queue_log: Vec::new(),
            series: vec![Vec::new(); num_stations],
            completed: Vec::new(),
        }
    }

    /// Sample every workstation input queue at the factory's current time
    pub fn record_tick(&mut self, factory: &Factory) {
        let time = factory.time();
        for ws in factory.workstations() {
            self.record_sample(time, ws.id(), ws.input_queue().len());
        }
    }

    pub fn record_sample(&mut self, time: f64, station: StationId, queue_length: usize) {
        if self.series.len() <= station {
            self.series.resize(station + 1, Vec::new());
        }
        self.series[station].push((time, queue_length as f64));
        self.queue_log.push(QueueSample {
            time,
            station,
            queue_length,
        });
    }

    /// Record a retired job. Returns false, recording nothing, if the job
    /// has no completion time yet.
    pub fn record_retirement(&mut self, job: &Job) -> bool {
        let (completion_time, flow_time) = match (job.completion_time(), job.flow_time()) {
            (Some(done), Some(flow)) => (done, flow),
            _ => return false,
        };
        self.completed.push(JobRecord {
            job: job.id(),
            job_type: job.job_type(),
            arrival_time: job.arrival_time(),
            completion_time,
            flow_time,
        });
        true
    }

    /// Every sample, in recording order
    pub fn queue_log(&self) -> &[QueueSample] {
        &self.queue_log
    }

    pub fn station_samples(&self, station: StationId) -> &[(f64, f64)] {
        self.series.get(station).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// Time-averaged input queue length of a station
    pub fn average_queue_length(&self, station: StationId) -> Option<f64> {
        time_average(self.station_samples(station))
    }

    pub fn completed_jobs(&self) -> &[JobRecord] {
        &self.completed
    }

    pub fn mean_flow_time(&self) -> Option<f64> {
        if self.completed.is_empty() {
            return None;
        }
        Some(self.completed.iter().map(|r| r.flow_time).sum::<f64>() / self.completed.len() as f64)
    }
}

use super::types::JobType;
use serde::{Deserialize, Serialize};

/// Lifecycle of a job. Jobs never change their own state: each transition
/// is driven by exactly one device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    NotYetArrived,
    /// In the factory input queue, waiting for a robot   <- Factory
    Ready,
    /// In a workstation input queue   <- Robot
    Queueing,
    /// Being processed   <- Workstation
    Working,
    /// Processing done, still on the machine, no robot assigned   <- Machine
    Halted,
    /// Claimed by a robot, awaiting pickup   <- Robot
    Waiting,
    /// On a robot   <- Robot
    Transporting,
    /// Routing exhausted and handed back to the factory   <- Factory
    Retired,
}

impl JobState {
    /// States a robot dispatch policy may claim a job from
    pub fn is_pickup_eligible(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Halted)
    }
}

/// Coarse device state shared by every device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Idle,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Idle,
    Busy,
    /// Work complete, job still present, waiting for a transporter
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    Idle,
    MovingUnloaded,
    MovingLoaded,
}

/// Cumulative time accounting for a device
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceTiming {
    pub total_run_time: f64,
    pub busy_time: f64,
    pub idle_time: f64,
}

impl DeviceTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `dt`, charging it to busy or idle
    pub fn record(&mut self, dt: f64, busy: bool) {
        self.total_run_time += dt;
        if busy {
            self.busy_time += dt;
        } else {
            self.idle_time += dt;
        }
    }

    pub fn utilization(&self) -> f64 {
        if self.total_run_time > 0.0 {
            self.busy_time / self.total_run_time
        } else {
            0.0
        }
    }
}

/// Per-type job throughput counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCounters {
    pub input_by_type: Vec<u64>,
    pub output_by_type: Vec<u64>,
    pub total_input: u64,
    pub total_output: u64,
}

impl JobCounters {
    pub fn new(num_job_types: usize) -> Self {
        Self {
            input_by_type: vec![0; num_job_types],
            output_by_type: vec![0; num_job_types],
            total_input: 0,
            total_output: 0,
        }
    }

    pub fn record_input(&mut self, job_type: JobType) {
        if let Some(count) = self.input_by_type.get_mut(job_type) {
            *count += 1;
        }
        self.total_input += 1;
    }

    pub fn record_output(&mut self, job_type: JobType) {
        if let Some(count) = self.output_by_type.get_mut(job_type) {
            *count += 1;
        }
        self.total_output += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_utilization() {
        let mut timing = DeviceTiming::new();
        assert_eq!(timing.utilization(), 0.0);

        timing.record(1.0, true);
        timing.record(3.0, false);
        assert_eq!(timing.total_run_time, 4.0);
        assert_eq!(timing.busy_time, 1.0);
        assert_eq!(timing.idle_time, 3.0);
        assert_eq!(timing.utilization(), 0.25);
    }

    #[test]
    fn test_counters() {
        let mut counters = JobCounters::new(2);
        counters.record_input(1);
        counters.record_input(1);
        counters.record_output(0);
        assert_eq!(counters.input_by_type, vec![0, 2]);
        assert_eq!(counters.output_by_type, vec![1, 0]);
        assert_eq!(counters.total_input, 2);
        assert_eq!(counters.total_output, 1);
    }

    #[test]
    fn test_pickup_eligibility() {
        assert!(JobState::Ready.is_pickup_eligible());
        assert!(JobState::Halted.is_pickup_eligible());
        assert!(!JobState::Waiting.is_pickup_eligible());
        assert!(!JobState::Working.is_pickup_eligible());
    }
}

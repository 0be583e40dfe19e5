use crate::core::components::job::Job;
use crate::core::components::traits::{Device, TickContext};
use crate::core::errors::{SimError, SimResult};
use crate::core::state::{DeviceState, DeviceTiming, JobCounters, JobState};
use crate::core::types::{Holder, JobId, Position};
use std::collections::BTreeSet;

/// Factory entry and exit.
///
/// Arrivals are admitted into the input queue, where they wait for a robot.
/// Jobs delivered back here after their last routing step are retired: they
/// leave the live set but stay in the factory's job history.
#[derive(Debug, Clone)]
pub struct Hub {
    name: String,
    position: Position,
    input_queue: Vec<JobId>,
    output_queue: Vec<JobId>,
    live: BTreeSet<JobId>,
    clock: f64,
    timing: DeviceTiming,
    counters: JobCounters,
}

impl Hub {
    pub fn new(position: Position, num_job_types: usize) -> Self {
        Self {
            name: "Entry".to_string(),
            position,
            input_queue: Vec::new(),
            output_queue: Vec::new(),
            live: BTreeSet::new(),
            clock: 0.0,
            timing: DeviceTiming::new(),
            counters: JobCounters::new(num_job_types),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Jobs waiting at the entry, in arrival order
    pub fn input_queue(&self) -> &[JobId] {
        &self.input_queue
    }

    /// Retired jobs, in completion order
    pub fn output_queue(&self) -> &[JobId] {
        &self.output_queue
    }

    /// Admitted and not yet retired
    pub fn live_jobs(&self) -> &BTreeSet<JobId> {
        &self.live
    }

    pub fn is_live(&self, job: JobId) -> bool {
        self.live.contains(&job)
    }

    pub fn jobs_admitted(&self) -> u64 {
        self.counters.total_input
    }

    pub fn jobs_retired(&self) -> u64 {
        self.counters.total_output
    }

    /// Sync the hub clock; completion times are stamped from it
    pub fn set_clock(&mut self, now: f64) {
        self.clock = now;
    }
}

impl Device for Hub {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_state(&self) -> DeviceState {
        if self.live.is_empty() {
            DeviceState::Idle
        } else {
            DeviceState::Busy
        }
    }

    fn timing(&self) -> &DeviceTiming {
        &self.timing
    }

    fn counters(&self) -> &JobCounters {
        &self.counters
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()> {
        self.timing.record(ctx.dt, !self.live.is_empty());
        self.clock = ctx.now;
        Ok(())
    }

    /// Admit a scheduled arrival, or retire a job whose routing is done
    fn push_job(&mut self, job: &mut Job) -> SimResult<()> {
        match job.state() {
            JobState::NotYetArrived => {
                job.set_state(JobState::Ready);
                job.set_holder(Holder::FactoryInput);
                self.input_queue.push(job.id());
                self.live.insert(job.id());
                self.counters.record_input(job.job_type());
                Ok(())
            }
            JobState::Transporting if job.is_routing_complete() => {
                job.set_state(JobState::Retired);
                job.set_holder(Holder::Retired);
                job.set_completion_time(self.clock);
                self.output_queue.push(job.id());
                self.live.remove(&job.id());
                self.counters.record_output(job.job_type());
                Ok(())
            }
            state => Err(SimError::invalid_transition(&self.name, "push", state)),
        }
    }

    /// A robot picks a claimed job up from the entry
    fn pop_job(&mut self, job: &mut Job) -> SimResult<()> {
        if job.state() != JobState::Waiting {
            return Err(SimError::invalid_transition(&self.name, "pop", job.state()));
        }
        let index = self
            .input_queue
            .iter()
            .position(|id| *id == job.id())
            .ok_or_else(|| SimError::invalid_transition(&self.name, "pop", "job not queued"))?;
        self.input_queue.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_and_retire() {
        let mut hub = Hub::new(Position::default(), 1);
        let mut job = Job::new(3, 0, vec![1], vec![10.0], 2.0);

        hub.push_job(&mut job).unwrap();
        assert_eq!(job.state(), JobState::Ready);
        assert_eq!(hub.input_queue(), &[3]);
        assert!(hub.is_live(3));

        // Unclaimed jobs cannot be popped
        assert!(hub.pop_job(&mut job).is_err());
        job.set_state(JobState::Waiting);
        hub.pop_job(&mut job).unwrap();
        assert!(hub.input_queue().is_empty());

        // Routing still pending: retirement refused
        job.set_state(JobState::Transporting);
        assert!(hub.push_job(&mut job).is_err());
        assert_eq!(job.state(), JobState::Transporting);

        job.advance_step();
        hub.set_clock(42.0);
        hub.push_job(&mut job).unwrap();
        assert_eq!(job.state(), JobState::Retired);
        assert_eq!(job.completion_time(), Some(42.0));
        assert_eq!(job.flow_time(), Some(40.0));
        assert!(!hub.is_live(3));
        assert_eq!(hub.jobs_retired(), 1);
    }
}

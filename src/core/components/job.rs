use crate::core::state::JobState;
use crate::core::types::{Holder, JobId, JobType, Location, StationId};

/// A production order travelling a fixed routing through the workstations.
///
/// Routing and per-step service times are sampled once at creation. The job
/// never changes its own state; devices drive every transition through the
/// crate-private setters below.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    name: String,
    job_type: JobType,
    routing: Vec<StationId>,
    service_times: Vec<f64>,
    current_step: usize,
    state: JobState,
    holder: Holder,
    arrival_time: f64,
    completion_time: Option<f64>,
}

impl Job {
    pub fn new(
        id: JobId,
        job_type: JobType,
        routing: Vec<StationId>,
        service_times: Vec<f64>,
        arrival_time: f64,
    ) -> Self {
        Self {
            id,
            name: format!("J{}", id + 1),
            job_type,
            routing,
            service_times,
            current_step: 0,
            state: JobState::NotYetArrived,
            holder: Holder::Schedule,
            arrival_time,
            completion_time: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn routing(&self) -> &[StationId] {
        &self.routing
    }

    pub fn service_times(&self) -> &[f64] {
        &self.service_times
    }

    /// Index of the routing step currently being queued for or processed
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn holder(&self) -> Holder {
        self.holder
    }

    /// Scheduled arrival at the factory entry
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    pub fn completion_time(&self) -> Option<f64> {
        self.completion_time
    }

    /// Time spent in the system, once retired
    pub fn flow_time(&self) -> Option<f64> {
        self.completion_time.map(|done| done - self.arrival_time)
    }

    pub fn is_routing_complete(&self) -> bool {
        self.current_step >= self.routing.len()
    }

    /// Service time of the step the cursor points at
    pub fn current_service_time(&self) -> Option<f64> {
        self.service_times.get(self.current_step).copied()
    }

    pub fn total_service_time(&self) -> f64 {
        self.service_times.iter().sum()
    }

    /// Service time of every step not yet completed
    pub fn remaining_service_time(&self) -> f64 {
        self.service_times.get(self.current_step..).map_or(0.0, |rest| rest.iter().sum())
    }

    pub fn remaining_steps(&self) -> usize {
        self.routing.len().saturating_sub(self.current_step)
    }

    /// Where a robot should take this job next
    pub fn next_destination(&self) -> Location {
        self.routing
            .get(self.current_step)
            .map_or(Location::Factory, |station| Location::Station(*station))
    }

    /// The place the job is (or will next be) and the stations it still has
    /// to travel to afterwards. The route always ends at the factory exit.
    pub fn remaining_path(&self) -> (Location, &[StationId]) {
        let after_current = self.routing.get(self.current_step + 1..).unwrap_or(&[]);
        let from_current = self.routing.get(self.current_step..).unwrap_or(&[]);
        match self.state {
            JobState::Retired => (Location::Factory, &[]),
            JobState::Queueing | JobState::Working | JobState::Transporting => {
                (self.next_destination(), after_current)
            }
            _ => {
                let origin = match self.holder {
                    Holder::Machine(station, _)
                    | Holder::StationOutput(station)
                    | Holder::StationInput(station) => Location::Station(station),
                    _ => Location::Factory,
                };
                (origin, from_current)
            }
        }
    }

    pub(crate) fn set_state(&mut self, state: JobState) {
        self.state = state;
    }

    pub(crate) fn set_holder(&mut self, holder: Holder) {
        self.holder = holder;
    }

    /// Move the routing cursor past the step just completed
    pub(crate) fn advance_step(&mut self) {
        debug_assert!(self.current_step < self.routing.len());
        if self.current_step < self.routing.len() {
            self.current_step += 1;
        }
    }

    pub(crate) fn set_completion_time(&mut self, time: f64) {
        self.completion_time = Some(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::new(0, 1, vec![3, 0, 2], vec![10.0, 20.0, 30.0], 5.0)
    }

    #[test]
    fn test_new_job() {
        let job = sample_job();
        assert_eq!(job.name(), "J1");
        assert_eq!(job.state(), JobState::NotYetArrived);
        assert_eq!(job.holder(), Holder::Schedule);
        assert_eq!(job.current_service_time(), Some(10.0));
        assert_eq!(job.total_service_time(), 60.0);
        assert_eq!(job.next_destination(), Location::Station(3));
        assert!(!job.is_routing_complete());
    }

    #[test]
    fn test_cursor_advance() {
        let mut job = sample_job();
        job.advance_step();
        assert_eq!(job.current_step(), 1);
        assert_eq!(job.remaining_service_time(), 50.0);
        assert_eq!(job.remaining_steps(), 2);
        job.advance_step();
        job.advance_step();
        assert!(job.is_routing_complete());
        assert_eq!(job.remaining_service_time(), 0.0);
        assert_eq!(job.next_destination(), Location::Factory);
        assert_eq!(job.current_service_time(), None);
    }

    #[test]
    fn test_remaining_path() {
        let mut job = sample_job();
        // Waiting at the entry: the whole route is ahead
        assert_eq!(job.remaining_path(), (Location::Factory, &[3, 0, 2][..]));

        job.set_state(JobState::Queueing);
        job.set_holder(Holder::StationInput(3));
        assert_eq!(job.remaining_path(), (Location::Station(3), &[0, 2][..]));

        job.set_state(JobState::Halted);
        job.set_holder(Holder::Machine(3, 0));
        job.advance_step();
        assert_eq!(job.remaining_path(), (Location::Station(3), &[0, 2][..]));
    }

    #[test]
    fn test_flow_time() {
        let mut job = sample_job();
        assert_eq!(job.flow_time(), None);
        job.set_completion_time(105.0);
        assert_eq!(job.flow_time(), Some(100.0));
    }
}

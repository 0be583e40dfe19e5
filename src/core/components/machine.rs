use crate::core::components::job::Job;
use crate::core::components::traits::{Device, TickContext};
use crate::core::errors::{SimError, SimResult};
use crate::core::event::DeviceEvent;
use crate::core::state::{DeviceState, DeviceTiming, JobCounters, JobState, MachineState};
use crate::core::types::{Holder, JobId, JobType, MachineId, StationId};

/// A single processing machine owned by a workstation.
///
/// Holds at most one job. Processing counts down the job's service time for
/// the current step; when it runs out the machine halts with the job still on
/// it until a transporter claims the job and the machine is released.
#[derive(Debug, Clone)]
pub struct Machine {
    id: MachineId,
    station: StationId,
    name: String,
    state: MachineState,
    current: Option<(JobId, JobType)>,
    countdown: f64,
    current_job_time: f64,
    timing: DeviceTiming,
    halt_time: f64,
    counters: JobCounters,
}

impl Machine {
    pub fn new(id: MachineId, station: StationId, num_job_types: usize) -> Self {
        Self {
            id,
            station,
            name: format!("W{}.M{}", station + 1, id + 1),
            state: MachineState::Idle,
            current: None,
            countdown: 0.0,
            current_job_time: 0.0,
            timing: DeviceTiming::new(),
            halt_time: 0.0,
            counters: JobCounters::new(num_job_types),
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    /// Owning workstation
    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current.map(|(job, _)| job)
    }

    pub fn is_idle(&self) -> bool {
        self.state == MachineState::Idle
    }

    /// Remaining processing time of the current job
    pub fn countdown(&self) -> f64 {
        self.countdown.max(0.0)
    }

    /// Fraction of the current job's step completed, 0 when idle
    pub fn progress(&self) -> f64 {
        match self.state {
            MachineState::Idle => 0.0,
            MachineState::Halted => 1.0,
            MachineState::Busy if self.current_job_time > 0.0 => {
                (1.0 - self.countdown / self.current_job_time).clamp(0.0, 1.0)
            }
            MachineState::Busy => 1.0,
        }
    }

    pub fn halt_time(&self) -> f64 {
        self.halt_time
    }

    /// Start processing `job`. Rejected, with nothing changed, unless the
    /// machine is idle and the job still has a step to process.
    pub fn accept(&mut self, job: &mut Job) -> SimResult<()> {
        if self.state != MachineState::Idle {
            return Err(SimError::invalid_transition(&self.name, "accept", self.state));
        }
        let service_time = match job.current_service_time() {
            Some(time) => time,
            None => {
                return Err(SimError::invalid_transition(job.name(), "accept", "routing complete"))
            }
        };

        self.state = MachineState::Busy;
        self.current = Some((job.id(), job.job_type()));
        self.countdown = service_time;
        self.current_job_time = service_time;
        self.counters.record_input(job.job_type());

        job.set_state(JobState::Working);
        job.set_holder(Holder::Machine(self.station, self.id));
        Ok(())
    }

    /// Advance processing by `dt`. Returns the job if it halted this tick.
    pub fn tick(&mut self, dt: f64, jobs: &mut [Job]) -> SimResult<Option<JobId>> {
        self.timing.record(dt, self.state == MachineState::Busy);
        if self.state == MachineState::Halted {
            self.halt_time += dt;
        }
        if self.state != MachineState::Busy {
            return Ok(None);
        }

        self.countdown -= dt;
        if self.countdown > 0.0 {
            return Ok(None);
        }

        let job_id = self.current_job().ok_or_else(|| {
            SimError::invalid_transition(&self.name, "tick", "busy without a job")
        })?;
        let job = jobs.get_mut(job_id).ok_or(SimError::UnknownJob(job_id))?;
        self.state = MachineState::Halted;
        self.countdown = 0.0;
        job.advance_step();
        job.set_state(JobState::Halted);
        Ok(Some(job_id))
    }

    /// Free the machine after its halted job has been claimed
    pub fn release(&mut self) -> SimResult<JobId> {
        if self.state != MachineState::Halted {
            return Err(SimError::invalid_transition(&self.name, "release", self.state));
        }
        let (job_id, job_type) = self.current.take().ok_or_else(|| {
            SimError::invalid_transition(&self.name, "release", "halted without a job")
        })?;
        self.state = MachineState::Idle;
        self.countdown = 0.0;
        self.current_job_time = 0.0;
        self.counters.record_output(job_type);
        Ok(job_id)
    }
}

impl Device for Machine {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_state(&self) -> DeviceState {
        match self.state {
            MachineState::Busy => DeviceState::Busy,
            _ => DeviceState::Idle,
        }
    }

    fn timing(&self) -> &DeviceTiming {
        &self.timing
    }

    fn counters(&self) -> &JobCounters {
        &self.counters
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()> {
        if let Some(job) = self.tick(ctx.dt, ctx.jobs)? {
            ctx.events.push(DeviceEvent::Halted {
                job,
                station: self.station,
                machine: self.id,
            });
        }
        Ok(())
    }

    fn push_job(&mut self, job: &mut Job) -> SimResult<()> {
        self.accept(job)
    }

    fn pop_job(&mut self, job: &mut Job) -> SimResult<()> {
        if self.current_job() != Some(job.id()) {
            return Err(SimError::invalid_transition(&self.name, "pop", job.name().to_string()));
        }
        self.release().map(|_| ())
    }
}

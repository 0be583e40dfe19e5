use crate::core::components::job::Job;
use crate::core::components::machine::Machine;
use crate::core::components::traits::{Device, TickContext};
use crate::core::errors::{SimError, SimResult};
use crate::core::policies::{remaining_processing_time, MachineDispatch, QueueLearner, QueuedJob};
use crate::core::state::{DeviceState, DeviceTiming, JobCounters, JobState, MachineState};
use crate::core::types::{Holder, JobId, Location, MachineId, Position, StationId};
use log::{debug, warn};

/// A group of identical machines sharing one input queue and one output
/// queue.
///
/// Each tick the workstation optionally lets its queue learner reorder the
/// input queue, drains the queue into idle machines through its dispatch
/// policy, then ticks every machine.
#[derive(Debug)]
pub struct Workstation {
    id: StationId,
    name: String,
    position: Position,
    machines: Vec<Machine>,
    input_queue: Vec<JobId>,
    output_queue: Vec<JobId>,
    policy: Box<dyn MachineDispatch>,
    learner: Option<QueueLearner>,
    timing: DeviceTiming,
    counters: JobCounters,
    busy: bool,
}

impl Workstation {
    pub fn new(
        id: StationId,
        position: Position,
        num_machines: usize,
        num_job_types: usize,
        policy: Box<dyn MachineDispatch>,
    ) -> Self {
        Self {
            id,
            name: format!("W{}", id + 1),
            position,
            machines: (0..num_machines)
                .map(|m| Machine::new(m, id, num_job_types))
                .collect(),
            input_queue: Vec::new(),
            output_queue: Vec::new(),
            policy,
            learner: None,
            timing: DeviceTiming::new(),
            counters: JobCounters::new(num_job_types),
            busy: false,
        }
    }

    pub fn with_learner(mut self, learner: QueueLearner) -> Self {
        self.learner = Some(learner);
        self
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    pub fn input_queue(&self) -> &[JobId] {
        &self.input_queue
    }

    pub fn output_queue(&self) -> &[JobId] {
        &self.output_queue
    }

    pub fn policy(&self) -> &dyn MachineDispatch {
        self.policy.as_ref()
    }

    pub fn learner(&self) -> Option<&QueueLearner> {
        self.learner.as_ref()
    }

    pub fn idle_machines(&self) -> usize {
        self.machines.iter().filter(|m| m.is_idle()).count()
    }

    /// Jobs that finished processing and have not been claimed yet
    pub fn halted_jobs(&self) -> impl Iterator<Item = (MachineId, JobId)> + '_ {
        self.machines
            .iter()
            .filter(|m| m.state() == MachineState::Halted)
            .filter_map(|m| m.current_job().map(|job| (m.id(), job)))
    }

    /// Mean of the per-machine utilisations, not weighted by job size
    pub fn machine_utilization(&self) -> f64 {
        if self.machines.is_empty() {
            return 0.0;
        }
        self.machines.iter().map(|m| m.utilization()).sum::<f64>() / self.machines.len() as f64
    }

    /// Assign queued jobs to idle machines until one side runs out.
    /// Returns the number of jobs started.
    pub fn dispatch(&mut self, ctx: &mut TickContext<'_>) -> SimResult<usize> {
        let mut queued: Vec<QueuedJob> = Vec::with_capacity(self.input_queue.len());
        for id in &self.input_queue {
            let job = ctx.jobs.get(*id).ok_or(SimError::UnknownJob(*id))?;
            queued.push(QueuedJob {
                job: *id,
                remaining: remaining_processing_time(job, ctx.topology, ctx.robot_speed),
            });
        }

        let mut started = 0;
        while !queued.is_empty() {
            let machine = match self.machines.iter().position(|m| m.is_idle()) {
                Some(m) => m,
                None => break,
            };
            let index = match self.policy.select(&queued, ctx.rng) {
                Some(i) if i < queued.len() => i,
                _ => break,
            };

            let job_id = queued[index].job;
            let job = ctx.jobs.get_mut(job_id).ok_or(SimError::UnknownJob(job_id))?;
            if let Err(err) = self.machines[machine].accept(job) {
                warn!("[{}] dispatch of {} rejected: {}", self.name, job_id, err);
                break;
            }
            queued.remove(index);
            self.input_queue.remove(index);
            started += 1;
            debug!("[{}] {} started on M{}", self.name, job_id, machine + 1);
        }
        Ok(started)
    }

    /// Release the machine holding a halted job and stage the job in the
    /// output queue for the robot that claimed it
    pub fn stage_for_pickup(&mut self, machine: MachineId, job: &mut Job) -> SimResult<()> {
        let slot = self
            .machines
            .get_mut(machine)
            .ok_or_else(|| SimError::invalid_transition(&self.name, "stage", "no such machine"))?;
        if slot.current_job() != Some(job.id()) || job.state() != JobState::Halted {
            return Err(SimError::invalid_transition(slot.name(), "stage", job.state()));
        }
        let released = slot.release()?;
        self.output_queue.push(released);
        job.set_holder(Holder::StationOutput(self.id));
        Ok(())
    }
}

impl Device for Workstation {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_state(&self) -> DeviceState {
        if self.busy {
            DeviceState::Busy
        } else {
            DeviceState::Idle
        }
    }

    fn timing(&self) -> &DeviceTiming {
        &self.timing
    }

    fn counters(&self) -> &JobCounters {
        &self.counters
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()> {
        self.timing.record(ctx.dt, self.busy);

        if let Some(learner) = self.learner.as_mut() {
            if let Some(reward) = learner.step(&mut self.input_queue, ctx.jobs, ctx.rng) {
                debug!("[{}] queue reorder reward {:.1}", self.name, reward);
            }
        }

        self.dispatch(ctx)?;

        for machine in &mut self.machines {
            machine.update(ctx)?;
        }

        self.busy = self
            .machines
            .iter()
            .any(|m| m.device_state() == DeviceState::Busy);
        Ok(())
    }

    /// A robot delivers a job into the input queue
    fn push_job(&mut self, job: &mut Job) -> SimResult<()> {
        if job.state() != JobState::Transporting {
            return Err(SimError::invalid_transition(&self.name, "push", job.state()));
        }
        if job.next_destination() != Location::Station(self.id) {
            return Err(SimError::invalid_transition(&self.name, "push", "job routed elsewhere"));
        }
        job.set_state(JobState::Queueing);
        job.set_holder(Holder::StationInput(self.id));
        self.input_queue.push(job.id());
        self.counters.record_input(job.job_type());
        Ok(())
    }

    /// A robot picks a staged job up from the output queue
    fn pop_job(&mut self, job: &mut Job) -> SimResult<()> {
        let index = self
            .output_queue
            .iter()
            .position(|id| *id == job.id())
            .ok_or_else(|| SimError::invalid_transition(&self.name, "pop", job.state()))?;
        self.output_queue.remove(index);
        self.counters.record_output(job.job_type());
        Ok(())
    }

    fn utilization(&self) -> f64 {
        self.machine_utilization()
    }
}

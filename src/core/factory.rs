use crate::core::components::{Device, Hub, Job, Robot, TickContext, Workstation};
use crate::core::errors::{SimError, SimResult};
use crate::core::event::DeviceEvent;
use crate::core::execution::config::FactoryConfig;
use crate::core::generator::{ArrivalSchedule, JobGenerator};
use crate::core::policies::{
    remaining_processing_time, Candidate, PickupBoard, QueueLearner, RobotDispatch, RobotPolicyKind,
};
use crate::core::routing::RoutingTopology;
use crate::core::state::JobState;
use crate::core::types::{Holder, JobId, Location, RobotId, StationId};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The root of the floor: owns every device, the full job history and the
/// simulated clock.
///
/// Each phase of a tick is a separate method so the cycle engine can run
/// them in a fixed order. Jobs live in one arena indexed by `JobId`; every
/// device refers to them by index only.
pub struct Factory {
    config: FactoryConfig,
    topology: RoutingTopology,
    jobs: Vec<Job>,
    next_arrival: usize,
    hub: Hub,
    workstations: Vec<Workstation>,
    robots: Vec<Robot>,
    robot_policy: Box<dyn RobotDispatch>,
    rng: StdRng,
    time: f64,
    ticks: u64,
}

impl Factory {
    /// Validate the configuration, sample the arrival schedule from its seed
    /// and lay out the floor
    pub fn new(config: FactoryConfig) -> SimResult<Self> {
        config.validate()?;
        let schedule = JobGenerator::new(&config)?.generate(config.seed);
        Self::with_schedule(config, schedule)
    }

    /// Lay out the floor around a given arrival schedule
    pub fn with_schedule(config: FactoryConfig, schedule: ArrivalSchedule) -> SimResult<Self> {
        config.validate()?;
        let num_stations = config.stations.len();
        let num_job_types = config.job_types.len();
        if let Some(job) = schedule
            .jobs()
            .iter()
            .find(|j| j.routing().iter().any(|s| *s >= num_stations))
        {
            return Err(SimError::config(format!("{} routes to a missing workstation", job.name())));
        }

        let topology = RoutingTopology::from_config(&config);
        let workstations = config
            .stations
            .iter()
            .enumerate()
            .map(|(id, station)| {
                let ws = Workstation::new(
                    id,
                    station.position,
                    station.machines,
                    num_job_types,
                    config.machine_policy.build(),
                );
                match &config.queue_learning {
                    Some(learning) => ws.with_learner(QueueLearner::new(learning.clone())),
                    None => ws,
                }
            })
            .collect();
        let robots = (0..config.robots.count)
            .map(|id| Robot::new(id, config.factory_position, config.robots.speed, num_job_types))
            .collect();

        Ok(Self {
            topology,
            jobs: schedule.into_jobs(),
            next_arrival: 0,
            hub: Hub::new(config.factory_position, num_job_types),
            workstations,
            robots,
            robot_policy: config.robot_policy.build(),
            // Separate stream from the schedule so policies never shift arrivals
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            time: 0.0,
            ticks: 0,
            config,
        })
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn topology(&self) -> &RoutingTopology {
        &self.topology
    }

    /// Every job of the run, retired ones included
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn workstations(&self) -> &[Workstation] {
        &self.workstations
    }

    pub fn workstation(&self, id: StationId) -> Option<&Workstation> {
        self.workstations.get(id)
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.get(id)
    }

    pub fn robot_policy(&self) -> RobotPolicyKind {
        self.robot_policy.kind()
    }

    /// Simulated seconds elapsed
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.ticks >= self.config.total_ticks()
    }

    pub fn jobs_arrived(&self) -> u64 {
        self.hub.jobs_admitted()
    }

    pub fn jobs_completed(&self) -> u64 {
        self.hub.jobs_retired()
    }

    pub fn jobs_in_process(&self) -> usize {
        self.hub.live_jobs().len()
    }

    /// Step 1: move the clock forward by one `dt`
    pub fn advance_clock(&mut self) -> SimResult<()> {
        self.ticks += 1;
        // Derived from the tick count so long runs do not accumulate drift
        self.time = self.ticks as f64 * self.config.dt;

        let Self {
            hub,
            jobs,
            topology,
            rng,
            config,
            time,
            ..
        } = self;
        let mut ctx = TickContext::new(*time, config.dt, jobs, topology, config.robots.speed, rng);
        hub.update(&mut ctx)
    }

    /// Step 2: admit every scheduled job whose arrival time has passed
    pub fn admit_arrivals(&mut self) -> SimResult<Vec<JobId>> {
        let mut admitted = Vec::new();
        while let Some(job) = self.jobs.get_mut(self.next_arrival) {
            if job.arrival_time() > self.time {
                break;
            }
            self.hub.push_job(job)?;
            debug!("[{}] {} arrived at t={:.2}", self.hub.name(), job.name(), self.time);
            admitted.push(job.id());
            self.next_arrival += 1;
        }
        Ok(admitted)
    }

    /// Step 3: every workstation drains its queue and ticks its machines
    pub fn update_workstations(&mut self) -> SimResult<Vec<DeviceEvent>> {
        let Self {
            workstations,
            jobs,
            topology,
            rng,
            config,
            time,
            ..
        } = self;
        let mut ctx = TickContext::new(*time, config.dt, jobs, topology, config.robots.speed, rng);
        for station in workstations.iter_mut() {
            station.update(&mut ctx)?;
        }
        Ok(ctx.take_events())
    }

    /// Step 4: move every robot. Pickups and deliveries are applied as soon
    /// as they fire, so no job is ever half-moved at a tick boundary.
    pub fn update_robots(&mut self) -> SimResult<Vec<DeviceEvent>> {
        let Self {
            robots,
            hub,
            workstations,
            jobs,
            topology,
            rng,
            config,
            time,
            ..
        } = self;
        let mut ctx = TickContext::new(*time, config.dt, jobs, topology, config.robots.speed, rng);
        let mut fired = Vec::new();

        for robot in robots.iter_mut() {
            robot.update(&mut ctx)?;
            for event in ctx.take_events() {
                let job_id = event.job();
                let job = ctx.jobs.get_mut(job_id).ok_or(SimError::UnknownJob(job_id))?;
                match event {
                    DeviceEvent::PickedUp { from, .. } => {
                        device_at(hub, workstations.as_mut_slice(), from)?.pop_job(job)?;
                        robot.push_job(job)?;
                        debug!("[{}] picked up {} at {}", robot.name(), job.name(), from);
                    }
                    DeviceEvent::Delivered { to, .. } => {
                        robot.pop_job(job)?;
                        device_at(hub, workstations.as_mut_slice(), to)?.push_job(job)?;
                        debug!("[{}] delivered {} to {}", robot.name(), job.name(), to);
                    }
                    DeviceEvent::Halted { .. } => {}
                }
                fired.push(event);
            }
        }
        Ok(fired)
    }

    /// Step 5: offer every pickup-eligible job to the idle robots, one
    /// robot at a time in index order. Returns the number of claims made.
    pub fn dispatch_robots(&mut self) -> SimResult<usize> {
        if !self.robots.iter().any(|r| r.is_idle()) {
            return Ok(0);
        }
        let mut board = self.pickup_board()?;

        let Self {
            robots,
            workstations,
            jobs,
            topology,
            rng,
            robot_policy,
            ..
        } = self;
        let mut claimed = 0;

        for robot in robots.iter_mut().filter(|r| r.is_idle()) {
            if board.is_empty() {
                break;
            }
            let job_id = match robot_policy.select(robot.position(), &board, rng) {
                Some(job) => job,
                None => continue,
            };
            let pickup = match board.source_of(job_id) {
                Some(source) => (source.location, source.position),
                None => {
                    warn!("[{}] policy chose {} which is not on the board", robot.name(), job_id);
                    continue;
                }
            };
            board.remove(job_id);

            let job = jobs.get_mut(job_id).ok_or(SimError::UnknownJob(job_id))?;
            if let Holder::Machine(station, machine) = job.holder() {
                let staged = match workstations.get_mut(station) {
                    Some(ws) => ws.stage_for_pickup(machine, job),
                    None => Err(SimError::invalid_transition(job.name(), "stage", job.holder())),
                };
                if let Err(err) = staged {
                    warn!("[{}] claim of {} rejected: {}", robot.name(), job.name(), err);
                    continue;
                }
            }

            let delivery = job.next_destination();
            robot.assign(job, pickup, (delivery, topology.position(delivery)))?;
            debug!(
                "[{}] claimed {} at {} for {}",
                robot.name(),
                job.name(),
                pickup.0,
                delivery
            );
            claimed += 1;
        }
        Ok(claimed)
    }

    /// Every unclaimed pickup-eligible job, grouped by where it waits. The
    /// factory entry is listed first, then the stations in index order.
    pub fn pickup_board(&self) -> SimResult<PickupBoard> {
        let speed = self.config.robots.speed;
        let mut board = PickupBoard::new();

        for id in self.hub.input_queue() {
            let job = self.jobs.get(*id).ok_or(SimError::UnknownJob(*id))?;
            if job.state() == JobState::Ready {
                board.add(
                    Location::Factory,
                    self.hub.position(),
                    Candidate {
                        job: *id,
                        remaining: remaining_processing_time(job, &self.topology, speed),
                    },
                );
            }
        }
        for station in &self.workstations {
            for (_, id) in station.halted_jobs() {
                let job = self.jobs.get(id).ok_or(SimError::UnknownJob(id))?;
                board.add(
                    Location::Station(station.id()),
                    station.position(),
                    Candidate {
                        job: id,
                        remaining: remaining_processing_time(job, &self.topology, speed),
                    },
                );
            }
        }
        Ok(board)
    }

    /// Check that every arrived job sits in exactly one place and that its
    /// recorded holder agrees with that place
    pub fn verify_placement(&self) -> SimResult<()> {
        let mut seen: Vec<Option<Holder>> = vec![None; self.jobs.len()];
        let mut place = |job: JobId, holder: Holder| -> SimResult<()> {
            let slot = seen.get_mut(job).ok_or(SimError::UnknownJob(job))?;
            if let Some(previous) = slot {
                return Err(SimError::invalid_transition(
                    format!("J{}", job + 1),
                    "place",
                    (*previous, holder),
                ));
            }
            *slot = Some(holder);
            Ok(())
        };

        for id in self.hub.input_queue() {
            place(*id, Holder::FactoryInput)?;
        }
        for id in self.hub.output_queue() {
            place(*id, Holder::Retired)?;
        }
        for ws in &self.workstations {
            for id in ws.input_queue() {
                place(*id, Holder::StationInput(ws.id()))?;
            }
            for id in ws.output_queue() {
                place(*id, Holder::StationOutput(ws.id()))?;
            }
            for machine in ws.machines() {
                if let Some(id) = machine.current_job() {
                    place(id, Holder::Machine(ws.id(), machine.id()))?;
                }
            }
        }
        for robot in &self.robots {
            if let Some(id) = robot.carrying() {
                place(id, Holder::Robot(robot.id()))?;
            }
        }

        for (job, slot) in self.jobs.iter().zip(&seen) {
            match slot {
                None if job.state() != JobState::NotYetArrived => {
                    return Err(SimError::invalid_transition(job.name(), "place", "nowhere"));
                }
                Some(holder) if *holder != job.holder() => {
                    return Err(SimError::invalid_transition(
                        job.name(),
                        "place",
                        (job.holder(), *holder),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("time", &self.time)
            .field("ticks", &self.ticks)
            .field("workstations", &self.workstations.len())
            .field("robots", &self.robots.len())
            .field("jobs_in_process", &self.jobs_in_process())
            .finish()
    }
}

/// The device standing at a pickup or delivery location
fn device_at<'a>(
    hub: &'a mut Hub,
    workstations: &'a mut [Workstation],
    location: Location,
) -> SimResult<&'a mut dyn Device> {
    match location {
        Location::Factory => Ok(hub as &mut dyn Device),
        Location::Station(id) => workstations
            .get_mut(id)
            .map(|ws| ws as &mut dyn Device)
            .ok_or_else(|| SimError::invalid_transition("floor", "locate", location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::{JobTypeConfig, StationConfig};
    use crate::core::policies::MachinePolicyKind;
    use crate::core::state::{MachineState, RobotState};

    /// One station 10 ft east of the entry, one machine, one robot at 5 ft/s
    fn line_config() -> FactoryConfig {
        FactoryConfig::new()
            .with_stations(vec![StationConfig::new(10.0, 0.0, 1)])
            .with_robots(1, 5.0)
            .with_job_types(vec![JobTypeConfig::new(vec![0], vec![3.0], 1.0)])
            .with_dt(1.0)
            .with_horizon(100.0)
    }

    fn single_job_factory() -> Factory {
        let schedule = ArrivalSchedule::from_jobs(vec![Job::new(0, 0, vec![0], vec![3.0], 0.5)]).unwrap();
        Factory::with_schedule(line_config(), schedule).unwrap()
    }

    fn tick(factory: &mut Factory) -> Vec<DeviceEvent> {
        factory.advance_clock().unwrap();
        factory.admit_arrivals().unwrap();
        let mut events = factory.update_workstations().unwrap();
        events.extend(factory.update_robots().unwrap());
        factory.dispatch_robots().unwrap();
        factory.verify_placement().unwrap();
        events
    }

    #[test]
    fn test_factory_layout_from_config() {
        let factory = Factory::new(FactoryConfig::default()).unwrap();
        assert_eq!(factory.workstations().len(), 5);
        assert_eq!(factory.robots().len(), 3);
        assert_eq!(factory.jobs().len(), 200);
        assert_eq!(factory.workstation(1).map(|w| w.machines().len()), Some(5));
        assert!(factory.robots().iter().all(|r| r.position() == factory.config().factory_position));
        assert_eq!(factory.jobs_in_process(), 0);
    }

    #[test]
    fn test_single_job_walkthrough() {
        let mut factory = single_job_factory();

        // t=1: arrives and is claimed at once by the robot standing on the entry
        tick(&mut factory);
        assert_eq!(factory.jobs_arrived(), 1);
        assert_eq!(factory.job(0).map(|j| j.state()), Some(JobState::Waiting));
        assert_eq!(factory.robot(0).map(|r| r.assigned_job()), Some(Some(0)));

        // t=2: zero-length pickup leg fires
        tick(&mut factory);
        assert_eq!(factory.job(0).map(|j| j.state()), Some(JobState::Transporting));
        assert!(factory.hub().input_queue().is_empty());

        // t=3..4: 10 ft at 5 ft/s, delivered at the end of t=4
        tick(&mut factory);
        let events = tick(&mut factory);
        assert!(events.iter().any(|e| matches!(e, DeviceEvent::Delivered { .. })));
        assert_eq!(factory.job(0).map(|j| j.state()), Some(JobState::Queueing));

        // t=5: started; three seconds of work halts it at t=7
        tick(&mut factory);
        assert_eq!(factory.job(0).map(|j| j.state()), Some(JobState::Working));
        tick(&mut factory);
        let events = tick(&mut factory);
        assert!(events.iter().any(|e| matches!(e, DeviceEvent::Halted { .. })));

        // Halted jobs are claimed the same tick: the machine is released and
        // the job is staged in the output queue
        let ws = &factory.workstations()[0];
        assert_eq!(ws.machines()[0].state(), MachineState::Idle);
        assert_eq!(ws.output_queue(), &[0]);
        assert_eq!(factory.job(0).map(|j| j.current_step()), Some(1));
        assert_eq!(factory.job(0).map(|j| j.state()), Some(JobState::Waiting));

        for _ in 0..10 {
            tick(&mut factory);
        }
        let job = factory.job(0).unwrap();
        assert_eq!(job.state(), JobState::Retired);
        assert_eq!(factory.jobs_completed(), 1);
        assert_eq!(factory.jobs_in_process(), 0);
        assert!(job.flow_time().unwrap() > 0.0);
        assert_eq!(factory.robots()[0].state(), RobotState::Idle);
    }

    #[test]
    fn test_no_idle_robot_is_a_noop() {
        let schedule = ArrivalSchedule::from_jobs(vec![
            Job::new(0, 0, vec![0], vec![3.0], 0.0),
            Job::new(1, 0, vec![0], vec![3.0], 0.0),
        ])
        .unwrap();
        let config = line_config().with_robot_policy(RobotPolicyKind::DistanceNeh);
        let mut factory = Factory::with_schedule(config, schedule).unwrap();
        tick(&mut factory);

        // One robot, two equal jobs: the first listed is claimed, the second stays Ready
        assert_eq!(factory.job(1).map(|j| j.state()), Some(JobState::Ready));
        assert_eq!(factory.dispatch_robots().unwrap(), 0);
        assert_eq!(factory.pickup_board().unwrap().len(), 1);
    }

    #[test]
    fn test_schedule_with_unknown_station_rejected() {
        let schedule = ArrivalSchedule::from_jobs(vec![Job::new(0, 0, vec![4], vec![3.0], 0.0)]).unwrap();
        assert!(Factory::with_schedule(line_config(), schedule).is_err());
    }

    #[test]
    fn test_neh_policy_builds_on_every_station() {
        let config = FactoryConfig::default().with_machine_policy(MachinePolicyKind::Neh);
        let factory = Factory::new(config).unwrap();
        assert!(factory
            .workstations()
            .iter()
            .all(|w| w.policy().kind() == MachinePolicyKind::Neh));
    }
}

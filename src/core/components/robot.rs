use crate::core::components::job::Job;
use crate::core::components::traits::{Device, TickContext};
use crate::core::errors::{SimError, SimResult};
use crate::core::event::DeviceEvent;
use crate::core::state::{DeviceState, DeviceTiming, JobCounters, JobState, RobotState};
use crate::core::types::{Holder, JobId, Location, Position, RobotId};

/// One leg of a transport order: where to go and what happens there
#[derive(Debug, Clone, Copy, PartialEq)]
struct TransportOrder {
    job: JobId,
    pickup: Location,
    pickup_position: Position,
    delivery: Location,
    delivery_position: Position,
}

/// Mobile robot/forklift moving one job at a time between locations.
///
/// Travel is a constant-speed straight line. On reaching its target the
/// robot snaps exactly onto it and raises a pickup or delivery event in the
/// same update.
#[derive(Debug, Clone)]
pub struct Robot {
    id: RobotId,
    name: String,
    position: Position,
    speed: f64,
    state: RobotState,
    order: Option<TransportOrder>,
    carrying: Option<JobId>,
    target: Position,
    leg_length: f64,
    timing: DeviceTiming,
    loaded_time: f64,
    unloaded_time: f64,
    distance_travelled: f64,
    counters: JobCounters,
}

impl Robot {
    pub fn new(id: RobotId, position: Position, speed: f64, num_job_types: usize) -> Self {
        Self {
            id,
            name: format!("R{}", id + 1),
            position,
            speed,
            state: RobotState::Idle,
            order: None,
            carrying: None,
            target: position,
            leg_length: 0.0,
            timing: DeviceTiming::new(),
            loaded_time: 0.0,
            unloaded_time: 0.0,
            distance_travelled: 0.0,
            counters: JobCounters::new(num_job_types),
        }
    }

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RobotState::Idle
    }

    pub fn target(&self) -> Position {
        self.target
    }

    /// Job on board, if any
    pub fn carrying(&self) -> Option<JobId> {
        self.carrying
    }

    /// Job claimed by the current order, loaded or not
    pub fn assigned_job(&self) -> Option<JobId> {
        self.order.map(|o| o.job)
    }

    pub fn pickup_location(&self) -> Option<Location> {
        self.order.map(|o| o.pickup)
    }

    pub fn delivery_location(&self) -> Option<Location> {
        self.order.map(|o| o.delivery)
    }

    pub fn loaded_time(&self) -> f64 {
        self.loaded_time
    }

    pub fn unloaded_time(&self) -> f64 {
        self.unloaded_time
    }

    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    /// Share of the current leg already covered
    pub fn leg_progress(&self) -> f64 {
        if self.state == RobotState::Idle || self.leg_length <= 0.0 {
            return 0.0;
        }
        (1.0 - self.position.distance_to(&self.target) / self.leg_length).clamp(0.0, 1.0)
    }

    /// Claim `job` and head for its pickup point. Only an idle robot accepts
    /// an order, and only for a pickup-eligible job.
    pub fn assign(
        &mut self,
        job: &mut Job,
        pickup: (Location, Position),
        delivery: (Location, Position),
    ) -> SimResult<()> {
        if self.state != RobotState::Idle {
            return Err(SimError::invalid_transition(&self.name, "assign", self.state));
        }
        if !job.state().is_pickup_eligible() {
            return Err(SimError::invalid_transition(job.name(), "assign", job.state()));
        }

        self.order = Some(TransportOrder {
            job: job.id(),
            pickup: pickup.0,
            pickup_position: pickup.1,
            delivery: delivery.0,
            delivery_position: delivery.1,
        });
        self.state = RobotState::MovingUnloaded;
        self.start_leg(pickup.1);
        self.counters.record_input(job.job_type());

        job.set_state(JobState::Waiting);
        Ok(())
    }

    fn start_leg(&mut self, target: Position) {
        self.target = target;
        self.leg_length = self.position.distance_to(&target);
    }

    fn finish_order(&mut self) -> Option<TransportOrder> {
        self.state = RobotState::Idle;
        self.carrying = None;
        self.target = self.position;
        self.leg_length = 0.0;
        self.order.take()
    }

    /// Move toward the current target for `dt`. Returns the event fired if
    /// the target was reached.
    pub fn advance(&mut self, dt: f64) -> Option<DeviceEvent> {
        self.timing.record(dt, self.state != RobotState::Idle);
        match self.state {
            RobotState::Idle => return None,
            RobotState::MovingUnloaded => self.unloaded_time += dt,
            RobotState::MovingLoaded => self.loaded_time += dt,
        }

        let step = self.speed * dt;
        let dx = self.target.x - self.position.x;
        let dy = self.target.y - self.position.y;
        let remaining = (dx * dx + dy * dy).sqrt();

        if remaining > step {
            let fraction = step / remaining;
            self.position = Position::new(self.position.x + dx * fraction, self.position.y + dy * fraction);
            self.distance_travelled += step;
            return None;
        }

        self.position = self.target;
        self.distance_travelled += remaining;
        let order = self.order?;
        match self.state {
            RobotState::MovingUnloaded => {
                self.state = RobotState::MovingLoaded;
                self.carrying = Some(order.job);
                self.start_leg(order.delivery_position);
                Some(DeviceEvent::PickedUp {
                    robot: self.id,
                    job: order.job,
                    from: order.pickup,
                })
            }
            _ => {
                self.finish_order();
                Some(DeviceEvent::Delivered {
                    robot: self.id,
                    job: order.job,
                    to: order.delivery,
                })
            }
        }
    }
}

impl Device for Robot {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_state(&self) -> DeviceState {
        if self.state == RobotState::Idle {
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
        if let Some(event) = self.advance(ctx.dt) {
            ctx.events.push(event);
        }
        Ok(())
    }

    /// Load the claimed job at the pickup point
    fn push_job(&mut self, job: &mut Job) -> SimResult<()> {
        if self.carrying != Some(job.id()) || job.state() != JobState::Waiting {
            return Err(SimError::invalid_transition(&self.name, "load", job.state()));
        }
        job.set_state(JobState::Transporting);
        job.set_holder(Holder::Robot(self.id));
        Ok(())
    }

    /// Unload the carried job at the delivery point
    fn pop_job(&mut self, job: &mut Job) -> SimResult<()> {
        if job.holder() != Holder::Robot(self.id) || job.state() != JobState::Transporting {
            return Err(SimError::invalid_transition(&self.name, "unload", job.state()));
        }
        self.counters.record_output(job.job_type());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_job() -> Job {
        let mut job = Job::new(0, 0, vec![0], vec![1.0], 0.0);
        job.set_state(JobState::Ready);
        job.set_holder(Holder::FactoryInput);
        job
    }

    #[test]
    fn test_straight_line_travel_and_snap() {
        let mut robot = Robot::new(0, Position::new(0.0, 0.0), 5.0, 1);
        let mut job = ready_job();
        robot
            .assign(
                &mut job,
                (Location::Factory, Position::new(3.0, 4.0)),
                (Location::Station(0), Position::new(3.0, 14.0)),
            )
            .unwrap();
        assert_eq!(robot.state(), RobotState::MovingUnloaded);
        assert_eq!(job.state(), JobState::Waiting);
        assert_eq!(robot.carrying(), None);

        // 2.5 of 5 feet: halfway along each axis
        assert_eq!(robot.advance(0.5), None);
        assert!((robot.position().x - 1.5).abs() < 1e-9);
        assert!((robot.position().y - 2.0).abs() < 1e-9);
        assert!((robot.leg_progress() - 0.5).abs() < 1e-9);

        // Covers the rest: snaps exactly and loads
        let event = robot.advance(1.0);
        assert_eq!(
            event,
            Some(DeviceEvent::PickedUp {
                robot: 0,
                job: 0,
                from: Location::Factory
            })
        );
        assert_eq!(robot.position(), Position::new(3.0, 4.0));
        assert_eq!(robot.state(), RobotState::MovingLoaded);
        assert_eq!(robot.carrying(), Some(0));

        assert_eq!(robot.advance(1.0), None);
        let event = robot.advance(1.0);
        assert_eq!(
            event,
            Some(DeviceEvent::Delivered {
                robot: 0,
                job: 0,
                to: Location::Station(0)
            })
        );
        assert_eq!(robot.position(), Position::new(3.0, 14.0));
        assert!(robot.is_idle());
        assert_eq!(robot.carrying(), None);
        assert!((robot.distance_travelled() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_pickup_at_current_position_fires_next_tick() {
        let mut robot = Robot::new(0, Position::new(1.0, 1.0), 5.0, 1);
        let mut job = ready_job();
        robot
            .assign(
                &mut job,
                (Location::Factory, Position::new(1.0, 1.0)),
                (Location::Station(0), Position::new(50.0, 1.0)),
            )
            .unwrap();
        assert!(matches!(robot.advance(0.1), Some(DeviceEvent::PickedUp { .. })));
    }

    #[test]
    fn test_assign_rejected_when_busy_or_ineligible() {
        let mut robot = Robot::new(0, Position::default(), 5.0, 1);
        let mut job = ready_job();
        job.set_state(JobState::Working);
        let dest = (Location::Station(0), Position::new(10.0, 0.0));
        assert!(robot.assign(&mut job, (Location::Factory, Position::default()), dest).is_err());
        assert!(robot.is_idle());
        assert_eq!(job.state(), JobState::Working);

        let mut job = ready_job();
        robot.assign(&mut job, (Location::Factory, Position::default()), dest).unwrap();
        let mut other = ready_job();
        assert!(robot.assign(&mut other, (Location::Factory, Position::default()), dest).is_err());
        assert_eq!(other.state(), JobState::Ready);
        assert_eq!(robot.assigned_job(), Some(0));
    }

    #[test]
    fn test_idle_time_accounting() {
        let mut robot = Robot::new(0, Position::default(), 1.0, 1);
        robot.advance(2.0);
        assert_eq!(robot.timing().idle_time, 2.0);
        assert_eq!(robot.utilization(), 0.0);
    }
}

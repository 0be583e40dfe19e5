use crate::core::components::job::Job;
use crate::core::errors::SimResult;
use crate::core::event::DeviceEvent;
use crate::core::routing::RoutingTopology;
use crate::core::state::{DeviceState, DeviceTiming, JobCounters};
use rand::rngs::StdRng;

/// Everything a device may touch while it updates during one tick.
///
/// Jobs are borrowed from the factory arena for the duration of the update;
/// devices refer to jobs by index only.
pub struct TickContext<'a> {
    /// Simulated time at the end of this tick
    pub now: f64,
    pub dt: f64,
    pub jobs: &'a mut [Job],
    pub topology: &'a RoutingTopology,
    /// Used to convert travel distance into transport time
    pub robot_speed: f64,
    pub rng: &'a mut StdRng,
    /// Events raised by devices during this update
    pub events: Vec<DeviceEvent>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        now: f64,
        dt: f64,
        jobs: &'a mut [Job],
        topology: &'a RoutingTopology,
        robot_speed: f64,
        rng: &'a mut StdRng,
    ) -> Self {
        Self {
            now,
            dt,
            jobs,
            topology,
            robot_speed,
            rng,
            events: Vec::new(),
        }
    }

    /// Drain the events raised so far
    pub fn take_events(&mut self) -> Vec<DeviceEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Capability interface shared by every device on the floor.
///
/// Each device type implements its own transition rules: `push_job` and
/// `pop_job` reject the call and leave all state untouched when the device
/// or the job is not in the required precondition state.
pub trait Device {
    fn name(&self) -> &str;

    fn device_state(&self) -> DeviceState;

    fn timing(&self) -> &DeviceTiming;

    fn counters(&self) -> &JobCounters;

    /// Advance the device by one tick
    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<()>;

    /// Hand a job to the device
    fn push_job(&mut self, job: &mut Job) -> SimResult<()>;

    /// Take a job away from the device
    fn pop_job(&mut self, job: &mut Job) -> SimResult<()>;

    fn utilization(&self) -> f64 {
        self.timing().utilization()
    }
}

use super::types::{JobId, Location, MachineId, RobotId, StationId};

/// Something a device did during its update that the rest of the tick
/// must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A machine finished processing and holds the job for pickup
    Halted {
        job: JobId,
        station: StationId,
        machine: MachineId,
    },
    /// A robot reached its pickup point and loaded the job
    PickedUp {
        robot: RobotId,
        job: JobId,
        from: Location,
    },
    /// A robot reached its delivery point and unloaded the job
    Delivered {
        robot: RobotId,
        job: JobId,
        to: Location,
    },
}

impl DeviceEvent {
    pub fn job(&self) -> JobId {
        match self {
            DeviceEvent::Halted { job, .. }
            | DeviceEvent::PickedUp { job, .. }
            | DeviceEvent::Delivered { job, .. } => *job,
        }
    }

    /// True when a job has been handed back to the factory exit
    pub fn is_retirement(&self) -> bool {
        matches!(
            self,
            DeviceEvent::Delivered {
                to: Location::Factory,
                ..
            }
        )
    }
}

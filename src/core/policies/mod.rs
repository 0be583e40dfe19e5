//! Dispatch policies
//!
//! Policy names from configuration are resolved once into a closed enum and
//! then into a boxed strategy object; nothing is re-dispatched by name while
//! the simulation runs.

pub mod machine_dispatch;
pub mod queue_learning;
pub mod robot_dispatch;

use crate::core::components::job::Job;
use crate::core::errors::SimError;
use crate::core::routing::RoutingTopology;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use machine_dispatch::{FifoDispatch, MachineDispatch, NehDispatch, QueuedJob, RandomDispatch};
pub use queue_learning::{QLearningConfig, QueueLearner};
pub use robot_dispatch::{
    Candidate, DistanceDispatch, PickupBoard, PickupSource, RandomRobotDispatch, RobotDispatch,
};

/// How a workstation picks the next queued job for an idle machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MachinePolicyKind {
    /// Queue head first
    #[default]
    Fifo,
    /// Uniformly random queued job
    Random,
    /// Largest total remaining processing time first
    Neh,
}

impl MachinePolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachinePolicyKind::Fifo => "FIFO",
            MachinePolicyKind::Random => "RANDOM",
            MachinePolicyKind::Neh => "NEH",
        }
    }

    pub fn build(&self) -> Box<dyn MachineDispatch> {
        match self {
            MachinePolicyKind::Fifo => Box::new(FifoDispatch),
            MachinePolicyKind::Random => Box::new(RandomDispatch),
            MachinePolicyKind::Neh => Box::new(NehDispatch),
        }
    }
}

impl FromStr for MachinePolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIFO" | "DEFAULT" => Ok(MachinePolicyKind::Fifo),
            "RANDOM" => Ok(MachinePolicyKind::Random),
            "NEH" => Ok(MachinePolicyKind::Neh),
            _ => Err(SimError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for MachinePolicyKind {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MachinePolicyKind> for String {
    fn from(kind: MachinePolicyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for MachinePolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an idle robot picks the next job to transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RobotPolicyKind {
    /// Uniformly random pickup-eligible job
    #[default]
    Random,
    /// Nearest source, random job within it
    Distance,
    /// Nearest source, largest remaining processing time within it
    DistanceNeh,
}

impl RobotPolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotPolicyKind::Random => "DEFAULT",
            RobotPolicyKind::Distance => "DISTANCE",
            RobotPolicyKind::DistanceNeh => "DISTANCE_NEH",
        }
    }

    pub fn build(&self) -> Box<dyn RobotDispatch> {
        match self {
            RobotPolicyKind::Random => Box::new(RandomRobotDispatch),
            RobotPolicyKind::Distance => Box::new(DistanceDispatch::random_within()),
            RobotPolicyKind::DistanceNeh => Box::new(DistanceDispatch::longest_within()),
        }
    }
}

impl FromStr for RobotPolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" | "RANDOM" => Ok(RobotPolicyKind::Random),
            "DISTANCE" => Ok(RobotPolicyKind::Distance),
            "DISTANCE_NEH" => Ok(RobotPolicyKind::DistanceNeh),
            _ => Err(SimError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for RobotPolicyKind {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RobotPolicyKind> for String {
    fn from(kind: RobotPolicyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for RobotPolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service time of every unfinished step plus the time a robot needs to
/// carry the job along the rest of its route and back to the exit
pub fn remaining_processing_time(job: &Job, topology: &RoutingTopology, robot_speed: f64) -> f64 {
    let (origin, stops) = job.remaining_path();
    let transport = if robot_speed > 0.0 {
        topology.travel_distance(origin, stops) / robot_speed
    } else {
        0.0
    };
    job.remaining_service_time() + transport
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;

    #[test]
    fn test_parse_machine_policy() {
        assert_eq!("FIFO".parse::<MachinePolicyKind>().unwrap(), MachinePolicyKind::Fifo);
        assert_eq!("default".parse::<MachinePolicyKind>().unwrap(), MachinePolicyKind::Fifo);
        assert_eq!("random".parse::<MachinePolicyKind>().unwrap(), MachinePolicyKind::Random);
        assert_eq!(" NEH ".parse::<MachinePolicyKind>().unwrap(), MachinePolicyKind::Neh);
        assert_eq!(
            "SPT".parse::<MachinePolicyKind>(),
            Err(SimError::UnknownPolicy("SPT".to_string()))
        );
    }

    #[test]
    fn test_parse_robot_policy() {
        assert_eq!("DEFAULT".parse::<RobotPolicyKind>().unwrap(), RobotPolicyKind::Random);
        assert_eq!("distance".parse::<RobotPolicyKind>().unwrap(), RobotPolicyKind::Distance);
        assert_eq!(
            "DISTANCE_NEH".parse::<RobotPolicyKind>().unwrap(),
            RobotPolicyKind::DistanceNeh
        );
        assert!(matches!("R1".parse::<RobotPolicyKind>(), Err(SimError::UnknownPolicy(_))));
    }

    #[test]
    fn test_policy_names_round_trip() {
        for kind in [MachinePolicyKind::Fifo, MachinePolicyKind::Random, MachinePolicyKind::Neh] {
            assert_eq!(kind.to_string().parse::<MachinePolicyKind>().unwrap(), kind);
            assert_eq!(kind.build().kind(), kind);
        }
        for kind in [RobotPolicyKind::Random, RobotPolicyKind::Distance, RobotPolicyKind::DistanceNeh] {
            assert_eq!(kind.to_string().parse::<RobotPolicyKind>().unwrap(), kind);
            assert_eq!(kind.build().kind(), kind);
        }
    }

    #[test]
    fn test_remaining_processing_time() {
        let topology = RoutingTopology::new(
            Position::new(0.0, 0.0),
            vec![Position::new(0.0, 10.0), Position::new(0.0, 20.0)],
            vec![vec![0, 1]],
        );
        let job = Job::new(0, 0, vec![0, 1], vec![100.0, 50.0], 0.0);
        // exit -> 0 -> 1 -> exit is 40 ft, at 2 ft/s that is 20 s
        assert_eq!(remaining_processing_time(&job, &topology, 2.0), 170.0);
    }
}

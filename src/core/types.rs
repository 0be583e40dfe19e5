use serde::{Deserialize, Serialize};

/// Index of a job in the factory's job arena
pub type JobId = usize;
/// Index of a workstation in the factory
pub type StationId = usize;
/// Index of a machine inside its workstation
pub type MachineId = usize;
/// Index of a robot in the factory
pub type RobotId = usize;
/// Index of a job class in the configured type table
pub type JobType = usize;

/// Point on the factory floor, in feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// A place jobs are picked up from or delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// The factory entry/exit
    Factory,
    Station(StationId),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Factory => write!(f, "Entry"),
            Location::Station(id) => write!(f, "W{}", id + 1),
        }
    }
}

/// Where a job physically is. Non-owning: every variant is an index
/// resolved through the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    /// Not yet admitted to the factory
    Schedule,
    FactoryInput,
    StationInput(StationId),
    Machine(StationId, MachineId),
    StationOutput(StationId),
    Robot(RobotId),
    Retired,
}

impl Holder {
    /// The pickup location for a job held here, if it can be picked up from it
    pub fn pickup_location(&self) -> Option<Location> {
        match self {
            Holder::FactoryInput => Some(Location::Factory),
            Holder::Machine(station, _) | Holder::StationOutput(station) => {
                Some(Location::Station(*station))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::Factory.to_string(), "Entry");
        assert_eq!(Location::Station(0).to_string(), "W1");
    }

    #[test]
    fn test_pickup_location() {
        assert_eq!(Holder::FactoryInput.pickup_location(), Some(Location::Factory));
        assert_eq!(Holder::Machine(2, 1).pickup_location(), Some(Location::Station(2)));
        assert_eq!(Holder::StationInput(2).pickup_location(), None);
        assert_eq!(Holder::Robot(0).pickup_location(), None);
    }
}

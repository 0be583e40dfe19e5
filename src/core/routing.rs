use crate::core::execution::config::FactoryConfig;
use crate::core::types::{JobType, Location, Position, StationId};

/// Static layout of the floor: station positions, the distance matrix
/// between every pair of locations, and the routing template of each job
/// type.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTopology {
    factory_position: Position,
    station_positions: Vec<Position>,
    routings: Vec<Vec<StationId>>,
    /// Square matrix over stations 0..n followed by the factory entry at n
    distances: Vec<Vec<f64>>,
}

impl RoutingTopology {
    pub fn new(
        factory_position: Position,
        station_positions: Vec<Position>,
        routings: Vec<Vec<StationId>>,
    ) -> Self {
        let mut points = station_positions.clone();
        points.push(factory_position);
        let distances = points
            .iter()
            .map(|a| points.iter().map(|b| a.distance_to(b)).collect())
            .collect();

        Self {
            factory_position,
            station_positions,
            routings,
            distances,
        }
    }

    pub fn from_config(config: &FactoryConfig) -> Self {
        Self::new(
            config.factory_position,
            config.stations.iter().map(|s| s.position).collect(),
            config.job_types.iter().map(|t| t.routing.clone()).collect(),
        )
    }

    pub fn num_stations(&self) -> usize {
        self.station_positions.len()
    }

    pub fn num_job_types(&self) -> usize {
        self.routings.len()
    }

    /// Routing template for a job type, empty for an unknown type
    pub fn routing(&self, job_type: JobType) -> &[StationId] {
        self.routings.get(job_type).map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn position(&self, location: Location) -> Position {
        match location {
            Location::Factory => self.factory_position,
            Location::Station(id) => self
                .station_positions
                .get(id)
                .copied()
                .unwrap_or(self.factory_position),
        }
    }

    pub fn distance(&self, from: Location, to: Location) -> f64 {
        match (self.index(from), self.index(to)) {
            (Some(a), Some(b)) => self.distances[a][b],
            _ => self.position(from).distance_to(&self.position(to)),
        }
    }

    /// Length of the trip from `origin` through each of `stops` in order and
    /// back to the factory exit
    pub fn travel_distance(&self, origin: Location, stops: &[StationId]) -> f64 {
        let mut total = 0.0;
        let mut at = origin;
        for stop in stops {
            let next = Location::Station(*stop);
            total += self.distance(at, next);
            at = next;
        }
        total + self.distance(at, Location::Factory)
    }

    fn index(&self, location: Location) -> Option<usize> {
        match location {
            Location::Factory => Some(self.station_positions.len()),
            Location::Station(id) if id < self.station_positions.len() => Some(id),
            Location::Station(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> RoutingTopology {
        RoutingTopology::new(
            Position::new(0.0, 0.0),
            vec![Position::new(0.0, 30.0), Position::new(40.0, 30.0)],
            vec![vec![0, 1], vec![1]],
        )
    }

    #[test]
    fn test_distance_matrix() {
        let topology = square();
        assert_eq!(topology.distance(Location::Factory, Location::Station(0)), 30.0);
        assert_eq!(topology.distance(Location::Station(0), Location::Station(1)), 40.0);
        assert_eq!(topology.distance(Location::Station(1), Location::Factory), 50.0);
        assert_eq!(topology.distance(Location::Station(1), Location::Station(1)), 0.0);
    }

    #[test]
    fn test_travel_distance() {
        let topology = square();
        // 0 -> 1 -> exit
        assert_eq!(topology.travel_distance(Location::Station(0), &[1]), 90.0);
        // exit -> 0 -> 1 -> exit
        assert_eq!(topology.travel_distance(Location::Factory, topology.routing(0)), 120.0);
        assert_eq!(topology.travel_distance(Location::Factory, &[]), 0.0);
    }

    #[test]
    fn test_from_default_config() {
        let topology = RoutingTopology::from_config(&FactoryConfig::default());
        assert_eq!(topology.num_stations(), 5);
        assert_eq!(topology.routing(1), &[3, 0, 2]);
        assert_eq!(topology.routing(9), &[] as &[StationId]);
        assert_eq!(topology.position(Location::Station(0)), Position::new(-150.0, 0.0));
    }
}

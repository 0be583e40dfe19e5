use super::RobotPolicyKind;
use crate::core::types::{JobId, Location, Position};
use rand::rngs::StdRng;
use rand::Rng;

/// A pickup-eligible job and its total remaining processing time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub job: JobId,
    pub remaining: f64,
}

/// A place holding at least one pickup-eligible job
#[derive(Debug, Clone, PartialEq)]
pub struct PickupSource {
    pub location: Location,
    pub position: Position,
    pub candidates: Vec<Candidate>,
}

/// Every pickup-eligible job on the floor, grouped by source. Built once
/// per dispatch round; claimed jobs are removed as robots take them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickupBoard {
    sources: Vec<PickupSource>,
}

impl PickupBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate under its source, creating the source on first use
    pub fn add(&mut self, location: Location, position: Position, candidate: Candidate) {
        match self.sources.iter_mut().find(|s| s.location == location) {
            Some(source) => source.candidates.push(candidate),
            None => self.sources.push(PickupSource {
                location,
                position,
                candidates: vec![candidate],
            }),
        }
    }

    /// Drop a claimed job, and its source if it becomes empty
    pub fn remove(&mut self, job: JobId) {
        for source in &mut self.sources {
            source.candidates.retain(|c| c.job != job);
        }
        self.sources.retain(|s| !s.candidates.is_empty());
    }

    pub fn sources(&self) -> &[PickupSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.candidates.len()).sum()
    }

    /// The source a job is waiting at
    pub fn source_of(&self, job: JobId) -> Option<&PickupSource> {
        self.sources
            .iter()
            .find(|s| s.candidates.iter().any(|c| c.job == job))
    }

    /// Every candidate in job index order
    pub fn all_jobs(&self) -> Vec<JobId> {
        let mut jobs: Vec<JobId> = self
            .sources
            .iter()
            .flat_map(|s| s.candidates.iter().map(|c| c.job))
            .collect();
        jobs.sort_unstable();
        jobs
    }
}

/// Robot to job assignment strategy, consulted once per idle robot each tick
pub trait RobotDispatch: Send + std::fmt::Debug {
    fn kind(&self) -> RobotPolicyKind;

    /// The job an idle robot standing at `robot_position` should claim
    fn select(
        &mut self,
        robot_position: Position,
        board: &PickupBoard,
        rng: &mut StdRng,
    ) -> Option<JobId>;
}

/// Uniform choice among all pickup-eligible jobs
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRobotDispatch;

impl RobotDispatch for RandomRobotDispatch {
    fn kind(&self) -> RobotPolicyKind {
        RobotPolicyKind::Random
    }

    fn select(&mut self, _robot_position: Position, board: &PickupBoard, rng: &mut StdRng) -> Option<JobId> {
        let jobs = board.all_jobs();
        if jobs.is_empty() {
            None
        } else {
            Some(jobs[rng.gen_range(0..jobs.len())])
        }
    }
}

/// Greedy nearest source. Within the chosen source the job is either drawn
/// at random or is the one with the largest remaining processing time.
#[derive(Debug, Clone, Copy)]
pub struct DistanceDispatch {
    longest_first: bool,
}

impl DistanceDispatch {
    pub fn random_within() -> Self {
        Self { longest_first: false }
    }

    pub fn longest_within() -> Self {
        Self { longest_first: true }
    }

    /// Nearest source to `position`; ties go to the source listed first
    pub fn nearest<'a>(position: Position, board: &'a PickupBoard) -> Option<&'a PickupSource> {
        let mut best: Option<(&PickupSource, f64)> = None;
        for source in board.sources() {
            let distance = position.distance_to(&source.position);
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((source, distance)),
            }
        }
        best.map(|(source, _)| source)
    }
}

impl RobotDispatch for DistanceDispatch {
    fn kind(&self) -> RobotPolicyKind {
        if self.longest_first {
            RobotPolicyKind::DistanceNeh
        } else {
            RobotPolicyKind::Distance
        }
    }

    fn select(&mut self, robot_position: Position, board: &PickupBoard, rng: &mut StdRng) -> Option<JobId> {
        let source = Self::nearest(robot_position, board)?;
        if source.candidates.is_empty() {
            return None;
        }
        if self.longest_first {
            let mut best = &source.candidates[0];
            for candidate in &source.candidates[1..] {
                if candidate.remaining > best.remaining {
                    best = candidate;
                }
            }
            Some(best.job)
        } else {
            let index = rng.gen_range(0..source.candidates.len());
            Some(source.candidates[index].job)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn two_sources() -> PickupBoard {
        let mut board = PickupBoard::new();
        board.add(
            Location::Station(0),
            Position::new(25.0, 0.0),
            Candidate { job: 1, remaining: 100.0 },
        );
        board.add(
            Location::Station(1),
            Position::new(0.0, 10.0),
            Candidate { job: 2, remaining: 5.0 },
        );
        board
    }

    #[test]
    fn test_distance_picks_nearest_source() {
        let board = two_sources();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut policy = DistanceDispatch::random_within();
            assert_eq!(policy.select(Position::new(0.0, 0.0), &board, &mut rng), Some(2));
            let mut policy = DistanceDispatch::longest_within();
            assert_eq!(policy.select(Position::new(0.0, 0.0), &board, &mut rng), Some(2));
        }
    }

    #[test]
    fn test_distance_neh_picks_longest_within_source() {
        let mut board = PickupBoard::new();
        let here = Position::new(0.0, 0.0);
        board.add(Location::Factory, here, Candidate { job: 4, remaining: 20.0 });
        board.add(Location::Factory, here, Candidate { job: 7, remaining: 90.0 });
        board.add(Location::Factory, here, Candidate { job: 9, remaining: 40.0 });
        board.add(Location::Station(3), Position::new(500.0, 0.0), Candidate { job: 1, remaining: 999.0 });

        let mut rng = StdRng::seed_from_u64(1);
        let mut policy = DistanceDispatch::longest_within();
        assert_eq!(policy.select(here, &board, &mut rng), Some(7));
    }

    #[test]
    fn test_random_choice_covers_all_sources() {
        let board = two_sources();
        let mut seen = std::collections::HashSet::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..64 {
            seen.insert(RandomRobotDispatch.select(Position::default(), &board, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_empty_board() {
        let board = PickupBoard::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(RandomRobotDispatch.select(Position::default(), &board, &mut rng), None);
        assert_eq!(
            DistanceDispatch::random_within().select(Position::default(), &board, &mut rng),
            None
        );
    }

    #[test]
    fn test_board_remove() {
        let mut board = two_sources();
        assert_eq!(board.len(), 2);
        board.remove(2);
        assert_eq!(board.len(), 1);
        assert_eq!(board.sources().len(), 1);
        assert_eq!(board.source_of(1).map(|s| s.location), Some(Location::Station(0)));
        assert!(board.source_of(2).is_none());
    }
}

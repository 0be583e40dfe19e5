/// Configuration for factory simulation runs
///
/// `FactoryConfig` is the immutable description of the plant, the job mix and
/// the dispatch policies. It is loaded once and handed to the simulation
/// constructor. `ExecutionConfig` controls how independent replications are
/// scheduled onto threads.
use crate::core::errors::{SimError, SimResult};
use crate::core::policies::queue_learning::QLearningConfig;
use crate::core::policies::{MachinePolicyKind, RobotPolicyKind};
use crate::core::types::{Position, StationId};
use serde::{Deserialize, Serialize};
use std::path::Path;

const HOUR: f64 = 3600.0;

/// One workstation: where it stands and how many machines it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub position: Position,
    pub machines: usize,
}

impl StationConfig {
    pub fn new(x: f64, y: f64, machines: usize) -> Self {
        Self {
            position: Position::new(x, y),
            machines,
        }
    }
}

/// The robot/forklift fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub count: usize,
    /// Feet per second
    pub speed: f64,
}

/// One job class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTypeConfig {
    /// Workstation indices to visit, in order
    pub routing: Vec<StationId>,
    /// Mean service time in seconds for each routing step
    pub mean_service_times: Vec<f64>,
    /// Relative weight in the arrival mix
    pub probability: f64,
}

impl JobTypeConfig {
    pub fn new(routing: Vec<StationId>, mean_service_times: Vec<f64>, probability: f64) -> Self {
        Self {
            routing,
            mean_service_times,
            probability,
        }
    }
}

/// Static description of a factory simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Entry/exit point where jobs arrive and retire
    pub factory_position: Position,
    pub stations: Vec<StationConfig>,
    pub robots: RobotConfig,
    pub job_types: Vec<JobTypeConfig>,
    /// Shape parameter shared by every service-time Gamma distribution
    pub gamma_shape: f64,
    /// Jobs per second
    pub arrival_rate: f64,
    /// Number of jobs in the pre-generated arrival schedule
    pub max_jobs: usize,
    pub seed: u64,
    /// Simulated seconds per tick
    pub dt: f64,
    /// Simulated seconds to run
    pub horizon: f64,
    pub machine_policy: MachinePolicyKind,
    pub robot_policy: RobotPolicyKind,
    /// Enables the tabular queue reorder learner at every workstation
    pub queue_learning: Option<QLearningConfig>,
}

impl FactoryConfig {
    /// Create the reference five-station plant
    pub fn new() -> Self {
        Self {
            factory_position: Position::new(0.0, 0.0),
            stations: vec![
                StationConfig::new(-150.0, 0.0, 3),
                StationConfig::new(-150.0, 150.0, 5),
                StationConfig::new(0.0, 150.0, 3),
                StationConfig::new(150.0, 150.0, 4),
                StationConfig::new(150.0, 0.0, 2),
            ],
            robots: RobotConfig {
                count: 3,
                speed: 5.0,
            },
            job_types: vec![
                JobTypeConfig::new(
                    vec![2, 0, 1, 4],
                    vec![0.25 * HOUR, 0.15 * HOUR, 0.10 * HOUR, 0.30 * HOUR],
                    0.3,
                ),
                JobTypeConfig::new(
                    vec![3, 0, 2],
                    vec![0.15 * HOUR, 0.20 * HOUR, 0.30 * HOUR],
                    0.5,
                ),
                JobTypeConfig::new(
                    vec![1, 4, 0, 3, 2],
                    vec![0.15 * HOUR, 0.10 * HOUR, 0.35 * HOUR, 0.20 * HOUR, 0.20 * HOUR],
                    0.2,
                ),
            ],
            gamma_shape: 2.0,
            arrival_rate: 25.0 / HOUR,
            max_jobs: 200,
            seed: 42,
            dt: 0.05,
            horizon: HOUR,
            machine_policy: MachinePolicyKind::default(),
            robot_policy: RobotPolicyKind::default(),
            queue_learning: None,
        }
    }

    /// Parse a JSON document and validate it. Missing fields fall back to
    /// the reference plant.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        // Surface bad policy names as such rather than as a parse failure
        if let Some(name) = value.get("machine_policy").and_then(|v| v.as_str()) {
            name.parse::<MachinePolicyKind>()?;
        }
        if let Some(name) = value.get("robot_policy").and_then(|v| v.as_str()) {
            name.parse::<RobotPolicyKind>()?;
        }
        let config: FactoryConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    pub fn with_arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    pub fn with_stations(mut self, stations: Vec<StationConfig>) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_robots(mut self, count: usize, speed: f64) -> Self {
        self.robots = RobotConfig { count, speed };
        self
    }

    pub fn with_job_types(mut self, job_types: Vec<JobTypeConfig>) -> Self {
        self.job_types = job_types;
        self
    }

    pub fn with_machine_policy(mut self, policy: MachinePolicyKind) -> Self {
        self.machine_policy = policy;
        self
    }

    pub fn with_robot_policy(mut self, policy: RobotPolicyKind) -> Self {
        self.robot_policy = policy;
        self
    }

    pub fn with_queue_learning(mut self, learning: QLearningConfig) -> Self {
        self.queue_learning = Some(learning);
        self
    }

    /// Number of ticks needed to reach the horizon
    pub fn total_ticks(&self) -> u64 {
        (self.horizon / self.dt).round() as u64
    }

    /// Check structural and numeric consistency
    pub fn validate(&self) -> SimResult<()> {
        if self.stations.is_empty() {
            return Err(SimError::config("at least one workstation is required"));
        }
        for (i, station) in self.stations.iter().enumerate() {
            if station.machines == 0 {
                return Err(SimError::config(format!("workstation {} has no machines", i)));
            }
        }
        if self.robots.count == 0 {
            return Err(SimError::config("at least one robot is required"));
        }
        positive("robot speed", self.robots.speed)?;
        positive("dt", self.dt)?;
        positive("horizon", self.horizon)?;
        positive("arrival rate", self.arrival_rate)?;
        positive("gamma shape", self.gamma_shape)?;

        if self.job_types.is_empty() {
            return Err(SimError::config("at least one job type is required"));
        }
        let mut weight_sum = 0.0;
        for (t, job_type) in self.job_types.iter().enumerate() {
            if job_type.routing.is_empty() {
                return Err(SimError::config(format!("job type {} has an empty routing", t)));
            }
            if let Some(bad) = job_type.routing.iter().find(|s| **s >= self.stations.len()) {
                return Err(SimError::config(format!(
                    "job type {} routes to missing workstation {}",
                    t, bad
                )));
            }
            if job_type.mean_service_times.len() != job_type.routing.len() {
                return Err(SimError::config(format!(
                    "job type {} has {} routing steps but {} mean service times",
                    t,
                    job_type.routing.len(),
                    job_type.mean_service_times.len()
                )));
            }
            for mean in &job_type.mean_service_times {
                positive("mean service time", *mean)?;
            }
            if !(job_type.probability >= 0.0) {
                return Err(SimError::config(format!("job type {} has a negative probability", t)));
            }
            weight_sum += job_type.probability;
        }
        if weight_sum <= 0.0 {
            return Err(SimError::config("job type probabilities sum to zero"));
        }

        if let Some(learning) = &self.queue_learning {
            learning.validate()?;
        }
        Ok(())
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!("{} must be positive, got {}", name, value)))
    }
}

/// Enumeration of supported concurrency modes for replications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    #[default]
    Sequential,
    /// Replications run concurrently on a Rayon pool
    Rayon,
}

/// Controls how independent simulation runs are executed
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    pub concurrency_mode: ConcurrencyMode,
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FactoryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stations.len(), 5);
        assert_eq!(config.job_types.len(), 3);
        assert_eq!(config.total_ticks(), 72_000);
    }

    #[test]
    fn test_config_builder() {
        let config = FactoryConfig::new()
            .with_seed(7)
            .with_horizon(100.0)
            .with_dt(1.0)
            .with_robots(2, 10.0)
            .with_machine_policy(MachinePolicyKind::Neh)
            .with_robot_policy(RobotPolicyKind::Distance);

        assert_eq!(config.seed, 7);
        assert_eq!(config.total_ticks(), 100);
        assert_eq!(config.robots.count, 2);
        assert_eq!(config.machine_policy, MachinePolicyKind::Neh);
        assert_eq!(config.robot_policy, RobotPolicyKind::Distance);
    }

    #[test]
    fn test_rejects_bad_routing() {
        let config = FactoryConfig::new()
            .with_job_types(vec![JobTypeConfig::new(vec![0, 9], vec![10.0, 10.0], 1.0)]);
        assert!(matches!(config.validate(), Err(SimError::Config(_))));

        let config = FactoryConfig::new()
            .with_job_types(vec![JobTypeConfig::new(vec![0, 1], vec![10.0], 1.0)]);
        assert!(matches!(config.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(FactoryConfig::new().with_dt(0.0).validate().is_err());
        assert!(FactoryConfig::new().with_horizon(-1.0).validate().is_err());
        assert!(FactoryConfig::new().with_robots(0, 5.0).validate().is_err());
        assert!(FactoryConfig::new().with_robots(1, 0.0).validate().is_err());
        assert!(FactoryConfig::new().with_arrival_rate(0.0).validate().is_err());
    }

    #[test]
    fn test_json_partial_override() {
        let config = FactoryConfig::from_json_str(
            r#"{ "seed": 11, "machine_policy": "NEH", "robot_policy": "DISTANCE_NEH" }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 11);
        assert_eq!(config.machine_policy, MachinePolicyKind::Neh);
        assert_eq!(config.robot_policy, RobotPolicyKind::DistanceNeh);
        assert_eq!(config.stations.len(), 5);
    }

    #[test]
    fn test_json_unknown_policy_is_error() {
        let result = FactoryConfig::from_json_str(r#"{ "robot_policy": "TELEPORT" }"#);
        match result {
            Err(SimError::UnknownPolicy(name)) => assert_eq!(name, "TELEPORT"),
            other => panic!("expected unknown policy, got {:?}", other),
        }
    }

    #[test]
    fn test_execution_config_builder() {
        let config = ExecutionConfig::new()
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(4);

        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.thread_pool_size, Some(4));
        assert_eq!(ExecutionConfig::default().concurrency_mode, ConcurrencyMode::Sequential);
    }
}


use crate::core::execution::config::{FactoryConfig, JobTypeConfig, StationConfig};

/// Two stations close to the entry, light load, fast service. Every job of
/// the schedule finishes well inside the horizon.
pub(crate) fn small_line_config() -> FactoryConfig {
    FactoryConfig::new()
        .with_stations(vec![
            StationConfig::new(10.0, 0.0, 2),
            StationConfig::new(10.0, 10.0, 2),
        ])
        .with_robots(3, 5.0)
        .with_job_types(vec![
            JobTypeConfig::new(vec![0, 1], vec![5.0, 5.0], 0.6),
            JobTypeConfig::new(vec![1], vec![8.0], 0.4),
        ])
        .with_arrival_rate(0.05)
        .with_max_jobs(20)
        .with_dt(0.5)
        .with_horizon(2000.0)
}

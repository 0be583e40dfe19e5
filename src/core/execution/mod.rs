pub mod config;
pub mod cycle_engine;
pub mod execution_order;
pub mod replication;
pub mod simulation_engine;

// Re-export commonly used types
pub use config::{ConcurrencyMode, ExecutionConfig, FactoryConfig, JobTypeConfig, RobotConfig, StationConfig};
pub use cycle_engine::CycleEngine;
pub use execution_order::{TickPhase, TICK_ORDER};
pub use replication::run_replications;
pub use simulation_engine::{SimulationEngine, SimulationObserver};

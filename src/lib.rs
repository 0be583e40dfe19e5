pub mod core;

// Re-export commonly used types
pub use crate::core::errors::{SimError, SimResult};
pub use crate::core::execution::{
    run_replications, ConcurrencyMode, CycleEngine, ExecutionConfig, FactoryConfig, SimulationEngine,
    SimulationObserver,
};
pub use crate::core::factory::Factory;
pub use crate::core::metrics::{MetricsCollector, RunSummary};
pub use crate::core::policies::{MachinePolicyKind, QLearningConfig, RobotPolicyKind};
pub use crate::core::snapshot::{FactorySnapshot, SharedSnapshot};

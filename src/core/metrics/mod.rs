pub mod analysis;
pub mod collector;
pub mod summary;

pub use analysis::{littles_law_wait, time_average, trapezoid};
pub use collector::{JobRecord, MetricsCollector, QueueSample};
pub use summary::{RobotReport, RunSummary, StationReport};

pub mod hub;
pub mod job;
pub mod machine;
pub mod robot;
pub mod traits;
pub mod workstation;

// Re-export commonly used types
pub use hub::Hub;
pub use job::Job;
pub use machine::Machine;
pub use robot::Robot;
pub use traits::{Device, TickContext};
pub use workstation::Workstation;

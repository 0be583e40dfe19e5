use serde::Serialize;
use std::fmt;

/// One stage of a simulation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TickPhase {
    AdvanceClock,
    AdmitArrivals,
    UpdateWorkstations,
    UpdateRobots,
    DispatchRobots,
}

/// The fixed stage order every cycle follows. Workstations always update
/// before robots, and robot dispatch always sees the settled floor.
pub const TICK_ORDER: [TickPhase; 5] = [
    TickPhase::AdvanceClock,
    TickPhase::AdmitArrivals,
    TickPhase::UpdateWorkstations,
    TickPhase::UpdateRobots,
    TickPhase::DispatchRobots,
];

impl TickPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickPhase::AdvanceClock => "advance_clock",
            TickPhase::AdmitArrivals => "admit_arrivals",
            TickPhase::UpdateWorkstations => "update_workstations",
            TickPhase::UpdateRobots => "update_robots",
            TickPhase::DispatchRobots => "dispatch_robots",
        }
    }

    /// Position within the cycle, starting at 0
    pub fn stage(&self) -> usize {
        TICK_ORDER.iter().position(|p| p == self).unwrap_or(TICK_ORDER.len())
    }
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

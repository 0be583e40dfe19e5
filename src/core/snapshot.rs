//! Read-only views of the floor for presentation layers
//!
//! A snapshot is taken between ticks and never refers back into the live
//! simulation, so it can be handed to another thread.

use crate::core::components::Device;
use crate::core::errors::SimResult;
use crate::core::execution::simulation_engine::SimulationObserver;
use crate::core::factory::Factory;
use crate::core::state::{JobState, MachineState, RobotState};
use crate::core::types::{Holder, JobId, Position, RobotId, StationId};
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineView {
    pub name: String,
    pub state: MachineState,
    pub job: Option<JobId>,
    pub progress: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    pub id: StationId,
    pub name: String,
    pub position: Position,
    pub machines: Vec<MachineView>,
    pub input_queue: Vec<JobId>,
    pub output_queue: Vec<JobId>,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotView {
    pub id: RobotId,
    pub name: String,
    pub position: Position,
    pub state: RobotState,
    /// Job claimed by the current order, loaded or not
    pub job: Option<JobId>,
    pub target: Position,
    /// Share of the current leg covered
    pub progress: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub name: String,
    pub job_type: usize,
    pub state: JobState,
    pub current_step: usize,
    pub holder: Holder,
}

/// The whole floor at one tick boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorySnapshot {
    pub time: f64,
    pub ticks: u64,
    pub entry_queue: Vec<JobId>,
    pub stations: Vec<StationView>,
    pub robots: Vec<RobotView>,
    /// Admitted and not yet retired
    pub live_jobs: Vec<JobView>,
    pub jobs_completed: u64,
}

impl FactorySnapshot {
    pub fn capture(factory: &Factory) -> Self {
        let stations = factory
            .workstations()
            .iter()
            .map(|ws| StationView {
                id: ws.id(),
                name: ws.name().to_string(),
                position: ws.position(),
                machines: ws
                    .machines()
                    .iter()
                    .map(|m| MachineView {
                        name: m.name().to_string(),
                        state: m.state(),
                        job: m.current_job(),
                        progress: m.progress(),
                        utilization: m.utilization(),
                    })
                    .collect(),
                input_queue: ws.input_queue().to_vec(),
                output_queue: ws.output_queue().to_vec(),
                utilization: ws.machine_utilization(),
            })
            .collect();

        let robots = factory
            .robots()
            .iter()
            .map(|r| RobotView {
                id: r.id(),
                name: r.name().to_string(),
                position: r.position(),
                state: r.state(),
                job: r.assigned_job(),
                target: r.target(),
                progress: r.leg_progress(),
                utilization: r.utilization(),
            })
            .collect();

        let live_jobs = factory
            .hub()
            .live_jobs()
            .iter()
            .filter_map(|id| factory.job(*id))
            .map(|job| JobView {
                id: job.id(),
                name: job.name().to_string(),
                job_type: job.job_type(),
                state: job.state(),
                current_step: job.current_step(),
                holder: job.holder(),
            })
            .collect();

        Self {
            time: factory.time(),
            ticks: factory.ticks(),
            entry_queue: factory.hub().input_queue().to_vec(),
            stations,
            robots,
            live_jobs,
            jobs_completed: factory.jobs_completed(),
        }
    }
}

/// Observer that publishes the latest snapshot for a reader on another
/// thread. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct SharedSnapshot {
    slot: Arc<RwLock<Option<FactorySnapshot>>>,
    interval: u64,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            interval: 1,
        }
    }

    /// Publish only every `ticks` ticks
    pub fn with_interval(mut self, ticks: u64) -> Self {
        self.interval = ticks.max(1);
        self
    }

    /// Most recent published snapshot, if any
    pub fn latest(&self) -> Option<FactorySnapshot> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn publish(&self, snapshot: FactorySnapshot) {
        match self.slot.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationObserver for SharedSnapshot {
    fn on_tick(&mut self, factory: &Factory) -> SimResult<()> {
        if factory.ticks() % self.interval == 0 {
            // Capture outside the lock; readers only ever wait for the swap
            self.publish(FactorySnapshot::capture(factory));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::FactoryConfig;

    #[test]
    fn test_capture_initial_floor() {
        let factory = Factory::new(FactoryConfig::default()).unwrap();
        let snapshot = FactorySnapshot::capture(&factory);
        assert_eq!(snapshot.ticks, 0);
        assert_eq!(snapshot.stations.len(), 5);
        assert_eq!(snapshot.stations[1].machines.len(), 5);
        assert_eq!(snapshot.robots.len(), 3);
        assert!(snapshot.live_jobs.is_empty());
        assert!(snapshot.robots.iter().all(|r| r.state == RobotState::Idle));
    }

    #[test]
    fn test_shared_slot_visible_across_clones() {
        let factory = Factory::new(FactoryConfig::default()).unwrap();
        let mut writer = SharedSnapshot::new();
        let reader = writer.clone();
        assert!(reader.latest().is_none());

        writer.on_tick(&factory).unwrap();
        assert_eq!(reader.latest().map(|s| s.ticks), Some(0));
    }

    #[test]
    fn test_snapshot_serializes() {
        let factory = Factory::new(FactoryConfig::default()).unwrap();
        let json = serde_json::to_string(&FactorySnapshot::capture(&factory)).unwrap();
        assert!(json.contains("\"entry_queue\""));
    }
}

use crate::core::components::Device;
use crate::core::errors::SimResult;
use crate::core::factory::Factory;
use crate::core::metrics::analysis::littles_law_wait;
use crate::core::metrics::collector::MetricsCollector;
use crate::core::types::{RobotId, StationId};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReport {
    pub station: StationId,
    pub name: String,
    pub machines: usize,
    /// Mean of the per-machine utilisations
    pub utilization: f64,
    pub average_queue_length: f64,
    /// Jobs delivered to the station per simulated second
    pub arrival_rate: f64,
    /// Little's-Law wait in the input queue, seconds
    pub average_wait: Option<f64>,
    pub jobs_processed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotReport {
    pub robot: RobotId,
    pub name: String,
    pub utilization: f64,
    pub loaded_time: f64,
    pub unloaded_time: f64,
    pub distance_travelled: f64,
    pub jobs_delivered: u64,
}

/// End-of-run performance figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub simulated_time: f64,
    pub ticks: u64,
    pub jobs_arrived: u64,
    pub jobs_completed: u64,
    pub jobs_in_process: usize,
    pub mean_flow_time: Option<f64>,
    pub throughput_per_hour: f64,
    pub stations: Vec<StationReport>,
    pub robots: Vec<RobotReport>,
}

impl RunSummary {
    pub fn collect(factory: &Factory, metrics: &MetricsCollector) -> Self {
        let time = factory.time();
        let per_second = |count: u64| if time > 0.0 { count as f64 / time } else { 0.0 };

        let stations = factory
            .workstations()
            .iter()
            .map(|ws| {
                let average_queue_length = metrics.average_queue_length(ws.id()).unwrap_or(0.0);
                let arrival_rate = per_second(ws.counters().total_input);
                StationReport {
                    station: ws.id(),
                    name: ws.name().to_string(),
                    machines: ws.machines().len(),
                    utilization: ws.machine_utilization(),
                    average_queue_length,
                    arrival_rate,
                    average_wait: littles_law_wait(average_queue_length, arrival_rate),
                    jobs_processed: ws.machines().iter().map(|m| m.counters().total_output).sum(),
                }
            })
            .collect();

        let robots = factory
            .robots()
            .iter()
            .map(|robot| RobotReport {
                robot: robot.id(),
                name: robot.name().to_string(),
                utilization: robot.utilization(),
                loaded_time: robot.loaded_time(),
                unloaded_time: robot.unloaded_time(),
                distance_travelled: robot.distance_travelled(),
                jobs_delivered: robot.counters().total_output,
            })
            .collect();

        Self {
            seed: factory.config().seed,
            simulated_time: time,
            ticks: factory.ticks(),
            jobs_arrived: factory.jobs_arrived(),
            jobs_completed: factory.jobs_completed(),
            jobs_in_process: factory.jobs_in_process(),
            mean_flow_time: metrics.mean_flow_time(),
            throughput_per_hour: per_second(factory.jobs_completed()) * 3600.0,
            stations,
            robots,
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {} | t={:.1}s | arrived {} | completed {} | in process {} | {:.2} jobs/h",
            self.seed,
            self.simulated_time,
            self.jobs_arrived,
            self.jobs_completed,
            self.jobs_in_process,
            self.throughput_per_hour
        )?;
        if let Some(flow) = self.mean_flow_time {
            writeln!(f, "mean flow time {:.1}s", flow)?;
        }
        for s in &self.stations {
            writeln!(
                f,
                "  {} x{} util {:.1}% Lq {:.2} Wq {} processed {}",
                s.name,
                s.machines,
                s.utilization * 100.0,
                s.average_queue_length,
                s.average_wait.map_or("-".to_string(), |w| format!("{:.1}s", w)),
                s.jobs_processed
            )?;
        }
        for r in &self.robots {
            writeln!(
                f,
                "  {} util {:.1}% travelled {:.0}ft delivered {}",
                r.name,
                r.utilization * 100.0,
                r.distance_travelled,
                r.jobs_delivered
            )?;
        }
        Ok(())
    }
}

use crate::core::errors::SimResult;
use crate::core::event::DeviceEvent;
use crate::core::execution::execution_order::{TickPhase, TICK_ORDER};
use crate::core::factory::Factory;
use crate::core::metrics::MetricsCollector;
use log::debug;

/// Cycle engine for the factory floor
///
/// Runs the tick phases of a `Factory` in their fixed order and feeds the
/// metrics collector once the cycle has settled.
pub struct CycleEngine {
    factory: Factory,
    metrics: MetricsCollector,
    /// Current cycle number
    current_cycle: u64,
    /// Device events raised during the last cycle
    last_events: Vec<DeviceEvent>,
}

impl CycleEngine {
    /// Create a cycle engine around a freshly built factory. The queue log
    /// starts with a sample at time zero.
    pub fn new(factory: Factory) -> Self {
        let mut metrics = MetricsCollector::new(factory.workstations().len());
        metrics.record_tick(&factory);
        Self {
            factory,
            metrics,
            current_cycle: 0,
            last_events: Vec::new(),
        }
    }

    /// Execute one simulation cycle
    pub fn cycle(&mut self) -> SimResult<()> {
        self.current_cycle += 1;
        debug!("=== Simulation Cycle {} ===", self.current_cycle);
        self.last_events.clear();

        for phase in TICK_ORDER {
            self.run_phase(phase)?;
        }

        for event in &self.last_events {
            if event.is_retirement() {
                if let Some(job) = self.factory.job(event.job()) {
                    self.metrics.record_retirement(job);
                    debug!("{} retired, flow time {:?}", job.name(), job.flow_time());
                }
            }
        }
        self.metrics.record_tick(&self.factory);
        Ok(())
    }

    /// Run a single simulation cycle (alias for cycle method)
    pub fn run_cycle(&mut self) -> SimResult<()> {
        self.cycle()
    }

    fn run_phase(&mut self, phase: TickPhase) -> SimResult<()> {
        match phase {
            TickPhase::AdvanceClock => self.factory.advance_clock(),
            TickPhase::AdmitArrivals => {
                self.factory.admit_arrivals()?;
                Ok(())
            }
            TickPhase::UpdateWorkstations => {
                let events = self.factory.update_workstations()?;
                self.last_events.extend(events);
                Ok(())
            }
            TickPhase::UpdateRobots => {
                let events = self.factory.update_robots()?;
                self.last_events.extend(events);
                Ok(())
            }
            TickPhase::DispatchRobots => {
                self.factory.dispatch_robots()?;
                Ok(())
            }
        }
    }

    /// Get the current cycle number
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn last_events(&self) -> &[DeviceEvent] {
        &self.last_events
    }

    pub fn into_parts(self) -> (Factory, MetricsCollector) {
        (self.factory, self.metrics)
    }
}

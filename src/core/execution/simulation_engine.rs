use crate::core::errors::SimResult;
use crate::core::execution::config::FactoryConfig;
use crate::core::execution::cycle_engine::CycleEngine;
use crate::core::factory::Factory;
use crate::core::metrics::{MetricsCollector, RunSummary};
use log::info;

/// Hook invoked between cycles with a read-only view of the floor
pub trait SimulationObserver: Send {
    /// Called after every complete cycle
    fn on_tick(&mut self, factory: &Factory) -> SimResult<()>;

    /// Called once when the run reaches its end
    fn on_finish(&mut self, _summary: &RunSummary) -> SimResult<()> {
        Ok(())
    }
}

pub struct SimulationEngine {
    cycle_engine: CycleEngine,
    max_cycles: Option<u64>,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl SimulationEngine {
    /// Without `max_cycles` the run ends at the configured horizon
    pub fn new(cycle_engine: CycleEngine, max_cycles: Option<u64>) -> Self {
        Self {
            cycle_engine,
            max_cycles,
            observers: Vec::new(),
        }
    }

    pub fn from_config(config: FactoryConfig) -> SimResult<Self> {
        let factory = Factory::new(config)?;
        Ok(Self::new(CycleEngine::new(factory), None))
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: impl SimulationObserver + 'static) -> Self {
        self.add_observer(Box::new(observer));
        self
    }

    pub fn is_finished(&self) -> bool {
        match self.max_cycles {
            Some(max) => self.current_cycle() >= max,
            None => self.factory().is_finished(),
        }
    }

    pub fn run(&mut self) -> SimResult<RunSummary> {
        let config = self.factory().config();
        info!(
            "Starting run: seed {}, {} stations, {} robots, machine policy {}, robot policy {}",
            config.seed,
            config.stations.len(),
            config.robots.count,
            config.machine_policy,
            config.robot_policy
        );

        while !self.is_finished() {
            self.step()?;
        }

        let summary = self.summary();
        info!(
            "Run finished at t={:.1}s after {} cycles: {} arrived, {} completed",
            summary.simulated_time, summary.ticks, summary.jobs_arrived, summary.jobs_completed
        );
        for observer in &mut self.observers {
            observer.on_finish(&summary)?;
        }
        Ok(summary)
    }

    pub fn step(&mut self) -> SimResult<()> {
        self.cycle_engine.run_cycle()?;
        let factory = self.cycle_engine.factory();
        for observer in &mut self.observers {
            observer.on_tick(factory)?;
        }
        Ok(())
    }

    pub fn current_cycle(&self) -> u64 {
        self.cycle_engine.current_cycle()
    }

    pub fn factory(&self) -> &Factory {
        self.cycle_engine.factory()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        self.cycle_engine.metrics()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::collect(self.factory(), self.metrics())
    }
}

use crate::core::errors::{SimError, SimResult};
use crate::core::execution::config::{ConcurrencyMode, ExecutionConfig, FactoryConfig};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::metrics::RunSummary;
use log::info;
use rayon::prelude::*;

/// Run one independent simulation per seed and return the summaries in seed
/// order. Every run owns its own factory and random streams, so the results
/// do not depend on the concurrency mode.
pub fn run_replications(
    config: &FactoryConfig,
    seeds: &[u64],
    execution: &ExecutionConfig,
) -> SimResult<Vec<RunSummary>> {
    config.validate()?;
    info!(
        "Running {} replications ({:?})",
        seeds.len(),
        execution.concurrency_mode
    );

    let run_one = |seed: u64| -> SimResult<RunSummary> {
        let mut engine = SimulationEngine::from_config(config.clone().with_seed(seed))?;
        let summary = engine.run()?;
        info!(
            "Replication seed {}: {} completed, mean flow {:?}",
            seed, summary.jobs_completed, summary.mean_flow_time
        );
        Ok(summary)
    };

    match execution.concurrency_mode {
        ConcurrencyMode::Sequential => seeds.iter().map(|seed| run_one(*seed)).collect(),
        ConcurrencyMode::Rayon => {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = execution.thread_pool_size {
                builder = builder.num_threads(threads);
            }
            let pool = builder
                .build()
                .map_err(|e| SimError::ThreadPool(e.to_string()))?;
            pool.install(|| seeds.par_iter().map(|seed| run_one(*seed)).collect())
        }
    }
}

use fabsim::core::execution::{ConcurrencyMode, ExecutionConfig};
use fabsim::{run_replications, FactoryConfig, SharedSnapshot, SimulationEngine};
use log::info;

/// Run the factory floor once to the horizon and print the summary.
///
/// Usage: factory_run [config.json] [replications]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            info!("Loading configuration from {}", path);
            FactoryConfig::from_json_file(&path)?
        }
        None => FactoryConfig::default(),
    };
    let replications: u64 = match args.next() {
        Some(n) => n.parse()?,
        None => 1,
    };

    if replications > 1 {
        let seeds: Vec<u64> = (0..replications).map(|i| config.seed + i).collect();
        let execution = ExecutionConfig::new().with_concurrency(ConcurrencyMode::Rayon);
        let summaries = run_replications(&config, &seeds, &execution)?;
        let flows: Vec<f64> = summaries.iter().filter_map(|s| s.mean_flow_time).collect();
        if !flows.is_empty() {
            info!(
                "Mean flow time over {} replications: {:.1}s",
                flows.len(),
                flows.iter().sum::<f64>() / flows.len() as f64
            );
        }
        return Ok(());
    }

    let snapshots = SharedSnapshot::new().with_interval(config.total_ticks().max(10) / 10);
    let mut engine = SimulationEngine::from_config(config)?.with_observer(snapshots.clone());
    let summary = engine.run()?;

    if let Some(snapshot) = snapshots.latest() {
        info!(
            "Last snapshot at t={:.1}s: {} live jobs, {} waiting at the entry",
            snapshot.time,
            snapshot.live_jobs.len(),
            snapshot.entry_queue.len()
        );
    }
    for line in summary.to_string().lines() {
        info!("{}", line);
    }
    Ok(())
}

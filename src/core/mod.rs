pub mod components;
pub mod errors;
pub mod event;
pub mod execution;
pub mod factory;
pub mod generator;
pub mod metrics;
pub mod policies;
pub mod routing;
pub mod snapshot;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

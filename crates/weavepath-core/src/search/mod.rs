mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod interrupt;
pub mod metrics;
pub mod path;
mod playout;
pub mod policy;
pub mod problem;
pub mod snapshot;

#[cfg(test)]
mod tests;

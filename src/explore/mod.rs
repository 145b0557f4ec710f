//! Exploration orchestration: configuration, observation ingestion and
//! the strictly sequential sampling loop.

pub mod agent;

pub use agent::{ExploreConfig, Explorer, IterationReport, Observation, RunTrace};

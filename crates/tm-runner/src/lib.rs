//! Testrun submission, watch and result aggregation
//!
//! A [`Run`] submits one Testrun and waits for the workflow engine to drive it
//! to a terminal phase. A [`RunList`] executes many runs concurrently and
//! answers aggregate questions about them afterwards. Failures are recorded
//! per run instead of aborting the batch.

pub mod client;
pub mod component_descriptor;
pub mod config;
pub mod error;
pub mod metadata;
pub mod parameters;
pub mod report;
pub mod run;
pub mod versions;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{KubeTestrunClient, TestrunClient};
pub use config::RunnerConfig;
pub use error::{RunError, RunErrors, WatchError};
pub use metadata::Metadata;
pub use run::{Run, RunList};
pub use watch::Watcher;

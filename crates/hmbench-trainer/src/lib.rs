//! # hmbench Trainer
//!
//! Sweep configuration, corpus preparation and the fine-tuning driver.
//! The neural model itself is supplied by a [`trainer::FineTuneBackend`].

pub mod config;
pub mod data;
pub mod sweep;
pub mod trainer;

pub use config::SweepConfig;
pub use data::{ColumnCorpus, CorpusPreparer, MultiCorpus, Sentence};
pub use sweep::{HubTarget, RunSpec};
pub use trainer::{FineTuneBackend, ManifestBackend, SweepRunner, run_training};

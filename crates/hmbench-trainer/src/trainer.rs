//! Sweep driver.
//!
//! Model construction and optimisation live behind [`FineTuneBackend`]; this
//! module prepares the corpora once and walks the hyperparameter grid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use hmbench_core::LabelDictionary;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SweepConfig;
use crate::data::{CorpusPreparer, CorpusStats, MultiCorpus, default_data_dir};
use crate::sweep::{HubTarget, RunSpec};

/// Manifest file written into every run directory.
pub const MANIFEST_FILE: &str = "run.json";

/// TensorBoard event directory inside a run directory.
pub const TENSORBOARD_DIR: &str = "runs";

/// Fine-tunes one grid point.
pub trait FineTuneBackend {
    fn fine_tune(
        &mut self,
        run: &RunSpec,
        corpus: &MultiCorpus,
        labels: &LabelDictionary,
        run_dir: &Path,
    ) -> anyhow::Result<()>;
}

/// Backend that records what would be trained instead of training it.
#[derive(Debug, Clone)]
pub struct ManifestBackend {
    organisation: Option<String>,
    config_stem: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    run: &'a RunSpec,
    corpora: Vec<CorpusStats>,
    labels: &'a LabelDictionary,
    hub: Option<HubTarget>,
}

impl ManifestBackend {
    pub fn new(config_stem: impl Into<String>) -> Self {
        Self {
            organisation: None,
            config_stem: config_stem.into(),
        }
    }

    /// Records the hub repository each run would be pushed to.
    pub fn with_organisation(mut self, organisation: impl Into<String>) -> Self {
        self.organisation = Some(organisation.into());
        self
    }
}

impl FineTuneBackend for ManifestBackend {
    fn fine_tune(
        &mut self,
        run: &RunSpec,
        corpus: &MultiCorpus,
        labels: &LabelDictionary,
        run_dir: &Path,
    ) -> anyhow::Result<()> {
        fs::create_dir_all(run_dir)
            .with_context(|| format!("Failed to create {}", run_dir.display()))?;

        if run.use_tensorboard_logger {
            let events = run_dir.join(TENSORBOARD_DIR);
            fs::create_dir_all(&events)
                .with_context(|| format!("Failed to create {}", events.display()))?;
        }

        let manifest = Manifest {
            run,
            corpora: corpus.stats(),
            labels,
            hub: self
                .organisation
                .as_deref()
                .map(|org| run.hub_target(org, &self.config_stem)),
        };

        let path = run_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Runs a whole sweep against one backend.
pub struct SweepRunner<B> {
    config: SweepConfig,
    preparer: CorpusPreparer,
    output_root: PathBuf,
    backend: B,
}

impl<B: FineTuneBackend> SweepRunner<B> {
    pub fn new(config: SweepConfig, preparer: CorpusPreparer, backend: B) -> Self {
        Self {
            config,
            preparer,
            output_root: PathBuf::from("."),
            backend,
        }
    }

    /// Directory the run directories are created under.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Prepares the corpora and calls the backend for every grid point.
    /// Returns the run directories in grid order.
    pub fn run(&mut self) -> anyhow::Result<Vec<PathBuf>> {
        let corpus = self
            .preparer
            .load_all(&self.config.hipe_datasets, self.config.label_name_map.as_ref())?;

        let labels = corpus.label_dictionary();
        if labels.is_empty() {
            warn!("no entity types found in the training splits");
        }
        info!(labels = ?labels.items(), "label dictionary built");

        let runs = self.config.runs();
        let total = runs.len();
        let mut finished = Vec::with_capacity(total);

        for (idx, run) in runs.iter().enumerate() {
            let run_dir = self.output_root.join(run.output_path());
            info!(
                run = idx + 1,
                total,
                seed = run.seed,
                batch_size = run.batch_size,
                epochs = run.epochs,
                learning_rate = run.learning_rate,
                pooling = %run.subword_pooling,
                device = %self.config.device(),
                "starting fine-tuning"
            );

            self.backend
                .fine_tune(run, &corpus, &labels, &run_dir)
                .with_context(|| format!("Run {} failed", run_dir.display()))?;
            finished.push(run_dir);
        }

        info!(runs = finished.len(), "sweep finished");
        Ok(finished)
    }
}

/// File stem used in hub repository names.
pub fn config_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Runs a sweep from a configuration file with the manifest backend.
pub fn run_training(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        anyhow::bail!("Sweep config not found: {}", config_path.display());
    }

    let config = SweepConfig::from_path(config_path)?;
    let data_dir = default_data_dir();
    let preparer = CorpusPreparer::new(&data_dir, data_dir.join("preprocessed"));
    let backend = ManifestBackend::new(config_stem(config_path));

    let mut runner = SweepRunner::new(config, preparer, backend);
    let runs = runner.run()?;
    info!(runs = runs.len(), "training finished");

    Ok(())
}

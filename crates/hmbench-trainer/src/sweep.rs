//! Hyperparameter grid expansion and run naming.

use std::path::PathBuf;

use hmbench_core::DatasetSpec;
use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;

/// Identifier used in run names when several corpora are trained jointly.
pub const MULTI_CORPUS_ID: &str = "mhmner";

/// Checkpoint excluded from hub uploads.
pub const FINAL_MODEL_FILE: &str = "final-model.pt";

/// One point of the hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub seed: u64,
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub subword_pooling: String,
    pub hf_model: String,
    pub context_size: Option<usize>,
    pub layers: String,
    pub use_crf: bool,
    pub use_tensorboard_logger: bool,
    pub datasets: Vec<DatasetSpec>,
}

impl SweepConfig {
    /// Expands the grid: seed, then batch size, epochs, learning rate and
    /// subword pooling, innermost last.
    pub fn runs(&self) -> Vec<RunSpec> {
        let mut runs = Vec::with_capacity(
            self.seeds.len()
                * self.batch_sizes.len()
                * self.epochs.len()
                * self.learning_rates.len()
                * self.subword_poolings.len(),
        );

        for &seed in &self.seeds {
            for &batch_size in &self.batch_sizes {
                for &epochs in &self.epochs {
                    for &learning_rate in &self.learning_rates {
                        for subword_pooling in &self.subword_poolings {
                            runs.push(RunSpec {
                                seed,
                                batch_size,
                                epochs,
                                learning_rate,
                                subword_pooling: subword_pooling.clone(),
                                hf_model: self.hf_model.clone(),
                                context_size: self.context_window(),
                                layers: self.layers.to_string(),
                                use_crf: self.use_crf,
                                use_tensorboard_logger: self.use_tensorboard_logger,
                                datasets: self.hipe_datasets.clone(),
                            });
                        }
                    }
                }
            }
        }

        runs
    }
}

impl RunSpec {
    /// The single dataset, or `mhmner` for a multi-corpus run.
    pub fn dataset_identifier(&self) -> String {
        match self.datasets.as_slice() {
            [single] => single.to_string(),
            _ => MULTI_CORPUS_ID.to_owned(),
        }
    }

    /// Hyperparameter part shared by output paths and repository names.
    fn hyperparameter_suffix(&self) -> String {
        let context = self
            .context_size
            .map_or_else(|| python_bool(false).to_owned(), |size| size.to_string());
        format!(
            "bs{}-ws{}-e{}-lr{}-pooling{}-layers{}-crf{}-{}",
            self.batch_size,
            context,
            self.epochs,
            python_float(self.learning_rate),
            self.subword_pooling,
            self.layers,
            python_bool(self.use_crf),
            self.seed
        )
    }

    /// Run directory, relative to the output root. Dataset and model names
    /// may contain `/`, which nests the directory.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!(
            "hmbench-{}-{}-{}",
            self.dataset_identifier(),
            self.hf_model,
            self.hyperparameter_suffix()
        ))
    }

    /// Hub repository name; `config_stem` is the configuration file name
    /// without extension (`configs/newseye/fr/hmbyt5.json` -> `hmbyt5`).
    pub fn repo_name(&self, config_stem: &str) -> String {
        let datasets = self
            .datasets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("-")
            .replace('/', "-");
        format!(
            "hmbench-{datasets}-{config_stem}-{}",
            self.hyperparameter_suffix()
        )
    }

    /// Where the run directory would be published.
    pub fn hub_target(&self, organisation: &str, config_stem: &str) -> HubTarget {
        HubTarget {
            repo_id: format!("{organisation}/{}", self.repo_name(config_stem)),
            folder_path: self.output_path(),
            path_in_repo: "./".to_owned(),
            repo_type: "model".to_owned(),
            ignore_patterns: vec![FINAL_MODEL_FILE.to_owned()],
            private: true,
        }
    }
}

/// Upload request for a finished run. Publishing itself is done by an
/// external hub client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubTarget {
    pub repo_id: String,
    pub folder_path: PathBuf,
    pub path_in_repo: String,
    pub repo_type: String,
    pub ignore_patterns: Vec<String>,
    pub private: bool,
}

pub fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Formats a float the way Python's `str(float)` does, which is how existing
/// run directories and hub repositories are named (`5e-05`, `0.0001`, `3.0`).
pub fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }

    let scientific = format!("{value:e}");
    if let Some((mantissa, exponent)) = scientific.split_once('e') {
        if let Ok(exponent) = exponent.parse::<i32>() {
            if !(-4..16).contains(&exponent) {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exponent.abs());
            }
        }
    }

    let positional = format!("{value}");
    if positional.contains('.') {
        positional
    } else {
        format!("{positional}.0")
    }
}

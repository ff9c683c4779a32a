//! Sweep configuration (JSON).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, ensure};
use hmbench_core::DatasetSpec;
use serde::{Deserialize, Serialize};

/// A value the configuration files write either as a string or an integer,
/// e.g. `"layers": "-1"` or `"cuda": 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    Text(String),
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrString::Int(value) => write!(f, "{value}"),
            IntOrString::Text(value) => f.write_str(value),
        }
    }
}

fn default_layers() -> IntOrString {
    IntOrString::Text("-1".to_owned())
}

/// Hyperparameter grid and corpus selection for one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub seeds: Vec<u64>,
    pub batch_sizes: Vec<usize>,
    pub epochs: Vec<usize>,
    pub learning_rates: Vec<f64>,
    pub subword_poolings: Vec<String>,
    /// Corpora trained on jointly; never iterated as a grid axis.
    pub hipe_datasets: Vec<DatasetSpec>,
    pub cuda: IntOrString,
    pub hf_model: String,
    /// FLERT context window; 0 disables document context.
    pub context_size: usize,
    #[serde(default = "default_layers")]
    pub layers: IntOrString,
    #[serde(default)]
    pub use_crf: bool,
    #[serde(default)]
    pub label_name_map: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub use_tensorboard_logger: bool,
}

impl SweepConfig {
    /// Reads and validates a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sweep config {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Invalid sweep config {}", path.display()))
    }

    /// Rejects configurations whose grid would be empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.seeds.is_empty(), "`seeds` must not be empty");
        ensure!(!self.batch_sizes.is_empty(), "`batch_sizes` must not be empty");
        ensure!(!self.epochs.is_empty(), "`epochs` must not be empty");
        ensure!(!self.learning_rates.is_empty(), "`learning_rates` must not be empty");
        ensure!(!self.subword_poolings.is_empty(), "`subword_poolings` must not be empty");
        ensure!(!self.hipe_datasets.is_empty(), "`hipe_datasets` must not be empty");
        ensure!(!self.hf_model.is_empty(), "`hf_model` must not be empty");
        Ok(())
    }

    /// Torch-style device string, e.g. `cuda:0`.
    pub fn device(&self) -> String {
        format!("cuda:{}", self.cuda)
    }

    /// Context window, `None` when disabled.
    pub fn context_window(&self) -> Option<usize> {
        (self.context_size > 0).then_some(self.context_size)
    }
}

impl FromStr for SweepConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: SweepConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmbench_core::DatasetId;

    const MINIMAL: &str = r#"{
        "seeds": [1, 2],
        "batch_sizes": [8, 4],
        "epochs": [10],
        "learning_rates": [3e-05, 5e-05],
        "subword_poolings": ["first"],
        "hipe_datasets": ["newseye/de"],
        "cuda": "0",
        "hf_model": "dbmdz/bert-base-historic-multilingual-cased",
        "context_size": 0
    }"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: SweepConfig = MINIMAL.parse().unwrap();
        assert_eq!(config.seeds, vec![1, 2]);
        assert_eq!(
            config.hipe_datasets,
            vec![DatasetSpec::new(DatasetId::NewsEye, "de")]
        );
        assert_eq!(config.layers.to_string(), "-1");
        assert!(!config.use_crf);
        assert!(config.label_name_map.is_none());
        assert!(!config.use_tensorboard_logger);
        assert_eq!(config.device(), "cuda:0");
        assert_eq!(config.context_window(), None);
    }

    #[test]
    fn accepts_integer_cuda_and_layers() {
        let raw = MINIMAL
            .replace("\"cuda\": \"0\"", "\"cuda\": 1, \"layers\": -1, \"use_crf\": true")
            .replace("\"context_size\": 0", "\"context_size\": 64");
        let config: SweepConfig = raw.parse().unwrap();
        assert_eq!(config.device(), "cuda:1");
        assert_eq!(config.layers, IntOrString::Int(-1));
        assert_eq!(config.layers.to_string(), "-1");
        assert!(config.use_crf);
        assert_eq!(config.context_window(), Some(64));
    }

    #[test]
    fn rejects_empty_grid_axis() {
        let raw = MINIMAL.replace("\"seeds\": [1, 2]", "\"seeds\": []");
        let err = raw.parse::<SweepConfig>().unwrap_err();
        assert!(err.to_string().contains("seeds"));
    }

    #[test]
    fn rejects_unknown_dataset() {
        let raw = MINIMAL.replace("newseye/de", "conll03/en");
        assert!(raw.parse::<SweepConfig>().is_err());
    }

    #[test]
    fn label_name_map_is_read() {
        let raw = MINIMAL.replace(
            "\"context_size\": 0",
            "\"context_size\": 0, \"label_name_map\": {\"pers\": \"PER\"}",
        );
        let config: SweepConfig = raw.parse().unwrap();
        let map = config.label_name_map.unwrap();
        assert_eq!(map.get("pers").map(String::as_str), Some("PER"));
    }
}

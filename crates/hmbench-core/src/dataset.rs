//! # Dataset Registry
//!
//! Identifiers for the historical NER benchmark corpora and the lookup table
//! that decides which [`Normalizer`] (if any) prepares a given
//! `<dataset>/<language>` pair.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HmbenchError, Result};
use crate::normalizer::Normalizer;

/// HIPE-2022 release whose split files are read by default.
pub const HIPE_2022_VERSION: &str = "v2.1";

/// Benchmark dataset families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetId {
    /// Ancient commentaries (HIPE-2022)
    Ajmc,
    /// CLEF-HIPE-2020 newspapers (HIPE-2022 bundle)
    Hipe2020,
    /// NewsEye newspapers (HIPE-2022 bundle)
    NewsEye,
    /// Le Temps newspapers (HIPE-2022 bundle)
    Letemps,
    /// SoNAR newspapers (HIPE-2022 bundle)
    Sonar,
    /// TopRes19th travel writing (HIPE-2022 bundle)
    Topres19th,
    /// ICDAR Europeana newspapers
    Icdar,
    /// HisGermaNER
    HisGermaNer,
}

impl DatasetId {
    pub fn all() -> &'static [DatasetId] {
        &[
            DatasetId::Ajmc,
            DatasetId::Hipe2020,
            DatasetId::NewsEye,
            DatasetId::Letemps,
            DatasetId::Sonar,
            DatasetId::Topres19th,
            DatasetId::Icdar,
            DatasetId::HisGermaNer,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::Ajmc => "ajmc",
            DatasetId::Hipe2020 => "hipe2020",
            DatasetId::NewsEye => "newseye",
            DatasetId::Letemps => "letemps",
            DatasetId::Sonar => "sonar",
            DatasetId::Topres19th => "topres19th",
            DatasetId::Icdar => "icdar",
            DatasetId::HisGermaNer => "hisgermaner",
        }
    }

    /// Which distribution the dataset is loaded from.
    pub fn source(&self) -> DatasetSource {
        match self {
            DatasetId::Icdar => DatasetSource::IcdarEuropeana,
            DatasetId::HisGermaNer => DatasetSource::HisGermaNer,
            _ => DatasetSource::Hipe2022,
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = HmbenchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ajmc" => Ok(DatasetId::Ajmc),
            "hipe2020" | "hipe-2020" | "clef2020" | "clef-2020" => Ok(DatasetId::Hipe2020),
            "newseye" => Ok(DatasetId::NewsEye),
            "letemps" => Ok(DatasetId::Letemps),
            "sonar" => Ok(DatasetId::Sonar),
            "topres19th" => Ok(DatasetId::Topres19th),
            "icdar" => Ok(DatasetId::Icdar),
            "hisgermaner" => Ok(DatasetId::HisGermaNer),
            _ => Err(HmbenchError::UnknownDataset(s.to_owned())),
        }
    }
}

/// Distribution a dataset ships in; decides the file layout and the column
/// conventions used when loading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetSource {
    Hipe2022,
    IcdarEuropeana,
    HisGermaNer,
}

/// Corpus split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub fn all() -> &'static [Split] {
        &[Split::Train, Split::Dev, Split::Test]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `<dataset>/<language>` pair as written in sweep configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetSpec {
    pub dataset: DatasetId,
    pub language: String,
}

impl DatasetSpec {
    pub fn new(dataset: DatasetId, language: impl Into<String>) -> Self {
        Self {
            dataset,
            language: language.into(),
        }
    }

    /// File name of one split, relative to the dataset's directory.
    pub fn split_file_name(&self, split: Split) -> String {
        match self.dataset.source() {
            DatasetSource::Hipe2022 => format!(
                "HIPE-2022-{HIPE_2022_VERSION}-{}-{}-{}.tsv",
                self.dataset, split, self.language
            ),
            DatasetSource::HisGermaNer => format!("HisGermaNER_v0_{split}.tsv"),
            DatasetSource::IcdarEuropeana => format!("{split}.txt"),
        }
    }

    /// Directory of the dataset under a data root, `<dataset>/<language>`.
    pub fn relative_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(self.dataset.as_str()).join(&self.language)
    }
}

impl fmt::Display for DatasetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.language)
    }
}

impl FromStr for DatasetSpec {
    type Err = HmbenchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (dataset, language) = s
            .split_once('/')
            .filter(|(d, l)| !d.is_empty() && !l.is_empty() && !l.contains('/'))
            .ok_or_else(|| HmbenchError::InvalidDatasetSpec(s.to_owned()))?;
        Ok(Self::new(dataset.parse()?, language))
    }
}

impl Serialize for DatasetSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DatasetSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lookup table from `(dataset, language)` to normalizer.
///
/// An entry with `language == None` matches every language of the dataset;
/// an exact-language entry takes precedence over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizerRegistry {
    table: BTreeMap<(DatasetId, Option<String>), Normalizer>,
}

impl NormalizerRegistry {
    /// A registry with no entries: nothing is preprocessed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The HIPE-2022 table.
    pub fn hipe2022() -> Self {
        Self::empty()
            .with_entry(DatasetId::Ajmc, None, Normalizer::Ajmc)
            .with_entry(DatasetId::Hipe2020, None, Normalizer::Clef2020)
            .with_entry(DatasetId::NewsEye, Some("fi"), Normalizer::NewsEyeFiSv)
            .with_entry(DatasetId::NewsEye, Some("sv"), Normalizer::NewsEyeFiSv)
            .with_entry(DatasetId::NewsEye, Some("de"), Normalizer::NewsEyeDeFr)
            .with_entry(DatasetId::NewsEye, Some("fr"), Normalizer::NewsEyeDeFr)
    }

    pub fn with_entry(
        mut self,
        dataset: DatasetId,
        language: Option<&str>,
        normalizer: Normalizer,
    ) -> Self {
        self.table
            .insert((dataset, language.map(str::to_owned)), normalizer);
        self
    }

    /// Normalizer for a dataset, `None` when it needs no preprocessing.
    pub fn lookup(&self, spec: &DatasetSpec) -> Option<Normalizer> {
        self.table
            .get(&(spec.dataset, Some(spec.language.clone())))
            .or_else(|| self.table.get(&(spec.dataset, None)))
            .copied()
    }

    /// Normalizer to run before loading: the registered repair, or the
    /// shared assembly alone for other HIPE-2022 datasets. `None` for
    /// corpora that are loaded as distributed.
    pub fn resolve(&self, spec: &DatasetSpec) -> Option<Normalizer> {
        self.lookup(spec).or_else(|| {
            (spec.dataset.source() == DatasetSource::Hipe2022).then_some(Normalizer::Hipe2022)
        })
    }

    /// Convenience wrapper parsing `<dataset>/<language>` first.
    pub fn lookup_str(&self, spec: &str) -> Result<Option<Normalizer>> {
        Ok(self.lookup(&spec.parse()?))
    }

    /// Table entries in dataset order; `None` language means "any".
    pub fn entries(&self) -> impl Iterator<Item = (DatasetId, Option<&str>, Normalizer)> + '_ {
        self.table
            .iter()
            .map(|((dataset, language), normalizer)| (*dataset, language.as_deref(), *normalizer))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

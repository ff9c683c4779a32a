//! Data loading for BIO-tagged column corpora.
//!
//! Raw split files are first passed through the dataset's normalizer (the
//! preprocessing hook) and the corrected file is then read into sentences.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use hmbench_core::labels::entities;
use hmbench_core::{
    BioTag, DatasetSource, DatasetSpec, LabelDictionary, NormalizationReport, NormalizeOptions,
    NormalizerRegistry, Split,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Suffix appended to the stem of a normalized split file.
pub const PREPROCESSED_SUFFIX: &str = "_preprocessed";

/// Default root for raw corpora, `<data dir>/hmbench/datasets`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hmbench")
        .join("datasets")
}

/// Column conventions of a corpus file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFormat {
    pub text_column: usize,
    pub ner_column: usize,
    /// Lines starting with this are ignored.
    pub comment_symbol: String,
    /// Lines starting with this open a new document.
    pub document_separator: String,
    pub skip_first_line: bool,
}

impl ColumnFormat {
    pub fn for_source(source: DatasetSource) -> Self {
        match source {
            DatasetSource::Hipe2022 => Self {
                text_column: 0,
                ner_column: 1,
                comment_symbol: "#".to_owned(),
                document_separator: "-DOCSTART-".to_owned(),
                skip_first_line: true,
            },
            DatasetSource::HisGermaNer => Self {
                text_column: 0,
                ner_column: 1,
                comment_symbol: "# ".to_owned(),
                document_separator: "-DOCSTART-".to_owned(),
                skip_first_line: true,
            },
            DatasetSource::IcdarEuropeana => Self {
                text_column: 0,
                ner_column: 1,
                comment_symbol: "#".to_owned(),
                document_separator: "-DOCSTART-".to_owned(),
                skip_first_line: false,
            },
        }
    }
}

/// One sentence: parallel tokens and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<String>,
    pub tags: Vec<BioTag>,
    /// 0-based index of the document the sentence belongs to.
    pub document: usize,
}

/// Load sentences from a column file.
pub fn load_column_file<P: AsRef<Path>>(
    path: P,
    format: &ColumnFormat,
    label_name_map: Option<&BTreeMap<String, String>>,
) -> anyhow::Result<Vec<Sentence>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut sentences = Vec::new();
    let mut current = Sentence {
        tokens: Vec::new(),
        tags: Vec::new(),
        document: 0,
    };
    let mut documents_seen = 0usize;
    let mut skipped = 0usize;
    let mut invalid_transitions = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if idx == 0 && format.skip_first_line {
            continue;
        }
        let line = line.trim_end();

        if line.is_empty() {
            flush(&mut sentences, &mut current, documents_seen);
            continue;
        }

        if line.starts_with(format.document_separator.as_str()) {
            flush(&mut sentences, &mut current, documents_seen);
            documents_seen += 1;
            continue;
        }

        if line.starts_with(format.comment_symbol.as_str()) {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        let (Some(token), Some(raw_tag)) =
            (parts.get(format.text_column), parts.get(format.ner_column))
        else {
            skipped += 1;
            continue;
        };

        let Some(mut tag) = BioTag::parse(raw_tag) else {
            skipped += 1;
            continue;
        };
        if let Some(map) = label_name_map {
            tag = tag.renamed(map);
        }

        if !BioTag::is_valid_transition(current.tags.last().unwrap_or(&BioTag::Outside), &tag) {
            invalid_transitions += 1;
        }

        current.tokens.push((*token).to_owned());
        current.tags.push(tag);
    }

    // Don't forget the last sentence
    flush(&mut sentences, &mut current, documents_seen);

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped lines without a usable NER tag");
    }
    if invalid_transitions > 0 {
        warn!(
            path = %path.display(),
            invalid_transitions,
            "I- tags not continuing an entity of the same type"
        );
    }
    debug!(path = %path.display(), sentences = sentences.len(), "loaded column file");

    Ok(sentences)
}

fn flush(sentences: &mut Vec<Sentence>, current: &mut Sentence, documents_seen: usize) {
    if current.tokens.is_empty() {
        return;
    }
    sentences.push(Sentence {
        tokens: std::mem::take(&mut current.tokens),
        tags: std::mem::take(&mut current.tags),
        document: documents_seen.saturating_sub(1),
    });
}

/// Train/dev/test sentences of one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCorpus {
    pub name: String,
    pub train: Vec<Sentence>,
    pub dev: Vec<Sentence>,
    pub test: Vec<Sentence>,
}

impl ColumnCorpus {
    pub fn split(&self, split: Split) -> &[Sentence] {
        match split {
            Split::Train => &self.train,
            Split::Dev => &self.dev,
            Split::Test => &self.test,
        }
    }

    fn split_mut(&mut self, split: Split) -> &mut Vec<Sentence> {
        match split {
            Split::Train => &mut self.train,
            Split::Dev => &mut self.dev,
            Split::Test => &mut self.test,
        }
    }
}

/// Several corpora trained jointly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiCorpus {
    pub corpora: Vec<ColumnCorpus>,
}

impl MultiCorpus {
    /// Entity types seen in the training splits.
    pub fn label_dictionary(&self) -> LabelDictionary {
        self.corpora
            .iter()
            .flat_map(|c| c.train.iter())
            .flat_map(|s| s.tags.iter())
            .collect()
    }

    pub fn stats(&self) -> Vec<CorpusStats> {
        self.corpora.iter().map(CorpusStats::of).collect()
    }
}

/// Per-split counts of one corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub sentences: usize,
    pub tokens: usize,
    pub entities: BTreeMap<String, usize>,
}

impl SplitStats {
    fn of(sentences: &[Sentence]) -> Self {
        let mut stats = SplitStats {
            sentences: sentences.len(),
            ..SplitStats::default()
        };
        for sentence in sentences {
            stats.tokens += sentence.tokens.len();
            for entity in entities(&sentence.tags) {
                *stats.entities.entry(entity.entity_type).or_default() += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub name: String,
    pub train: SplitStats,
    pub dev: SplitStats,
    pub test: SplitStats,
}

impl CorpusStats {
    fn of(corpus: &ColumnCorpus) -> Self {
        Self {
            name: corpus.name.clone(),
            train: SplitStats::of(corpus.split(Split::Train)),
            dev: SplitStats::of(corpus.split(Split::Dev)),
            test: SplitStats::of(corpus.split(Split::Test)),
        }
    }
}

/// A split file ready to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSplit {
    pub split: Split,
    pub path: PathBuf,
    /// `None` when the raw file is loaded as distributed (ICDAR, HisGermaNER).
    pub report: Option<NormalizationReport>,
}

/// Locates raw split files, runs the registered normalizer (or the shared
/// HIPE-2022 assembly) and loads the corrected files.
#[derive(Debug, Clone)]
pub struct CorpusPreparer {
    registry: NormalizerRegistry,
    options: NormalizeOptions,
    data_dir: PathBuf,
    work_dir: PathBuf,
}

impl CorpusPreparer {
    /// `data_dir` holds raw corpora as `<dataset>/<language>/<file>`;
    /// normalized files are written below `work_dir` with the same layout.
    pub fn new(data_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: NormalizerRegistry::hipe2022(),
            options: NormalizeOptions::default(),
            data_dir: data_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Options handed to every normalizer run.
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn raw_path(&self, spec: &DatasetSpec, split: Split) -> PathBuf {
        self.data_dir
            .join(spec.relative_dir())
            .join(spec.split_file_name(split))
    }

    /// Path of the normalized copy of a raw split file.
    pub fn preprocessed_path(&self, spec: &DatasetSpec, split: Split) -> PathBuf {
        let raw_name = spec.split_file_name(split);
        let stem = Path::new(&raw_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(raw_name.clone());
        self.work_dir
            .join(spec.relative_dir())
            .join(format!("{stem}{PREPROCESSED_SUFFIX}.tsv"))
    }

    /// Normalizes one split; `Ok(None)` when the raw file does not exist.
    pub fn prepare_split(
        &self,
        spec: &DatasetSpec,
        split: Split,
    ) -> anyhow::Result<Option<PreparedSplit>> {
        let raw = self.raw_path(spec, split);
        if !raw.is_file() {
            debug!(dataset = %spec, %split, path = %raw.display(), "split not found");
            return Ok(None);
        }

        let Some(normalizer) = self.registry.resolve(spec) else {
            return Ok(Some(PreparedSplit {
                split,
                path: raw,
                report: None,
            }));
        };

        let destination = self.preprocessed_path(spec, split);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let report = normalizer
            .normalize_file(&raw, &destination, &self.options)
            .with_context(|| format!("Failed to preprocess {spec} {split}"))?;

        Ok(Some(PreparedSplit {
            split,
            path: destination,
            report: Some(report),
        }))
    }

    /// Normalizes every split present on disk.
    pub fn prepare(&self, spec: &DatasetSpec) -> anyhow::Result<Vec<PreparedSplit>> {
        let mut prepared = Vec::new();
        for &split in Split::all() {
            if let Some(done) = self.prepare_split(spec, split)? {
                prepared.push(done);
            }
        }
        if prepared.is_empty() {
            anyhow::bail!(
                "No split files found for {spec} under {}",
                self.data_dir.join(spec.relative_dir()).display()
            );
        }
        Ok(prepared)
    }

    /// Prepares and loads one dataset.
    pub fn load(
        &self,
        spec: &DatasetSpec,
        label_name_map: Option<&BTreeMap<String, String>>,
    ) -> anyhow::Result<ColumnCorpus> {
        let format = ColumnFormat::for_source(spec.dataset.source());
        let mut corpus = ColumnCorpus {
            name: spec.to_string(),
            ..ColumnCorpus::default()
        };

        for prepared in self.prepare(spec)? {
            let sentences = load_column_file(&prepared.path, &format, label_name_map)?;
            *corpus.split_mut(prepared.split) = sentences;
        }

        info!(
            dataset = %spec,
            train = corpus.train.len(),
            dev = corpus.dev.len(),
            test = corpus.test.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    /// Loads several datasets into one multi-corpus.
    pub fn load_all(
        &self,
        specs: &[DatasetSpec],
        label_name_map: Option<&BTreeMap<String, String>>,
    ) -> anyhow::Result<MultiCorpus> {
        let corpora = specs
            .iter()
            .map(|spec| self.load(spec, label_name_map))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(MultiCorpus { corpora })
    }
}

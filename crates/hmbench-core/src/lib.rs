//! # hmbench Core
//!
//! Corpus preparation for historical named entity recognition benchmarks.
//! Provides the per-dataset normalizers that repair OCR and typesetting
//! artifacts in CoNLL-style column files, the dataset registry that selects
//! them, and the BIO label model used when the corrected files are loaded.
//!
//! ## Quick Start
//!
//! ```rust
//! use hmbench_core::{NormalizeOptions, Normalizer};
//!
//! let raw = "TOKEN\tNE\tMISC\nGesetſe\tO\t_\n";
//! let options = NormalizeOptions::default().with_metadata_column(2);
//! let normalized = Normalizer::Ajmc.normalize_text(raw, &options).unwrap();
//!
//! assert!(normalized.output.contains("Gesetse"));
//! ```
pub mod dataset;
pub mod error;
pub mod labels;
pub mod normalizer;

// Re-export primary API
pub use dataset::{DatasetId, DatasetSource, DatasetSpec, NormalizerRegistry, Split};
pub use error::{HmbenchError, Result};
pub use labels::{BioTag, LabelDictionary};
pub use normalizer::provenance::{MergeKind, MergeTag, ProvenanceParser};
pub use normalizer::{NormalizationReport, Normalized, NormalizeOptions, Normalizer};

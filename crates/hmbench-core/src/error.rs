use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while normalizing or resolving corpora.
#[derive(Debug, Error)]
pub enum HmbenchError {
    /// The source corpus has no lines at all, so there is no header to keep.
    #[error("corpus file is empty: {path}")]
    EmptyCorpus {
        /// The offending source file.
        path: PathBuf,
    },

    /// A line has fewer tab-separated fields than the column being edited.
    #[error("line {line} has {found} field(s), column {column} is required")]
    MissingColumn {
        /// 1-based line number in the normalized output.
        line: usize,
        /// 0-based column index that was accessed.
        column: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// Reading or writing a corpus file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dataset identifier that is not part of the registry.
    #[error("unknown dataset: {0:?}")]
    UnknownDataset(String),

    /// A `<dataset>/<language>` string that could not be split.
    #[error("invalid dataset spec {0:?}, expected <dataset>/<language>")]
    InvalidDatasetSpec(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
}

impl HmbenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HmbenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Moves a `MissingColumn` line number down by `offset` lines.
    pub(crate) fn shift_line(self, offset: usize) -> Self {
        match self {
            HmbenchError::MissingColumn {
                line,
                column,
                found,
            } => HmbenchError::MissingColumn {
                line: line + offset,
                column,
                found,
            },
            other => other,
        }
    }
}

/// Result type alias for hmbench operations.
pub type Result<T> = std::result::Result<T, HmbenchError>;

//! Merge provenance tags.
//!
//! A token that absorbed a fragment carries `Dehyphenated-<N>` (older
//! releases wrote `Normalized-<N>`) in its metadata column, where `N` is the
//! character length of the absorbed fragment. Stripping `N` characters from
//! the end of the merged token gives back the original split.

use regex::Regex;

use super::fields::{self, FIELD_SEPARATOR};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeKind {
    Dehyphenated,
    Normalized,
}

/// One provenance tag found in a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeTag {
    pub kind: MergeKind,
    /// Character length of the absorbed fragment.
    pub absorbed: usize,
}

/// Extracts provenance tags from metadata columns.
pub struct ProvenanceParser {
    re_tag: Regex,
}

impl ProvenanceParser {
    /// # Errors
    ///
    /// Returns `HmbenchError::RegexError` if the tag pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_tag: Regex::new(r"^(Dehyphenated|Normalized)-(\d+)$")?,
        })
    }

    /// All provenance tags in a `|`-separated metadata value, in order.
    pub fn tags(&self, metadata: &str) -> Vec<MergeTag> {
        metadata
            .split('|')
            .filter_map(|flag| {
                let caps = self.re_tag.captures(flag)?;
                let kind = match &caps[1] {
                    "Dehyphenated" => MergeKind::Dehyphenated,
                    _ => MergeKind::Normalized,
                };
                let absorbed = caps[2].parse().ok()?;
                Some(MergeTag { kind, absorbed })
            })
            .collect()
    }

    /// Recovers `(retained, absorbed)` for a merged line, using the most
    /// recent tag. `None` if the line carries no tag or the tag is longer
    /// than the token.
    pub fn original_split<'l>(
        &self,
        line: &'l str,
        metadata_column: usize,
    ) -> Option<(&'l str, &'l str)> {
        let metadata = line.split(FIELD_SEPARATOR).nth(metadata_column)?;
        let tag = self.tags(metadata).pop()?;
        split_merged(fields::token(line), tag.absorbed)
    }
}

/// Splits the trailing `absorbed` characters off a merged token.
pub fn split_merged(token: &str, absorbed: usize) -> Option<(&str, &str)> {
    let total = token.chars().count();
    if absorbed > total {
        return None;
    }
    let at = token
        .char_indices()
        .nth(total - absorbed)
        .map_or(token.len(), |(i, _)| i);
    Some(token.split_at(at))
}

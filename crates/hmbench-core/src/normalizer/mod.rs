//! # Corpus Normalizer
//!
//! File-to-file repair of raw token-annotation files. Every variant shares
//! the same assembly contract (header kept, empty-token workaround lines
//! dropped, trailing whitespace stripped, document boundaries and sentence
//! breaks inserted) and then runs its dataset-family repair pass.
//!
//! | Variant | Family | Repair |
//! |---------|--------|--------|
//! | [`Normalizer::Hipe2022`] | other HIPE-2022 | none |
//! | [`Normalizer::Ajmc`] | AJMC | long-s substitution, streamed |
//! | [`Normalizer::Clef2020`] | CLEF-2020 | `¬` marker-line de-hyphenation |
//! | [`Normalizer::NewsEyeFiSv`] | NewsEye fi/sv | `-` marker-line de-hyphenation gated by `NoSpaceAfter` |
//! | [`Normalizer::NewsEyeDeFr`] | NewsEye de/fr | trailing `¬` suffix merge |

pub mod continuation;
pub mod fields;
pub mod provenance;
pub mod substitution;
pub mod trailing;

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HmbenchError, Result};
use fields::Fields;

/// Default end-of-sentence marker carried in the HIPE-2022 metadata column.
pub const DEFAULT_EOS_MARKER: &str = "EndOfSentence";

/// Default comment line that opens a new document in HIPE-2022 files.
pub const DEFAULT_DOCUMENT_SEPARATOR: &str = "# hipe2022:document_id";

/// Token text of the synthetic document-boundary line.
pub const DEFAULT_BOUNDARY_TOKEN: &str = "-DOCSTART-";

/// Index of the MISC column in the HIPE-2022 layout.
pub const DEFAULT_METADATA_COLUMN: usize = 9;

/// Lines with no surface text start with a space followed by a tab.
const EMPTY_TOKEN_WORKAROUND: &str = " \t";

pub(crate) const COMMENT_MARKER: char = '#';

/// Options shared by all normalizer variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// A line containing this string ends a sentence. Empty disables breaks.
    pub eos_marker: String,
    /// Lines starting with this string open a new document.
    pub document_separator: String,
    /// Whether to insert the synthetic boundary line before each document.
    pub add_document_separator: bool,
    /// Token text of the synthetic boundary line.
    pub boundary_token: String,
    /// 0-based column that receives `Dehyphenated-<N>` tags.
    pub metadata_column: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            eos_marker: DEFAULT_EOS_MARKER.to_owned(),
            document_separator: DEFAULT_DOCUMENT_SEPARATOR.to_owned(),
            add_document_separator: true,
            boundary_token: DEFAULT_BOUNDARY_TOKEN.to_owned(),
            metadata_column: DEFAULT_METADATA_COLUMN,
        }
    }
}

impl NormalizeOptions {
    /// Create options with the HIPE-2022 defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eos_marker(mut self, marker: impl Into<String>) -> Self {
        self.eos_marker = marker.into();
        self
    }

    pub fn with_document_separator(mut self, separator: impl Into<String>) -> Self {
        self.document_separator = separator.into();
        self
    }

    /// Enable or disable synthetic document-boundary insertion.
    pub fn with_document_boundaries(mut self, enabled: bool) -> Self {
        self.add_document_separator = enabled;
        self
    }

    pub fn with_boundary_token(mut self, token: impl Into<String>) -> Self {
        self.boundary_token = token.into();
        self
    }

    pub fn with_metadata_column(mut self, column: usize) -> Self {
        self.metadata_column = column;
        self
    }

    /// The synthetic annotated line inserted before a new document.
    pub fn boundary_line(&self) -> String {
        format!("{} O", self.boundary_token)
    }

    fn starts_document(&self, line: &str) -> bool {
        self.add_document_separator
            && !self.document_separator.is_empty()
            && line.starts_with(self.document_separator.as_str())
    }

    fn ends_sentence(&self, line: &str) -> bool {
        !self.eos_marker.is_empty() && line.contains(self.eos_marker.as_str())
    }
}

/// Counters collected while normalizing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Lines read from the source, header included.
    pub input_lines: usize,
    /// Lines written, header and synthetic lines included.
    pub output_lines: usize,
    /// Empty-token workaround lines that were discarded.
    pub dropped_empty_tokens: usize,
    pub boundaries_inserted: usize,
    pub sentence_breaks: usize,
    /// Hyphenation groups merged into one token.
    pub merges: usize,
    /// Lines commented out by a merge.
    pub commented_lines: usize,
    /// Stray marker lines commented out after the merge pass.
    pub cleanup_commented: usize,
    /// `_|Commented` metadata collapsed to `Commented`.
    pub placeholders_collapsed: usize,
    /// Archaic characters replaced.
    pub substitutions: usize,
}

/// The corrected corpus text together with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub output: String,
    pub report: NormalizationReport,
}

/// Dataset-family repair strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Normalizer {
    /// Shared assembly only, for HIPE-2022 datasets without artifact repair.
    Hipe2022,
    /// Long-s substitution (AJMC).
    Ajmc,
    /// Marker-line de-hyphenation (CLEF-2020 / HIPE-2020).
    Clef2020,
    /// Marker-line de-hyphenation with `NoSpaceAfter` gate (NewsEye fi/sv).
    NewsEyeFiSv,
    /// Trailing-hyphen suffix merge (NewsEye de/fr).
    NewsEyeDeFr,
}

impl Normalizer {
    /// All variants in declaration order.
    pub fn all() -> &'static [Normalizer] {
        &[
            Normalizer::Hipe2022,
            Normalizer::Ajmc,
            Normalizer::Clef2020,
            Normalizer::NewsEyeFiSv,
            Normalizer::NewsEyeDeFr,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Normalizer::Hipe2022 => "hipe-2022",
            Normalizer::Ajmc => "ajmc",
            Normalizer::Clef2020 => "clef-2020",
            Normalizer::NewsEyeFiSv => "newseye-fi-sv",
            Normalizer::NewsEyeDeFr => "newseye-de-fr",
        }
    }

    /// Normalizes corpus text held in memory.
    ///
    /// # Errors
    ///
    /// Returns `HmbenchError::EmptyCorpus` for empty input and
    /// `HmbenchError::MissingColumn` when a merge touches a line without
    /// the metadata column.
    pub fn normalize_text(&self, text: &str, options: &NormalizeOptions) -> Result<Normalized> {
        let (header, body) = Header::split(text).ok_or_else(|| HmbenchError::EmptyCorpus {
            path: PathBuf::from("<memory>"),
        })?;

        let mut report = NormalizationReport {
            input_lines: 1,
            ..NormalizationReport::default()
        };

        let header_lines = header.line_count();
        let output = match self {
            Normalizer::Hipe2022 => render(&header, &collect_body(body, options, &mut report)),
            Normalizer::Ajmc => substitution::normalize(&header, body, options, &mut report),
            Normalizer::Clef2020 => {
                let mut lines = collect_body(body, options, &mut report);
                continuation::CLEF_2020
                    .apply(&mut lines, options.metadata_column, &mut report)
                    .map_err(|e| e.shift_line(header_lines))?;
                render(&header, &lines)
            }
            Normalizer::NewsEyeFiSv => {
                let mut lines = collect_body(body, options, &mut report);
                continuation::NEWSEYE_FI_SV.apply(
                    &mut lines,
                    options.metadata_column,
                    &mut report,
                )
                .map_err(|e| e.shift_line(header_lines))?;
                render(&header, &lines)
            }
            Normalizer::NewsEyeDeFr => {
                let mut lines = collect_body(body, options, &mut report);
                trailing::NEWSEYE_DE_FR
                    .apply(&mut lines, options.metadata_column, &mut report)
                    .map_err(|e| e.shift_line(header_lines))?;
                render(&header, &lines)
            }
        };

        report.output_lines = output.bytes().filter(|&b| b == b'\n').count();
        Ok(Normalized { output, report })
    }

    /// Reads `source`, normalizes it and writes the result to `destination`.
    ///
    /// The source is read completely before anything is written.
    pub fn normalize_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &NormalizeOptions,
    ) -> Result<NormalizationReport> {
        let text = fs::read_to_string(source).map_err(|e| HmbenchError::io(source, e))?;
        if text.is_empty() {
            return Err(HmbenchError::EmptyCorpus {
                path: source.to_path_buf(),
            });
        }

        let Normalized { output, report } = self.normalize_text(&text, options)?;
        fs::write(destination, output).map_err(|e| HmbenchError::io(destination, e))?;

        info!(
            normalizer = self.name(),
            source = %source.display(),
            destination = %destination.display(),
            input_lines = report.input_lines,
            output_lines = report.output_lines,
            merges = report.merges,
            boundaries = report.boundaries_inserted,
            substitutions = report.substitutions,
            "special preprocessing finished"
        );

        Ok(report)
    }
}

impl fmt::Display for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The first line of a corpus file, kept verbatim.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header<'t> {
    pub text: &'t str,
    /// Whether the source terminated the header with a line break. Such
    /// headers are followed by a blank line in the output.
    pub terminated: bool,
}

impl<'t> Header<'t> {
    /// Splits off the header; `None` for an empty file.
    pub fn split(text: &'t str) -> Option<(Self, &'t str)> {
        if text.is_empty() {
            return None;
        }
        let header = match text.split_once('\n') {
            Some((head, rest)) => (
                Header {
                    text: head.strip_suffix('\r').unwrap_or(head),
                    terminated: true,
                },
                rest,
            ),
            None => (
                Header {
                    text,
                    terminated: false,
                },
                "",
            ),
        };
        Some(header)
    }

    /// Output lines taken by the header, including its trailing blank.
    pub fn line_count(&self) -> usize {
        if self.terminated { 2 } else { 1 }
    }

    pub fn write_to(&self, out: &mut String) {
        out.push_str(self.text);
        out.push('\n');
        if self.terminated {
            out.push('\n');
        }
    }
}

/// Runs the shared assembly steps over the body of a corpus file, handing
/// each resulting line to `emit` in output order.
pub(crate) fn assemble<R, E>(
    body: &str,
    options: &NormalizeOptions,
    report: &mut NormalizationReport,
    mut rewrite: R,
    mut emit: E,
) where
    R: FnMut(&str) -> Cow<'_, str>,
    E: FnMut(String),
{
    for raw in body.lines() {
        report.input_lines += 1;

        if raw.starts_with(EMPTY_TOKEN_WORKAROUND) {
            report.dropped_empty_tokens += 1;
            continue;
        }

        let line = rewrite(raw.trim_end());

        if options.starts_document(&line) {
            emit(options.boundary_line());
            emit(String::new());
            report.boundaries_inserted += 1;
        }

        let ends_sentence = options.ends_sentence(&line);
        emit(line.into_owned());

        if ends_sentence {
            emit(String::new());
            report.sentence_breaks += 1;
        }
    }
}

fn collect_body(
    body: &str,
    options: &NormalizeOptions,
    report: &mut NormalizationReport,
) -> Vec<String> {
    let mut lines = Vec::new();
    assemble(body, options, report, |line| Cow::Borrowed(line), |line| lines.push(line));
    lines
}

fn render(header: &Header<'_>, lines: &[String]) -> String {
    let capacity = header.text.len() + 2 + lines.iter().map(|l| l.len() + 1).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    header.write_to(&mut out);
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// 1-based line number of an assembled body line. Callers add the header's
/// lines to turn it into an output line number.
pub(crate) const fn line_no(index: usize) -> usize {
    index + 1
}

/// Collapses `_|Commented` down to `Commented` on every comment line.
pub(crate) fn collapse_placeholders(lines: &mut [String], report: &mut NormalizationReport) {
    for (index, line) in lines.iter_mut().enumerate() {
        if line.is_empty() || !line.starts_with(COMMENT_MARKER) {
            continue;
        }
        let mut fields = Fields::parse(line, line_no(index));
        if fields.collapse_commented_placeholder() {
            *line = fields.join();
            report.placeholders_collapsed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hipe_line(token: &str, ner: &str, misc: &str) -> String {
        format!("{token}\t{ner}\tO\tO\tO\tO\tO\t_\t_\t{misc}")
    }

    const HEADER: &str = "TOKEN\tNE-COARSE-LIT\tNE-COARSE-METO\tNE-FINE-LIT\tNE-FINE-METO\tNE-FINE-COMP\tNE-NESTED\tNEL-LIT\tNEL-METO\tMISC";

    #[test]
    fn empty_input_is_fatal() {
        for normalizer in Normalizer::all() {
            let err = normalizer
                .normalize_text("", &NormalizeOptions::default())
                .unwrap_err();
            assert!(matches!(err, HmbenchError::EmptyCorpus { .. }));
        }
    }

    #[test]
    fn header_is_preserved_and_followed_by_blank_line() {
        let raw = format!("{HEADER}\n{}\n", hipe_line("Paris", "B-loc", "_"));
        for normalizer in Normalizer::all() {
            let out = normalizer
                .normalize_text(&raw, &NormalizeOptions::default())
                .unwrap()
                .output;
            let mut lines = out.lines();
            assert_eq!(lines.next(), Some(HEADER));
            assert_eq!(lines.next(), Some(""));
            assert!(out.ends_with('\n'));
        }
    }

    #[test]
    fn header_without_line_break_gets_one() {
        let out = Normalizer::Clef2020
            .normalize_text(HEADER, &NormalizeOptions::default())
            .unwrap();
        assert_eq!(out.output, format!("{HEADER}\n"));
        assert_eq!(out.report.output_lines, 1);
    }

    #[test]
    fn empty_token_workaround_lines_are_dropped() {
        let raw = format!(
            "{HEADER}\n \tO\tO\n{}\n",
            hipe_line("Paris", "B-loc", "_")
        );
        let out = Normalizer::NewsEyeDeFr
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();
        assert_eq!(out.report.dropped_empty_tokens, 1);
        assert!(!out.output.contains(" \tO"));
    }

    #[test]
    fn trailing_whitespace_is_stripped() {
        let raw = format!("{HEADER}\n{}  \r\n", hipe_line("Paris", "B-loc", "_"));
        let out = Normalizer::Clef2020
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();
        assert!(out.output.contains(&format!("{}\n", hipe_line("Paris", "B-loc", "_"))));
        assert!(!out.output.contains("  "));
    }

    #[test]
    fn document_boundary_inserted_only_when_enabled() {
        let raw = format!(
            "{HEADER}\n# hipe2022:document_id = doc-1\n{}\n",
            hipe_line("Paris", "B-loc", "_")
        );

        let enabled = Normalizer::Clef2020
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();
        let lines: Vec<&str> = enabled.output.lines().collect();
        assert_eq!(lines[2], "-DOCSTART- O");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "# hipe2022:document_id = doc-1");
        assert_eq!(enabled.report.boundaries_inserted, 1);

        let disabled = Normalizer::Clef2020
            .normalize_text(&raw, &NormalizeOptions::default().with_document_boundaries(false))
            .unwrap();
        assert!(!disabled.output.contains("-DOCSTART-"));
        assert_eq!(disabled.report.boundaries_inserted, 0);
    }

    #[test]
    fn eos_marker_is_followed_by_exactly_one_blank_line() {
        let raw = format!(
            "{HEADER}\n{}\n{}\n{}\n",
            hipe_line("Es", "O", "_"),
            hipe_line(".", "O", "EndOfSentence"),
            hipe_line("Dann", "O", "_"),
        );
        for normalizer in Normalizer::all() {
            let out = normalizer
                .normalize_text(&raw, &NormalizeOptions::default())
                .unwrap();
            let lines: Vec<&str> = out.output.lines().collect();
            let eos = lines
                .iter()
                .position(|l| l.contains("EndOfSentence"))
                .unwrap();
            assert_eq!(lines[eos + 1], "");
            assert_ne!(lines[eos + 2], "");
            assert_eq!(out.report.sentence_breaks, 1);
        }
    }

    #[test]
    fn output_never_shorter_than_retained_input() {
        let raw = format!(
            "{HEADER}\n# hipe2022:document_id = d\n{}\n¬\t_\t_\t_\t_\t_\t_\t_\t_\t_\n{}\n",
            hipe_line("Po", "B-loc", "_"),
            hipe_line("len", "I-loc", "EndOfSentence"),
        );
        for normalizer in Normalizer::all() {
            let out = normalizer
                .normalize_text(&raw, &NormalizeOptions::default())
                .unwrap();
            let retained = out.report.input_lines - out.report.dropped_empty_tokens;
            assert!(out.report.output_lines >= retained);
        }
    }

    #[test]
    fn normalize_file_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw.tsv");
        let destination = dir.path().join("out.tsv");
        fs::write(
            &source,
            format!("{HEADER}\n{}\n", hipe_line("Gesetſe", "O", "_")),
        )
        .unwrap();

        let report = Normalizer::Ajmc
            .normalize_file(&source, &destination, &NormalizeOptions::default())
            .unwrap();

        let written = fs::read_to_string(&destination).unwrap();
        assert!(written.contains("Gesetse"));
        assert_eq!(report.substitutions, 1);
    }

    #[test]
    fn normalize_file_rejects_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.tsv");
        fs::write(&source, "").unwrap();

        let err = Normalizer::Clef2020
            .normalize_file(&source, &dir.path().join("out.tsv"), &NormalizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, HmbenchError::EmptyCorpus { path } if path == source));
    }

    #[test]
    fn hipe2022_base_only_assembles() {
        let raw = format!(
            "{HEADER}\n# hipe2022:document_id = a\n{}\n{}\n \t_\n# hipe2022:document_id = b\n{}\n",
            hipe_line("Ver¬", "B-loc", "_"),
            hipe_line("Geſetz", "O", "EndOfSentence"),
            hipe_line("Paris", "B-loc", "EndOfSentence"),
        );
        let out = Normalizer::Hipe2022
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();

        let expected = [
            HEADER.to_owned(),
            String::new(),
            "-DOCSTART- O".to_owned(),
            String::new(),
            "# hipe2022:document_id = a".to_owned(),
            hipe_line("Ver¬", "B-loc", "_"),
            hipe_line("Geſetz", "O", "EndOfSentence"),
            String::new(),
            "-DOCSTART- O".to_owned(),
            String::new(),
            "# hipe2022:document_id = b".to_owned(),
            hipe_line("Paris", "B-loc", "EndOfSentence"),
            String::new(),
        ]
        .join("\n")
            + "\n";
        assert_eq!(out.output, expected);
        assert_eq!(out.report.merges, 0);
        assert_eq!(out.report.substitutions, 0);
        assert_eq!(out.report.dropped_empty_tokens, 1);
        assert_eq!(out.report.boundaries_inserted, 2);
    }
}

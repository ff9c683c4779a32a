//! Marker-line de-hyphenation (CLEF-2020, NewsEye fi/sv).
//!
//! A word broken across a line is stored as three annotated lines: the head
//! fragment, a line whose token is the continuation marker, and the tail
//! fragment. The tail is appended to the head and both the marker line and
//! the tail line are kept as comments:
//!
//! ```text
//! Po   ...  _                    Polen ...  _|Dehyphenated-3
//! ¬    ...  _            ==>     #¬    ...  Commented
//! len  ...  _                    #len  ...  Commented
//! ```

use tracing::debug;

use super::fields::{self, Fields, NO_SPACE_AFTER};
use super::{COMMENT_MARKER, NormalizationReport, collapse_placeholders, line_no};
use crate::error::Result;

/// Pattern parameters of one marker-line family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationRule {
    /// Prefix identifying a continuation-marker line.
    pub marker: &'static str,
    /// Prefix put in front of the token of a line that is commented out.
    pub comment_prefix: &'static str,
    /// Only merge when the marker line carries `NoSpaceAfter` and the head
    /// line is not blank.
    pub requires_no_space_after: bool,
}

/// CLEF-2020 uses a bare `¬` token and a one-character comment prefix.
pub const CLEF_2020: ContinuationRule = ContinuationRule {
    marker: "¬",
    comment_prefix: "#",
    requires_no_space_after: false,
};

/// NewsEye fi/sv uses `-` followed by a tab, so `-DOCSTART-` never matches.
pub const NEWSEYE_FI_SV: ContinuationRule = ContinuationRule {
    marker: "-\t",
    comment_prefix: "# ",
    requires_no_space_after: true,
};

impl ContinuationRule {
    /// Runs the merge pass, the stray-marker cleanup and the placeholder
    /// collapse over the assembled body.
    pub fn apply(
        &self,
        lines: &mut [String],
        metadata_column: usize,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        self.merge(lines, metadata_column, report)?;
        self.comment_stray_markers(lines, report);
        collapse_placeholders(lines, report);
        Ok(())
    }

    fn is_marker_line(&self, line: &str) -> bool {
        line.starts_with(self.marker)
    }

    fn merge(
        &self,
        lines: &mut [String],
        metadata_column: usize,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        for index in 0..lines.len() {
            let line = &lines[index];
            if line.is_empty() || line.starts_with(COMMENT_MARKER) || self.is_marker_line(line) {
                continue;
            }

            // Both lookbacks must stay inside the body; the header is never a head.
            if index < 2 {
                continue;
            }

            let marker_line = &lines[index - 1];
            if !self.is_marker_line(marker_line) {
                continue;
            }

            if self.requires_no_space_after
                && (!marker_line.contains(NO_SPACE_AFTER) || lines[index - 2].is_empty())
            {
                continue;
            }

            let suffix = fields::token(line).to_owned();
            let absorbed = suffix.chars().count();

            let mut head = Fields::parse(&lines[index - 2], line_no(index - 2));
            head.push_token_suffix(&suffix);
            head.mark_dehyphenated(metadata_column, absorbed)?;

            let mut marker = Fields::parse(marker_line, line_no(index - 1));
            marker.comment_out(self.comment_prefix);

            let mut tail = Fields::parse(line, line_no(index));
            tail.comment_out(self.comment_prefix);

            debug!(
                line = line_no(index),
                merged = head.token(),
                absorbed,
                "dehyphenated marker-line group"
            );

            lines[index - 2] = head.join();
            lines[index - 1] = marker.join();
            lines[index] = tail.join();

            report.merges += 1;
            report.commented_lines += 2;
        }
        Ok(())
    }

    /// Comments out marker lines the merge pass did not consume, e.g. markers
    /// next to a blank line or a comment.
    fn comment_stray_markers(&self, lines: &mut [String], report: &mut NormalizationReport) {
        for (index, line) in lines.iter_mut().enumerate() {
            if line.is_empty() || !self.is_marker_line(line) {
                continue;
            }
            let mut fields = Fields::parse(line, line_no(index));
            fields.comment_out(self.comment_prefix);
            *line = fields.join();
            report.cleanup_commented += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmbenchError;
    use crate::normalizer::{NormalizeOptions, Normalizer};

    const HEADER: &str = "TOKEN\tNE-COARSE-LIT\tNE-COARSE-METO\tNE-FINE-LIT\tNE-FINE-METO\tNE-FINE-COMP\tNE-NESTED\tNEL-LIT\tNEL-METO\tMISC";

    fn row(token: &str, ner: &str, misc: &str) -> String {
        format!("{token}\t{ner}\tO\tO\tO\tO\tO\t_\t_\t{misc}")
    }

    fn body(lines: &[String]) -> Vec<String> {
        lines.to_vec()
    }

    #[test]
    fn clef_merges_marker_line_group() {
        let mut lines = body(&[
            row("in", "O", "_"),
            row("Po", "B-loc", "_"),
            row("¬", "I-loc", "_"),
            row("len", "I-loc", "_"),
            row("war", "O", "_"),
        ]);
        let mut report = NormalizationReport::default();
        CLEF_2020.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(lines[1], row("Polen", "B-loc", "_|Dehyphenated-3"));
        assert_eq!(lines[2], row("#¬", "I-loc", "Commented"));
        assert_eq!(lines[3], row("#len", "I-loc", "Commented"));
        assert_eq!(lines[4], row("war", "O", "_"));
        assert_eq!(report.merges, 1);
        assert_eq!(report.commented_lines, 2 * report.merges);
        assert_eq!(report.placeholders_collapsed, 2);
    }

    #[test]
    fn clef_keeps_non_placeholder_metadata_when_commenting() {
        let mut lines = body(&[
            row("x", "O", "_"),
            row("Po", "B-loc", "NoSpaceAfter"),
            row("¬", "I-loc", "NoSpaceAfter"),
            row("len", "I-loc", "EndOfLine"),
        ]);
        let mut report = NormalizationReport::default();
        CLEF_2020.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(
            lines[1],
            row("Polen", "B-loc", "NoSpaceAfter|Dehyphenated-3")
        );
        assert_eq!(lines[2], row("#¬", "I-loc", "NoSpaceAfter|Commented"));
        assert_eq!(lines[3], row("#len", "I-loc", "EndOfLine|Commented"));
    }

    #[test]
    fn clef_comments_stray_marker_after_blank_line() {
        let mut lines = body(&[
            row("x", "O", "EndOfSentence"),
            String::new(),
            row("¬", "O", "_"),
        ]);
        let mut report = NormalizationReport::default();
        CLEF_2020.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(lines[2], row("#¬", "O", "Commented"));
        assert_eq!(report.merges, 0);
        assert_eq!(report.cleanup_commented, 1);
    }

    #[test]
    fn clef_never_merges_into_first_lines() {
        let mut lines = body(&[row("¬", "O", "_"), row("len", "O", "_")]);
        let mut report = NormalizationReport::default();
        CLEF_2020.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(report.merges, 0);
        assert_eq!(lines[1], row("len", "O", "_"));
        assert_eq!(lines[0], row("#¬", "O", "Commented"));
    }

    #[test]
    fn clef_head_without_metadata_column_is_fatal() {
        let raw = format!("{HEADER}\nx\tO\nPo\tB-loc\n¬\tO\nlen\tO\n");
        let err = Normalizer::Clef2020
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            HmbenchError::MissingColumn {
                line: 4,
                column: 9,
                found: 2
            }
        ));
    }

    #[test]
    fn missing_column_line_counts_inserted_lines() {
        let raw = format!(
            "{HEADER}\n# hipe2022:document_id = d\nx\tO\nPo\tB-loc\n¬\tO\nlen\tO\n"
        );
        let out = Normalizer::Clef2020.normalize_text(&raw, &NormalizeOptions::default());
        // header, blank, -DOCSTART- O, blank, document comment, x, Po
        assert!(matches!(
            out.unwrap_err(),
            HmbenchError::MissingColumn { line: 7, .. }
        ));
    }

    #[test]
    fn clef_suffix_length_counts_characters() {
        let mut lines = body(&[
            row("x", "O", "_"),
            row("Stra", "B-loc", "_"),
            row("¬", "I-loc", "_"),
            row("ße", "I-loc", "_"),
        ]);
        let mut report = NormalizationReport::default();
        CLEF_2020.apply(&mut lines, 9, &mut report).unwrap();
        assert_eq!(lines[1], row("Straße", "B-loc", "_|Dehyphenated-2"));
    }

    #[test]
    fn newseye_requires_no_space_after_on_marker_line() {
        let mut lines = body(&[
            row("x", "O", "_"),
            row("Hel", "B-loc", "NoSpaceAfter"),
            row("-", "I-loc", "NoSpaceAfter"),
            row("sinki", "I-loc", "_"),
        ]);
        let mut report = NormalizationReport::default();
        NEWSEYE_FI_SV.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(
            lines[1],
            row("Helsinki", "B-loc", "NoSpaceAfter|Dehyphenated-5")
        );
        assert_eq!(lines[2], row("# -", "I-loc", "NoSpaceAfter|Commented"));
        assert_eq!(lines[3], row("# sinki", "I-loc", "Commented"));
        assert_eq!(report.merges, 1);
    }

    #[test]
    fn newseye_dash_without_no_space_after_is_not_a_break() {
        let mut lines = body(&[
            row("x", "O", "_"),
            row("Turku", "B-loc", "_"),
            row("-", "O", "_"),
            row("Helsinki", "B-loc", "_"),
        ]);
        let mut report = NormalizationReport::default();
        NEWSEYE_FI_SV.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(report.merges, 0);
        assert_eq!(lines[1], row("Turku", "B-loc", "_"));
        assert_eq!(lines[3], row("Helsinki", "B-loc", "_"));
        // the unconsumed marker line is still commented by the cleanup pass
        assert_eq!(lines[2], row("# -", "O", "Commented"));
    }

    #[test]
    fn newseye_skips_blank_head() {
        let mut lines = body(&[
            row("x", "O", "EndOfSentence"),
            String::new(),
            row("-", "O", "NoSpaceAfter"),
            row("sinki", "O", "_"),
        ]);
        let mut report = NormalizationReport::default();
        NEWSEYE_FI_SV.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(report.merges, 0);
        assert_eq!(lines[1], "");
        assert_eq!(lines[3], row("sinki", "O", "_"));
    }

    #[test]
    fn newseye_marker_does_not_match_docstart() {
        let raw = format!(
            "{HEADER}\n# hipe2022:document_id = d\n{}\n",
            row("Helsinki", "B-loc", "_")
        );
        let out = Normalizer::NewsEyeFiSv
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();
        assert!(out.output.contains("\n-DOCSTART- O\n"));
        assert_eq!(out.report.cleanup_commented, 0);
    }
}

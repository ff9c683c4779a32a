//! Trailing-hyphen suffix merge (NewsEye de/fr).
//!
//! Here the hyphen is glued to the head fragment itself (`Ver¬`), so only two
//! lines take part in a merge: the head swallows the following token and the
//! following line is commented out.

use tracing::debug;

use super::fields::{self, Fields};
use super::{COMMENT_MARKER, NormalizationReport, collapse_placeholders, line_no};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingRule {
    /// Character ending a head fragment.
    pub marker: char,
    pub comment_prefix: &'static str,
}

pub const NEWSEYE_DE_FR: TrailingRule = TrailingRule {
    marker: '¬',
    comment_prefix: "#",
};

impl TrailingRule {
    pub fn apply(
        &self,
        lines: &mut [String],
        metadata_column: usize,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        self.merge(lines, metadata_column, report)?;
        collapse_placeholders(lines, report);
        Ok(())
    }

    fn merge(
        &self,
        lines: &mut [String],
        metadata_column: usize,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        // Index 0 has no body line in front of it; the header is never a head.
        for index in 1..lines.len() {
            let line = &lines[index];
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            let head_line = &lines[index - 1];
            let head_token = fields::token(head_line);
            if !head_token.ends_with(self.marker) {
                continue;
            }

            let retained: String = head_token.chars().filter(|&c| c != self.marker).collect();
            let suffix = fields::token(line);
            let absorbed = suffix.chars().count();

            let mut head = Fields::parse(head_line, line_no(index - 1));
            head.set_token(retained + suffix);
            head.mark_dehyphenated(metadata_column, absorbed)?;

            let mut tail = Fields::parse(line, line_no(index));
            tail.comment_out(self.comment_prefix);

            debug!(
                line = line_no(index),
                merged = head.token(),
                absorbed,
                "dehyphenated trailing-hyphen pair"
            );

            lines[index - 1] = head.join();
            lines[index] = tail.join();

            report.merges += 1;
            report.commented_lines += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{NormalizeOptions, Normalizer};

    fn row(token: &str, ner: &str, misc: &str) -> String {
        format!("{token}\t{ner}\tO\tO\tO\tO\tO\t_\t_\t{misc}")
    }

    #[test]
    fn merges_trailing_hyphen_into_head() {
        let mut lines = vec![
            row("den", "O", "SpaceAfter"),
            row("Ver¬", "B-LOC", "n"),
            row("einigten", "B-LOC", "n|SpaceAfter"),
            row("Staaten", "I-LOC", "n"),
        ];
        let mut report = NormalizationReport::default();
        NEWSEYE_DE_FR.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(lines[1], row("Vereinigten", "B-LOC", "n|Dehyphenated-8"));
        assert_eq!(lines[2], row("#einigten", "B-LOC", "n|SpaceAfter|Commented"));
        assert_eq!(lines[3], row("Staaten", "I-LOC", "n"));
        assert_eq!(report.merges, 1);
        assert_eq!(report.commented_lines, report.merges);
    }

    #[test]
    fn placeholder_metadata_collapses_on_commented_tail() {
        let mut lines = vec![
            row("x", "O", "_"),
            row("Pa¬", "B-LOC", "_"),
            row("ris", "B-LOC", "_"),
        ];
        let mut report = NormalizationReport::default();
        NEWSEYE_DE_FR.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(lines[1], row("Paris", "B-LOC", "_|Dehyphenated-3"));
        assert_eq!(lines[2], row("#ris", "B-LOC", "Commented"));
        assert_eq!(report.placeholders_collapsed, 1);
    }

    #[test]
    fn blank_and_comment_lines_are_not_tails() {
        let mut lines = vec![
            row("Ver¬", "B-LOC", "EndOfSentence"),
            String::new(),
            row("Ab¬", "O", "_"),
            "# hipe2022:document_id = d".to_owned(),
        ];
        let before = lines.clone();
        let mut report = NormalizationReport::default();
        NEWSEYE_DE_FR.apply(&mut lines, 9, &mut report).unwrap();

        assert_eq!(lines, before);
        assert_eq!(report.merges, 0);
    }

    #[test]
    fn hyphen_chain_merges_pairwise_into_commented_tail() {
        let mut lines = vec![
            row("Ver¬", "B-LOC", "n"),
            row("ei¬", "I-LOC", "_"),
            row("nigten", "I-LOC", "_"),
        ];
        let mut report = NormalizationReport::default();
        NEWSEYE_DE_FR.apply(&mut lines, 9, &mut report).unwrap();

        // The second merge lands on the line the first one commented out.
        assert_eq!(lines[0], row("Verei¬", "B-LOC", "n|Dehyphenated-3"));
        assert_eq!(
            lines[1],
            row("#einigten", "I-LOC", "_|Commented|Dehyphenated-6")
        );
        assert_eq!(lines[2], row("#nigten", "I-LOC", "Commented"));
        assert_eq!(report.merges, 2);
        assert_eq!(report.commented_lines, report.merges);
        assert_eq!(report.placeholders_collapsed, 1);
    }

    #[test]
    fn end_to_end_example() {
        let raw = format!(
            "TOKEN\tNE-COARSE-LIT\tNE-COARSE-METO\tNE-FINE-LIT\tNE-FINE-METO\tNE-FINE-COMP\tNE-NESTED\tNEL-LIT\tNEL-METO\tMISC\n{}\n{}\n",
            row("Ver¬", "B-LOC", "n"),
            row("einigten", "B-LOC", "n|SpaceAfter"),
        );
        let out = Normalizer::NewsEyeDeFr
            .normalize_text(&raw, &NormalizeOptions::default())
            .unwrap();
        let lines: Vec<&str> = out.output.lines().collect();
        assert_eq!(lines[2], row("Vereinigten", "B-LOC", "n|Dehyphenated-8"));
        assert_eq!(lines[3], row("#einigten", "B-LOC", "n|SpaceAfter|Commented"));
    }
}

//! Archaic character substitution (AJMC).
//!
//! The hmBERT family of models has never seen Fraktur long-s, so every `ſ`
//! is replaced by `s`. No hyphenation repair happens here and lines are
//! written as soon as they are assembled.

use std::borrow::Cow;

use super::{Header, NormalizationReport, NormalizeOptions, assemble};

pub const LONG_S: char = 'ſ';
pub const LONG_S_REPLACEMENT: &str = "s";

/// Replaces long-s in `line`, returning the number of replacements.
pub fn replace_long_s(line: &str) -> (Cow<'_, str>, usize) {
    let count = line.matches(LONG_S).count();
    if count == 0 {
        (Cow::Borrowed(line), 0)
    } else {
        (Cow::Owned(line.replace(LONG_S, LONG_S_REPLACEMENT)), count)
    }
}

pub(crate) fn normalize(
    header: &Header<'_>,
    body: &str,
    options: &NormalizeOptions,
    report: &mut NormalizationReport,
) -> String {
    let mut out = String::with_capacity(header.text.len() + body.len() + 2);
    header.write_to(&mut out);

    let mut substitutions = 0;
    assemble(
        body,
        options,
        report,
        |line| {
            let (line, count) = replace_long_s(line);
            substitutions += count;
            line
        },
        |line| {
            out.push_str(&line);
            out.push('\n');
        },
    );

    report.substitutions += substitutions;
    out
}

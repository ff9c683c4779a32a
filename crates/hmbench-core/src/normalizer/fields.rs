//! Tab-separated field editing for annotated lines.

use crate::error::{HmbenchError, Result};

/// Flag appended to the last column of a line that was commented out.
pub const COMMENTED: &str = "Commented";

/// Placeholder used by the HIPE formats for "no annotation".
pub const NO_ANNOTATION: &str = "_";

/// Flag marking a token that is glued to the following one.
pub const NO_SPACE_AFTER: &str = "NoSpaceAfter";

/// Tag prefix recording how many characters a token absorbed.
pub const DEHYPHENATED: &str = "Dehyphenated";

pub const FIELD_SEPARATOR: char = '\t';

/// Returns the surface token (field 0) of a line.
pub fn token(line: &str) -> &str {
    line.split(FIELD_SEPARATOR).next().unwrap_or_default()
}

/// A line split into owned fields, edited and joined back in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    fields: Vec<String>,
    line_no: usize,
}

impl Fields {
    /// Splits `line`; `line_no` is only used for error reporting.
    pub fn parse(line: &str, line_no: usize) -> Self {
        Self {
            fields: line.split(FIELD_SEPARATOR).map(str::to_owned).collect(),
            line_no,
        }
    }

    pub fn token(&self) -> &str {
        &self.fields[0]
    }

    pub fn set_token(&mut self, token: String) {
        self.fields[0] = token;
    }

    pub fn push_token_suffix(&mut self, suffix: &str) {
        self.fields[0].push_str(suffix);
    }

    /// Appends `|value` to the given column.
    pub fn append_flag(&mut self, column: usize, value: &str) -> Result<()> {
        let found = self.fields.len();
        let field = self
            .fields
            .get_mut(column)
            .ok_or(HmbenchError::MissingColumn {
                line: self.line_no,
                column,
                found,
            })?;
        field.push('|');
        field.push_str(value);
        Ok(())
    }

    /// Appends `|Dehyphenated-<absorbed>` to the metadata column.
    pub fn mark_dehyphenated(&mut self, metadata_column: usize, absorbed: usize) -> Result<()> {
        self.append_flag(metadata_column, &format!("{DEHYPHENATED}-{absorbed}"))
    }

    /// Prefixes the token with `comment_prefix` and flags the last column.
    pub fn comment_out(&mut self, comment_prefix: &str) {
        self.fields[0].insert_str(0, comment_prefix);
        if let Some(last) = self.fields.last_mut() {
            last.push('|');
            last.push_str(COMMENTED);
        }
    }

    /// Collapses a last column of `_|Commented` down to `Commented`.
    pub fn collapse_commented_placeholder(&mut self) -> bool {
        let Some(last) = self.fields.last_mut() else {
            return false;
        };
        let collapsible = last
            .strip_prefix(NO_ANNOTATION)
            .and_then(|rest| rest.strip_prefix('|'))
            .is_some_and(|rest| rest == COMMENTED);
        if collapsible {
            *last = COMMENTED.to_owned();
            return true;
        }
        false
    }

    pub fn join(&self) -> String {
        self.fields.join("\t")
    }
}

//! Conversion between parser line/column locations and byte offsets

/// Line start table for a generated query string.
///
/// sqlparser reports 1-based lines and 1-based character columns; diagnostics
/// need byte offsets into the query string to look up the source map.
#[derive(Debug, Clone)]
pub struct LineIndex<'t> {
    text: &'t str,
    line_starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    /// Index the line starts of `text`
    pub fn new(text: &'t str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// Byte offset of a 1-based line and 1-based character column.
    ///
    /// Returns `None` for the empty location `(0, 0)` and for lines past the
    /// end of the text. Columns past the end of a line clamp to the line end.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());

        let offset = self.text[start..end]
            .char_indices()
            .nth(column - 1)
            .map(|(i, _)| start + i)
            .unwrap_or(end);
        Some(offset)
    }

    /// Number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
#[path = "offset_test.rs"]
mod tests;

//! Source locations in original (host-language) source files.
//!
//! Lines are 1-based and columns are 0-based, matching the coordinates
//! emitted by the host-source extractor. Rendering adds one to the column.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 0-based column
    pub column: usize,
}

impl Position {
    /// Create a position from a 1-based line and a 0-based column
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A source range with a start and an optional end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl SourceLocation {
    /// A location consisting of a single point
    pub fn point(line: usize, column: usize) -> Self {
        Self {
            start: Position::new(line, column),
            end: None,
        }
    }

    /// A location spanning from `start` to `end`
    pub fn span(start: Position, end: Position) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// End of the range, or the start for point locations
    pub fn end_or_start(&self) -> Position {
        self.end.unwrap_or(self.start)
    }

    /// Smallest location covering every location in `locations`, taking the
    /// start of the first and the end of the last.
    pub fn overall<'a, I>(locations: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a SourceLocation>,
    {
        let mut iter = locations.into_iter();
        let first = iter.next()?;
        let last = iter.last().unwrap_or(first);
        Some(Self::span(first.start, last.end_or_start()))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column + 1)
    }
}

#[cfg(test)]
#[path = "location_test.rs"]
mod tests;

//! Source positions for diagnostics.

use std::fmt;

/// A region of source text, tracked by byte offsets and a 1-based line/column start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Merge two spans, keeping the position of the earlier one.
    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if self.start <= other.start {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest_position() {
        let a = Span::new(10, 12, 2, 3);
        let b = Span::new(4, 6, 1, 5);
        let merged = a.merge(&b);
        assert_eq!(merged, Span::new(4, 12, 1, 5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(0, 1, 7, 9).to_string(), "line 7, column 9");
    }
}

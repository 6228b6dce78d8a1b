//! Source locations.
//!
//! Positions are 0-indexed internally; the editor-probe surface converts
//! to the 1-based line/column the editor-probe boundary requires.

/// A position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open range in source text, start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn from_coords(
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// A zero-width span at a single position, used for synthetic
    /// (derived-artefact) locations that have no real source text.
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        if position.line < self.start.line || position.line > self.end.line {
            return false;
        }
        if position.line == self.start.line && position.column < self.start.column {
            return false;
        }
        if position.line == self.end.line && position.column > self.end.column {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_checks_both_ends() {
        let span = Span::from_coords(1, 5, 3, 2);
        assert!(span.contains(Position::new(2, 0)));
        assert!(span.contains(Position::new(1, 5)));
        assert!(!span.contains(Position::new(1, 4)));
        assert!(span.contains(Position::new(3, 2)));
        assert!(!span.contains(Position::new(3, 3)));
    }
}

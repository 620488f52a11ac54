//! Position tracking for source cursors
//!
//! Stores the source location (line/column) a cursor has reached, used when
//! reporting fatal engine errors.

use text_size::TextSize;

/// A position in source text (0-indexed line and column, in characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position reached after reading `chars` characters.
    ///
    /// Gaps count as a single column; `\n` starts a new line.
    pub fn after<I>(chars: I) -> Self
    where
        I: IntoIterator<Item = Option<char>>,
    {
        let mut position = Position::default();
        for chr in chars {
            if chr == Some('\n') {
                position.line += 1;
                position.column = 0;
            } else {
                position.column += 1;
            }
        }
        position
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Convert a character offset into a `TextSize`, saturating on overflow.
pub fn offset_size(offset: usize) -> TextSize {
    TextSize::new(u32::try_from(offset).unwrap_or(u32::MAX))
}

//! Mapping between byte offsets and 1-based line/column positions.

use std::fmt;

pub use text_size::{TextRange, TextSize};
use text_size::TextLen as _;

/// A 1-based line/column pair. Columns count bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    /// Returned for positions that cannot be resolved; never a valid location.
    pub const UNKNOWN: Self = Self { line: 0, col: 0 };
    pub const START: Self = Self { line: 1, col: 1 };

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("offset {offset:?} is out of range for a text of length {len:?}")]
pub struct OutOfRange {
    pub offset: TextSize,
    pub len: TextSize,
}

/// Prefix table of line start offsets for one text snapshot.
///
/// `starts[i]` is the total length of all lines before line `i + 1`, so the
/// table is strictly increasing and always begins with zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTable {
    starts: Vec<TextSize>,
    len: TextSize,
}

impl LineTable {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![TextSize::new(0)];
        starts.extend(text.match_indices('\n').map(|(idx, _)| TextSize::new(idx as u32 + 1)));
        Self { starts, len: text.text_len() }
    }

    /// Length of the text this table was built from.
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }

    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }

    /// Resolves `offset` to its line and column.
    ///
    /// The offset one past the last byte is valid and maps to the end of the
    /// last line.
    pub fn line_col(&self, offset: TextSize) -> Result<LineCol, OutOfRange> {
        if offset == TextSize::new(0) {
            return Ok(LineCol::START);
        }

        if offset > self.len {
            return Err(OutOfRange { offset, len: self.len });
        }

        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let col = offset - self.starts[line];

        Ok(LineCol { line: line as u32 + 1, col: u32::from(col) + 1 })
    }

    /// Inverse of [`LineTable::line_col`].
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let range = self.line_range_with_terminator(line_col.line)?;
        let offset = range.start().checked_add(TextSize::new(line_col.col.checked_sub(1)?))?;

        let is_last_line = line_col.line == self.line_count();
        if offset < range.end() || (is_last_line && offset == range.end()) {
            Some(offset)
        } else {
            None
        }
    }

    /// Range of `line`, excluding its line terminator.
    pub fn line_range(&self, line: u32) -> Option<TextRange> {
        let range = self.line_range_with_terminator(line)?;
        let end =
            if line < self.line_count() { range.end() - TextSize::new(1) } else { range.end() };
        Some(TextRange::new(range.start(), end))
    }

    /// Content of `line` with trailing whitespace (and any `\r`) trimmed.
    pub fn line_text<'a>(&self, text: &'a str, line: u32) -> Option<&'a str> {
        let range = self.line_range(line)?;
        text.get(std::ops::Range::<usize>::from(range)).map(str::trim_end)
    }

    fn line_range_with_terminator(&self, line: u32) -> Option<TextRange> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.starts.get(index)?;
        let end = self.starts.get(index + 1).copied().unwrap_or(self.len);
        Some(TextRange::new(start, end))
    }
}

/// A replacement of `start..old_end` with text ending at `new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: TextSize,
    pub old_end: TextSize,
    pub new_end: TextSize,
}

impl TextEdit {
    pub fn new(start: TextSize, old_end: TextSize, new_end: TextSize) -> Self {
        assert!(
            start <= old_end && start <= new_end,
            "malformed edit {start:?}..{old_end:?} -> {new_end:?}"
        );
        Self { start, old_end, new_end }
    }

    /// Edit replacing `range` with `replacement`.
    pub fn replace(range: TextRange, replacement: &str) -> Self {
        Self::new(range.start(), range.end(), range.start() + replacement.text_len())
    }

    pub fn old_range(self) -> TextRange {
        TextRange::new(self.start, self.old_end)
    }

    pub fn new_range(self) -> TextRange {
        TextRange::new(self.start, self.new_end)
    }

    /// Maps an offset at or after `old_end` into the edited text.
    pub fn shift(self, offset: TextSize) -> TextSize {
        if offset >= self.old_end { offset - self.old_end + self.new_end } else { offset }
    }

    /// Maps both ends of `range` independently with [`TextEdit::shift`].
    pub fn shift_range(self, range: TextRange) -> TextRange {
        TextRange::new(self.shift(range.start()), self.shift(range.end()))
    }
}

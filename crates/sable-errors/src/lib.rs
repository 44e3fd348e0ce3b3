use std::fmt::{self, Display, Write as _};

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
use sable_span::{LineCol, LineTable, TextEdit};
pub use text_size::{TextRange, TextSize};

/// Every diagnostic the tokenizer and parser can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedStringLiteral,
    #[error("missing separator between list items")]
    MissedListSeparator,
    #[error("trailing separator at the end of a list")]
    TrailingListSeparator,
    #[error("extra separator in a list")]
    ExtraListSeparator,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("expected {0}")]
    ExpectedToken(&'static str),
    #[error("unexpected end of file")]
    UnexpectedEndOfFile,
}

impl ParseErrorKind {
    /// Stable numeric code, printed as `error <code>`.
    pub const fn code(&self) -> u16 {
        match self {
            Self::UnexpectedCharacter(_) => 1001,
            Self::UnterminatedStringLiteral => 1002,
            Self::MissedListSeparator => 1003,
            Self::TrailingListSeparator => 1004,
            Self::ExtraListSeparator => 1005,
            Self::UnexpectedToken => 1006,
            Self::ExpectedToken(_) => 1007,
            Self::UnexpectedEndOfFile => 1008,
        }
    }

    pub const fn is_lexical(&self) -> bool {
        matches!(self, Self::UnexpectedCharacter(_) | Self::UnterminatedStringLiteral)
    }
}

/// A diagnostic bound to a byte offset in one source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    kind: ParseErrorKind,
    offset: TextSize,
    len: TextSize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: TextSize) -> Self {
        Self { kind, offset, len: TextSize::new(1) }
    }

    /// Error covering `range`; empty ranges still underline one column.
    pub fn at(kind: ParseErrorKind, range: TextRange) -> Self {
        Self { kind, offset: range.start(), len: range.len().max(TextSize::new(1)) }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.len)
    }

    /// Moves the error along with the text it points into.
    pub fn shift(&mut self, edit: TextEdit) {
        self.offset = edit.shift(self.offset);
    }

    /// Renders `path:line:col - error <code>: <message>`, the offending line,
    /// and a `~` underline below the affected columns.
    pub fn render(&self, path: &str, text: &str, lines: &LineTable) -> String {
        let line_col = lines.line_col(self.offset).unwrap_or(LineCol::UNKNOWN);
        let mut out = format!(
            "{path}:{}:{} - error {}: {}",
            line_col.line,
            line_col.col,
            self.code(),
            self.kind
        );

        if let Some(line_text) = lines.line_text(text, line_col.line) {
            let number = line_col.line.to_string();
            let padding = number.len() + line_col.col as usize;
            let underline = "~".repeat(u32::from(self.len).max(1) as usize);
            _ = write!(out, "\n{number} {line_text}\n{:padding$}{underline}", "");
        }

        out
    }

    /// Renders the error through `annotate-snippets`, folding unrelated lines.
    pub fn render_snippet(&self, renderer: &Renderer, path: &str, text: &str) -> String {
        let end = usize::from(self.range().end()).min(text.len());
        let start = usize::from(self.offset).min(end);
        let title = format!("{} [{}]", self.kind, self.code());

        let message = Level::Error.title(&title).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(start..end).label("here"))
                .fold(true),
        );
        renderer.render(message).to_string()
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.kind, f)
    }
}

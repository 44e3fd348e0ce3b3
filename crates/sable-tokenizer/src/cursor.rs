use std::str::Chars;

use text_size::{TextLen as _, TextRange, TextSize};

pub(crate) const EOF_CHAR: char = '\0';

pub(crate) struct Cursor<'a> {
    text: &'a str,
    chars: Chars<'a>,
    token_start: TextSize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, chars: text.chars(), token_start: TextSize::new(0) }
    }

    pub(crate) fn offset(&self) -> TextSize {
        self.text.text_len() - self.chars.as_str().text_len()
    }

    /// Moves to `offset`, which must lie on a char boundary.
    pub(crate) fn jump(&mut self, offset: TextSize) {
        let offset = offset.min(self.text.text_len());
        self.chars = self.text[usize::from(offset)..].chars();
        self.token_start = offset;
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    pub(crate) fn token_range(&self) -> TextRange {
        TextRange::new(self.token_start, self.offset())
    }

    pub(crate) fn token_start(&self) -> TextSize {
        self.token_start
    }

    pub(crate) fn reset_pos_within_token(&mut self) {
        self.token_start = self.offset();
    }

    pub(crate) fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn second(&self) -> char {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn matches(&self, c: char) -> bool {
        !self.is_eof() && self.peek() == c
    }

    pub(crate) fn advance(&mut self) -> char {
        self.chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool + Copy) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }
}

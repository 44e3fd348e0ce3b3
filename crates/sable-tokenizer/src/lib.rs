mod cursor;
mod list;
mod token;

use cursor::Cursor;
pub use list::{Entity, PullList, Splice, TokenArray, TokenSource, find_token_index_at_position};
use sable_errors::{ParseError, ParseErrorKind};
pub use token::{
    AssignOp, KEYWORDS, Operator, Punct, RelOp, Token, TokenKind, is_keyword, unescape,
};
use text_size::{TextRange, TextSize};

/// Single-pass scanner over one source text.
///
/// Lexical errors never stop the scan; they are collected and can be taken
/// with [`Tokenizer::take_errors`].
pub struct Tokenizer<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    peeked: Option<Option<Token>>,
    errors: Vec<ParseError>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: Cursor::new(text), peeked: None, errors: Vec::new() }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn peek(&mut self) -> Option<Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan());
        }
        self.peeked.flatten()
    }

    pub fn eof(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Restarts scanning at `offset`.
    pub fn jump(&mut self, offset: TextSize) {
        self.peeked = None;
        self.cursor.jump(offset);
    }

    /// Swaps in a new snapshot of the text and rewinds to its start.
    pub fn reload(&mut self, text: &'a str) {
        self.text = text;
        self.cursor = Cursor::new(text);
        self.peeked = None;
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Drains the remaining tokens together with every lexical error seen.
    pub fn list(mut self) -> (Vec<Token>, Vec<ParseError>) {
        let tokens = self.by_ref().collect();
        (tokens, self.errors)
    }

    fn scan(&mut self) -> Option<Token> {
        loop {
            self.cursor.advance_while(|c| c != '\n' && c != '\r' && c.is_whitespace());
            self.cursor.reset_pos_within_token();

            if self.cursor.is_eof() {
                return None;
            }

            let kind = match self.cursor.advance() {
                '\n' => TokenKind::Newline,
                '\r' => {
                    if !self.cursor.matches('\n') {
                        continue;
                    }
                    self.cursor.advance();
                    TokenKind::Newline
                }
                quote @ ('"' | '\'') => self.string(quote),
                '0'..='9' => self.number(true),
                '.' if self.cursor.peek().is_ascii_digit() => self.number(false),
                'A'..='Z' | 'a'..='z' | '_' | '$' => {
                    self.cursor
                        .advance_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
                    let text = &self.text[self.cursor.token_range()];
                    TokenKind::Ident { keyword: is_keyword(text) }
                }
                first_char => match self.operator(first_char) {
                    Some(kind) => kind,
                    None => {
                        let range = self.cursor.token_range();
                        self.errors.push(ParseError::at(
                            ParseErrorKind::UnexpectedCharacter(first_char),
                            range,
                        ));
                        continue;
                    }
                },
            };

            return Some(Token::new(kind, self.cursor.token_range()));
        }
    }

    fn number(&mut self, allow_fraction: bool) -> TokenKind {
        self.cursor.advance_while(|c| c.is_ascii_digit());

        if allow_fraction && self.cursor.matches('.') && self.cursor.second().is_ascii_digit() {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_digit());
        }

        TokenKind::Number
    }

    fn string(&mut self, quote: char) -> TokenKind {
        let open = TextRange::at(self.cursor.token_start(), TextSize::new(1));

        loop {
            if self.cursor.is_eof() {
                self.errors.push(ParseError::at(ParseErrorKind::UnterminatedStringLiteral, open));
                return TokenKind::String { terminated: false };
            }

            match self.cursor.advance() {
                '\\' => {
                    self.cursor.advance();
                }
                c if c == quote => return TokenKind::String { terminated: true },
                _ => {}
            }
        }
    }

    fn operator(&mut self, first_char: char) -> Option<TokenKind> {
        use TokenKind::{Assign, Operator as Op, Punct as P, Relational};

        let double = match (first_char, self.cursor.peek()) {
            ('=', '=') => Some(Relational(RelOp::Eq)),
            ('!', '=') => Some(Relational(RelOp::NotEq)),
            ('<', '=') => Some(Relational(RelOp::LtEq)),
            ('>', '=') => Some(Relational(RelOp::GtEq)),
            ('+', '=') => Some(Assign(AssignOp::AddAssign)),
            ('-', '=') => Some(Assign(AssignOp::SubAssign)),
            ('*', '=') => Some(Assign(AssignOp::MulAssign)),
            ('/', '=') => Some(Assign(AssignOp::DivAssign)),
            ('%', '=') => Some(Assign(AssignOp::RemAssign)),
            ('|', '|') => Some(Op(Operator::OrOr)),
            ('&', '&') => Some(Op(Operator::AndAnd)),
            ('*', '*') => Some(Op(Operator::StarStar)),
            ('+', '+') => Some(Op(Operator::PlusPlus)),
            ('-', '-') => Some(Op(Operator::MinusMinus)),
            _ => None,
        };

        if double.is_some() {
            self.cursor.advance();
            return double;
        }

        let kind = match first_char {
            '(' => P(Punct::LeftParen),
            ')' => P(Punct::RightParen),
            '[' => P(Punct::LeftBracket),
            ']' => P(Punct::RightBracket),
            '{' => P(Punct::LeftBrace),
            '}' => P(Punct::RightBrace),
            ',' => P(Punct::Comma),
            ';' => P(Punct::Semicolon),
            ':' => P(Punct::Colon),
            '.' => P(Punct::Dot),
            '=' => Assign(AssignOp::Assign),
            '<' => Relational(RelOp::Lt),
            '>' => Relational(RelOp::Gt),
            '+' => Op(Operator::Plus),
            '-' => Op(Operator::Minus),
            '*' => Op(Operator::Star),
            '/' => Op(Operator::Slash),
            '%' => Op(Operator::Percent),
            '!' => Op(Operator::Bang),
            '&' => Op(Operator::Amp),
            '|' => Op(Operator::Pipe),
            '^' => Op(Operator::Caret),
            '~' => Op(Operator::Tilde),
            '?' => Op(Operator::Question),
            _ => return None,
        };

        Some(kind)
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.scan(),
        }
    }
}

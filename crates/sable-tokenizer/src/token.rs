use text_size::{TextRange, TextSize};

/// Identifiers that are also reserved words of the language.
pub const KEYWORDS: &[&str] = &["func", "return", "if", "else", "while", "true", "false"];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    pub fn start(&self) -> TextSize {
        self.range.start()
    }

    pub fn end(&self) -> TextSize {
        self.range.end()
    }

    /// Raw source text of the token, delimiters included.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range]
    }

    pub fn is_newline(&self) -> bool {
        self.kind == TokenKind::Newline
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    /// Identifier that is not a reserved word.
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Ident { keyword: false }
    }

    pub fn is_keyword(&self, source: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Ident { keyword: true } && self.text(source) == keyword
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String { terminated: bool },
    Punct(Punct),
    Operator(Operator),
    Assign(AssignOp),
    Relational(RelOp),
    Ident { keyword: bool },
    Newline,
}

impl TokenKind {
    /// Source spelling of punctuation and operator kinds.
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Punct(punct) => Some(punct.as_str()),
            Self::Operator(op) => Some(op.as_str()),
            Self::Assign(op) => Some(op.as_str()),
            Self::Relational(op) => Some(op.as_str()),
            Self::Number | Self::String { .. } | Self::Ident { .. } | Self::Newline => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    Dot,
}

impl Punct {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Question,
    OrOr,
    AndAnd,
    StarStar,
    PlusPlus,
    MinusMinus,
}

impl Operator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Question => "?",
            Self::OrOr => "||",
            Self::AndAnd => "&&",
            Self::StarStar => "**",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::RemAssign => "%=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl RelOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
        }
    }
}

/// Decodes the value of a string literal from its raw text.
///
/// A backslash keeps the character after it verbatim. A missing closing
/// delimiter is tolerated.
pub fn unescape(raw: &str) -> String {
    let mut chars = raw.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };

    let mut value = String::with_capacity(raw.len());
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.extend(chars.next()),
            c if c == quote => break,
            c => value.push(c),
        }
    }
    value
}

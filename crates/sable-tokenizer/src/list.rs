//! Index-addressed views over a token sequence.
//!
//! An [`Entity`] is a cursor `(source, index)`. Its `next` and `prev` are
//! plain index arithmetic, so any number of entities can share one source.
//! Two sources exist: [`PullList`] pulls tokens from a tokenizer on first
//! access, [`TokenArray`] holds every token up front and can be spliced after
//! an edit of the text.

use std::cell::RefCell;
use std::fmt;

use sable_errors::ParseError;
use sable_span::TextEdit;
use text_size::TextSize;
use tracing::debug;

use crate::{Token, Tokenizer};

pub trait TokenSource {
    /// Token at `index`, or `None` past the end of the stream.
    fn token(&self, index: usize) -> Option<Token>;
}

pub struct Entity<'s, S: ?Sized> {
    source: &'s S,
    index: usize,
}

impl<'s, S: TokenSource + ?Sized> Entity<'s, S> {
    pub fn new(source: &'s S, index: usize) -> Self {
        Self { source, index }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn token(self) -> Option<Token> {
        self.source.token(self.index)
    }

    pub fn next(self) -> Self {
        Self { source: self.source, index: self.index + 1 }
    }

    pub fn prev(self) -> Option<Self> {
        let index = self.index.checked_sub(1)?;
        Some(Self { source: self.source, index })
    }
}

impl<S: ?Sized> Clone for Entity<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for Entity<'_, S> {}

impl<S: ?Sized> PartialEq for Entity<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.source, other.source) && self.index == other.index
    }
}

impl<S: ?Sized> Eq for Entity<'_, S> {}

impl<S: ?Sized> fmt::Debug for Entity<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("index", &self.index).finish_non_exhaustive()
    }
}

/// Stream-backed list: each token is pulled from the tokenizer exactly once.
pub struct PullList<'a> {
    tokenizer: RefCell<Tokenizer<'a>>,
    pulled: RefCell<Vec<Token>>,
}

impl<'a> PullList<'a> {
    pub fn new(tokenizer: Tokenizer<'a>) -> Self {
        Self { tokenizer: RefCell::new(tokenizer), pulled: RefCell::new(Vec::new()) }
    }

    pub fn head(&self) -> Entity<'_, Self> {
        Entity::new(self, 0)
    }

    /// Number of tokens pulled so far.
    pub fn pulled(&self) -> usize {
        self.pulled.borrow().len()
    }

    /// Lexical errors seen while pulling.
    pub fn errors(&self) -> Vec<ParseError> {
        self.tokenizer.borrow().errors().to_vec()
    }
}

impl TokenSource for PullList<'_> {
    fn token(&self, index: usize) -> Option<Token> {
        let mut pulled = self.pulled.borrow_mut();
        while pulled.len() <= index {
            let token = self.tokenizer.borrow_mut().next()?;
            pulled.push(token);
        }
        Some(pulled[index])
    }
}

const LOOKAHEAD: TextSize = TextSize::new(2);

/// Outcome of [`TokenArray::apply_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    /// Index of the first inserted token, or of the first token after the
    /// removed run when nothing was inserted.
    pub head: usize,
    pub inserted: usize,
    pub deleted: usize,
}

impl Splice {
    pub fn is_single_token(&self) -> bool {
        self.inserted == 1 && self.deleted == 1
    }

    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

/// Fully materialized token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenArray {
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl TokenArray {
    pub fn new(text: &str) -> Self {
        Self::from_tokenizer(Tokenizer::new(text))
    }

    pub fn from_tokenizer(tokenizer: Tokenizer<'_>) -> Self {
        let (tokens, errors) = tokenizer.list();
        Self { tokens, errors }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Lexical errors, ordered by offset.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn head(&self) -> Entity<'_, Self> {
        Entity::new(self, 0)
    }

    pub fn entity(&self, index: usize) -> Entity<'_, Self> {
        Entity::new(self, index)
    }

    pub fn find_token_index_at_position(&self, offset: TextSize, start: usize) -> Option<usize> {
        find_token_index_at_position(&self.tokens, offset, start)
    }

    /// Re-lexes the region touched by `edit` in the already edited `text`
    /// and splices the result over the stale tokens.
    ///
    /// Tokens after the region are reused and moved by the edit's length
    /// delta. Re-lexing starts right after the last token whose lookahead
    /// cannot reach the edit and stops at the first new token past the edit
    /// that lines up with an old one, so no token is ever split.
    pub fn apply_edit(&mut self, text: &str, edit: TextEdit) -> Splice {
        let old = &self.tokens;

        // The scanner peeks up to two bytes past a token (`1.5`), and a
        // swallowed `\r` leaves no token behind, so scanning resumes at the
        // end of the last token that is out of reach.
        let mut head = old.partition_point(|token| token.end() + LOOKAHEAD <= edit.start);
        let lex_from = head.checked_sub(1).map_or(TextSize::new(0), |prev| old[prev].end());
        let mut tokenizer = Tokenizer::new(text);
        tokenizer.jump(lex_from);

        let mut replacement = Vec::new();
        let mut end = old.len();
        let mut resync: Option<(TextSize, TextSize)> = None;

        for token in tokenizer.by_ref() {
            if token.start() >= edit.new_end {
                let old_start = token.start() - edit.new_end + edit.old_end;
                let lines_up = find_token_index_at_position(old, old_start, head).filter(|&j| {
                    let stale = old[j];
                    stale.start() == old_start
                        && stale.kind == token.kind
                        && stale.range.len() == token.range.len()
                });

                if let Some(j) = lines_up {
                    end = j;
                    resync = Some((old_start, token.start()));
                    break;
                }
            }
            replacement.push(token);
        }

        let unchanged = replacement
            .iter()
            .zip(&old[head..end])
            .take_while(|(fresh, stale)| fresh == stale && fresh.end() <= edit.start)
            .count();
        replacement.drain(..unchanged);
        head += unchanged;

        let inserted = replacement.len();
        let deleted = end - head;
        self.tokens.splice(head..end, replacement);
        for token in &mut self.tokens[head + inserted..] {
            token.range = edit.shift_range(token.range);
        }

        let (old_resync, new_resync) =
            resync.unwrap_or((TextSize::new(u32::MAX), TextSize::new(u32::MAX)));
        self.errors.retain(|error| error.offset() < lex_from || error.offset() >= old_resync);
        for error in &mut self.errors {
            if error.offset() >= old_resync {
                error.shift(edit);
            }
        }
        self.errors.extend(
            tokenizer.take_errors().into_iter().filter(|error| error.offset() < new_resync),
        );
        self.errors.sort_by_key(ParseError::offset);

        debug!(
            start = u32::from(edit.start),
            old_end = u32::from(edit.old_end),
            new_end = u32::from(edit.new_end),
            head,
            inserted,
            deleted,
            "spliced token array"
        );

        Splice { head, inserted, deleted }
    }
}

impl TokenSource for TokenArray {
    fn token(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }
}

/// Finds the index of the token whose range contains `offset`, searching
/// from `start` onwards.
///
/// The search jumps forward by a step that halves after every probe, which
/// keeps it logarithmic in the distance from `start`.
pub fn find_token_index_at_position(
    tokens: &[Token],
    offset: TextSize,
    start: usize,
) -> Option<usize> {
    if start >= tokens.len() {
        return None;
    }

    let mut index = start;
    let mut step = (tokens.len() - start).next_power_of_two();
    while step > 0 {
        let probe = index + step;
        if probe < tokens.len() && tokens[probe].start() <= offset {
            index = probe;
        }
        step /= 2;
    }

    tokens[index].range.contains(offset).then_some(index)
}

use drop_bomb::DropBomb;
use sable_errors::{ParseError, ParseErrorKind};
use sable_tokenizer::{Punct, Token, TokenSource};
use text_size::{TextLen as _, TextRange, TextSize};

use crate::ast::{Ast, Node, NodeData, NodeId, Rule};

/// Parsing session over one token source.
///
/// Holds the cursor, the backtrack stack and the stack of error frames.
/// Every diagnostic must be reported while at least one frame is open.
pub(crate) struct Parser<'t> {
    text: &'t str,
    source: &'t dyn TokenSource,
    pos: usize,
    /// Index and end offset of the last consumed token.
    last: Option<(usize, TextSize)>,
    ast: Ast,
    saved: Vec<Saved>,
    frames: Vec<Vec<ParseError>>,
}

#[derive(Clone, Copy)]
struct Saved {
    pos: usize,
    last: Option<(usize, TextSize)>,
    nodes: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(text: &'t str, source: &'t dyn TokenSource, ast: Ast) -> Self {
        let mut parser =
            Self { text, source, pos: 0, last: None, ast, saved: Vec::new(), frames: Vec::new() };
        parser.skip_newlines();
        parser
    }

    /// Moves the cursor to token `index`, as if nothing had been consumed yet.
    pub(crate) fn jump(&mut self, index: usize) {
        self.pos = index;
        self.last = None;
        self.skip_newlines();
    }

    pub(crate) fn finish(self) -> Ast {
        assert!(self.saved.is_empty(), "unresolved checkpoints at the end of a parse");
        assert!(self.frames.is_empty(), "unclosed error frames at the end of a parse");
        self.ast
    }

    pub(crate) fn text(&self) -> &'t str {
        self.text
    }

    pub(crate) fn ast(&self) -> &Ast {
        &self.ast
    }

    pub(crate) fn current(&self) -> Option<Token> {
        self.source.token(self.pos)
    }

    pub(crate) fn eof(&self) -> bool {
        self.current().is_none()
    }

    pub(crate) fn at(&self, predicate: impl FnOnce(Token) -> bool) -> bool {
        self.current().is_some_and(predicate)
    }

    pub(crate) fn at_punct(&self, punct: Punct) -> bool {
        self.at(|token| token.is_punct(punct))
    }

    pub(crate) fn eat_punct(&mut self, punct: Punct) -> bool {
        let at = self.at_punct(punct);
        if at {
            self.advance();
        }
        at
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        let text = self.text;
        let at = self.at(|token| token.is_keyword(text, keyword));
        if at {
            self.advance();
        }
        at
    }

    /// Consumes the current token and every newline after it.
    pub(crate) fn advance(&mut self) {
        let Some(token) = self.current() else {
            return;
        };

        self.last = Some((self.pos, token.end()));
        self.pos += 1;
        self.skip_newlines();
    }

    fn skip_newlines(&mut self) {
        while self.at(|token| token.is_newline()) {
            self.pos += 1;
        }
    }

    /// Range of the current token, or an empty range at the end of the text.
    fn current_range(&self) -> TextRange {
        match self.current() {
            Some(token) => token.range,
            None => TextRange::empty(self.text.text_len()),
        }
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.saved.push(Saved { pos: self.pos, last: self.last, nodes: self.ast.raw_len() });
        Checkpoint {
            depth: self.saved.len(),
            bomb: DropBomb::new("Checkpoint must be either restored or committed"),
        }
    }

    /// Rewinds the cursor and drops every node built since `checkpoint`.
    pub(crate) fn restore(&mut self, mut checkpoint: Checkpoint) {
        checkpoint.bomb.defuse();
        let saved = self.pop_saved(checkpoint.depth);
        self.pos = saved.pos;
        self.last = saved.last;
        self.ast.truncate(saved.nodes);
    }

    pub(crate) fn commit(&mut self, mut checkpoint: Checkpoint) {
        checkpoint.bomb.defuse();
        self.pop_saved(checkpoint.depth);
    }

    fn pop_saved(&mut self, depth: usize) -> Saved {
        assert_eq!(self.saved.len(), depth, "checkpoints must be resolved innermost first");
        match self.saved.pop() {
            Some(saved) => saved,
            None => panic!("restore from an empty backtrack stack"),
        }
    }

    pub(crate) fn push_frame(&mut self) -> Frame {
        self.frames.push(Vec::new());
        Frame {
            depth: self.frames.len(),
            bomb: DropBomb::new("Error frame must be either taken, kept or merged"),
        }
    }

    pub(crate) fn report(&mut self, kind: ParseErrorKind) {
        let range = self.current_range();
        self.report_at(kind, range);
    }

    pub(crate) fn report_at(&mut self, kind: ParseErrorKind, range: TextRange) {
        match self.frames.last_mut() {
            Some(frame) => frame.push(ParseError::at(kind, range)),
            None => panic!("diagnostic reported outside of any error frame: {kind}"),
        }
    }

    pub(crate) fn take_frame(&mut self, mut frame: Frame) -> Vec<ParseError> {
        frame.bomb.defuse();
        assert_eq!(self.frames.len(), frame.depth, "error frames must be popped innermost first");
        match self.frames.pop() {
            Some(errors) => errors,
            None => panic!("popped an error frame that was never pushed"),
        }
    }

    /// Closes `frame`, attaching its diagnostics to `keep` or dropping them
    /// when there is no node to keep them on.
    pub(crate) fn pop_frame(&mut self, frame: Frame, keep: Option<NodeId>) {
        let errors = self.take_frame(frame);
        if let Some(node) = keep {
            self.ast.attach(node, errors);
        }
    }

    /// Closes `frame`, handing its diagnostics to the enclosing frame.
    pub(crate) fn merge_frame(&mut self, frame: Frame) {
        let errors = self.take_frame(frame);
        match self.frames.last_mut() {
            Some(outer) => outer.extend(errors),
            None => panic!("merged an error frame with no enclosing frame"),
        }
    }

    pub(crate) fn start(&self) -> Marker {
        Marker::new(self.pos, self.current_range().start())
    }

    /// Marker starting where `node` starts, for wrapping it in a new node.
    pub(crate) fn precede(&self, node: NodeId) -> Marker {
        let node = &self.ast[node];
        Marker::new(node.tokens.start, node.range().start())
    }
}

pub(crate) struct Checkpoint {
    depth: usize,
    bomb: DropBomb,
}

pub(crate) struct Frame {
    depth: usize,
    bomb: DropBomb,
}

pub(crate) struct Marker {
    token: usize,
    offset: TextSize,
    bomb: DropBomb,
}

impl Marker {
    fn new(token: usize, offset: TextSize) -> Self {
        Self { token, offset, bomb: DropBomb::new("Marker must be either completed or abandoned") }
    }

    /// Allocates a node spanning from the marker to the last consumed token,
    /// or returns `None` when nothing was consumed since the marker.
    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: Node, rule: Rule) -> Option<NodeId> {
        self.bomb.defuse();

        let (last, end) = p.last.filter(|&(last, _)| last >= self.token)?;
        let range = TextRange::new(self.offset, end);
        Some(p.ast.alloc(NodeData::new(kind, range, self.token..last + 1, rule)))
    }

    pub(crate) fn abandon(mut self) {
        self.bomb.defuse();
    }
}

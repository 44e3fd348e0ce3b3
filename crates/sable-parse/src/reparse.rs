//! Incremental reparsing after a token splice.
//!
//! The smallest node whose tokens cover the replaced ones has its rule run
//! again from its first token. The fresh node is accepted only if it ends
//! exactly where the old one ends after the splice, in which case it is
//! merged into the old slot and every id stays valid. Otherwise the parent
//! gets the same treatment; with no covering node left the source is parsed
//! from scratch.

use std::cmp::Reverse;

use sable_span::TextEdit;
use sable_tokenizer::{Splice, TokenArray};
use tracing::debug;

use crate::ast::{Ast, NodeId};
use crate::grammar;
use crate::parser::Parser;
use crate::{Parse, parse};

/// How [`Parse::reparse`] brought the tree up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reparse {
    /// No token changed; offsets were moved.
    Shifted,
    /// The node was rebuilt in place.
    Patched(NodeId),
    /// Nothing could be reused.
    Full,
}

impl Parse {
    /// Updates the tree after `tokens` was spliced by
    /// [`TokenArray::apply_edit`] for `edit`. `text` is the edited text.
    pub fn reparse(
        &mut self,
        text: &str,
        tokens: &TokenArray,
        splice: Splice,
        edit: TextEdit,
    ) -> Reparse {
        let covering = if splice.is_noop() {
            None
        } else {
            NodeIndex::new(&self.ast, &self.items).smallest_covering(&self.ast, splice)
        };

        self.ast.shift(tokens.tokens(), splice, edit);
        for error in &mut self.errors {
            error.shift(edit);
        }

        if splice.is_noop() {
            debug!("reparse: offsets shifted");
            return Reparse::Shifted;
        }

        // Patches never free slots; once the dead ones outnumber the live
        // tree, a fresh parse is cheaper to keep around.
        if self.ast.retired_len() > self.ast.raw_len() / 2 {
            debug!(retired = self.ast.retired_len(), "reparse: full, dropping retired slots");
            *self = parse(text, tokens);
            return Reparse::Full;
        }

        let mut candidate = covering;
        while let Some(id) = candidate {
            if self.rebuild(text, tokens, id) {
                debug!(node = id.index(), "reparse: node patched in place");
                return Reparse::Patched(id);
            }
            candidate = self.ast[id].parent();
        }

        debug!("reparse: full");
        *self = parse(text, tokens);
        Reparse::Full
    }

    fn rebuild(&mut self, text: &str, tokens: &TokenArray, id: NodeId) -> bool {
        let node = &self.ast[id];
        let (rule, start, end) = (node.rule, node.tokens.start, node.tokens.end);
        let mark = self.ast.raw_len();

        let mut p = Parser::new(text, tokens, std::mem::take(&mut self.ast));
        p.jump(start);
        let frame = p.push_frame();
        let fresh = grammar::rerun(&mut p, rule);
        p.pop_frame(frame, None);
        self.ast = p.finish();

        match fresh {
            Some(fresh) if self.ast[fresh].tokens.end == end => {
                self.ast.replace(id, fresh);
                true
            }
            _ => {
                self.ast.truncate(mark);
                false
            }
        }
    }
}

type Entry = (usize, Reverse<usize>, usize, NodeId);

/// Live nodes sorted by first token, outer nodes before inner ones.
struct NodeIndex {
    entries: Vec<Entry>,
}

impl NodeIndex {
    /// A pre-order walk over position-ordered children already yields the
    /// entries in sorted order.
    fn new(ast: &Ast, items: &[NodeId]) -> Self {
        fn visit(ast: &Ast, id: NodeId, depth: usize, entries: &mut Vec<Entry>) {
            let tokens = ast[id].token_range();
            entries.push((tokens.start, Reverse(tokens.end), depth, id));
            for child in ast[id].children() {
                visit(ast, child, depth + 1, entries);
            }
        }

        let mut entries = Vec::new();
        for &item in items {
            visit(ast, item, 0, &mut entries);
        }
        debug_assert!(entries.is_sorted(), "children out of source order");
        Self { entries }
    }

    /// Innermost node containing every token `splice` removed, or the
    /// insertion point when it removed none.
    ///
    /// Binary search to the last node starting at or before the splice, then
    /// walk left until a node covers it.
    fn smallest_covering(&self, ast: &Ast, splice: Splice) -> Option<NodeId> {
        let head = splice.head;
        let removed_end = head + splice.deleted;
        let covers = |id: NodeId| {
            let tokens = ast[id].token_range();
            if splice.deleted == 0 {
                tokens.start < head && head < tokens.end
            } else {
                tokens.start <= head && removed_end <= tokens.end
            }
        };

        let upper = self.entries.partition_point(|&(start, ..)| start <= head);
        self.entries[..upper].iter().rev().map(|&(.., id)| id).find(|&id| covers(id))
    }
}

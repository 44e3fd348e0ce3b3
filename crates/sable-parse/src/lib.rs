mod ast;
mod combinators;
mod grammar;
mod parser;
mod pattern;
mod reparse;
#[cfg(test)]
mod tests;

pub use ast::{Ast, Node, NodeData, NodeId};
pub use reparse::Reparse;
use sable_errors::ParseError;
use sable_tokenizer::TokenSource;

use crate::parser::Parser;

/// Result of parsing one source: the tree, its top-level items, and the
/// diagnostics that belong to no node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    ast: Ast,
    items: Vec<NodeId>,
    errors: Vec<ParseError>,
}

/// Parses a whole token sequence. Never fails: malformed input yields a
/// partial tree plus diagnostics.
pub fn parse(text: &str, tokens: &dyn TokenSource) -> Parse {
    let mut p = Parser::new(text, tokens, Ast::default());
    let frame = p.push_frame();
    let items = grammar::items::module(&mut p);
    let errors = p.take_frame(frame);
    Parse { ast: p.finish(), items, errors }
}

impl Parse {
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    /// Every node built while parsing, nested ones included.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ast.nodes()
    }

    /// Diagnostics reported between items.
    pub fn root_errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Diagnostics of every item, depth first, then the root ones.
    pub fn syntax_errors(&self) -> Vec<ParseError> {
        let mut errors = Vec::new();
        for &item in &self.items {
            self.ast.walk(item, &mut |_, node| errors.extend_from_slice(node.diagnostics()));
        }
        errors.extend_from_slice(&self.errors);
        errors
    }

    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        for &item in &self.items {
            out.push_str(&self.ast.dump(item));
        }
        for error in &self.errors {
            out.push_str(&ast::dump_error(error));
            out.push('\n');
        }
        out
    }
}

/// Lexical and syntax diagnostics of one source, ordered by offset. At the
/// same offset lexical errors come first; syntax errors keep their
/// depth-first order.
pub fn get_parse_errors(lexical: &[ParseError], parse: &Parse) -> Vec<ParseError> {
    let mut errors = lexical.to_vec();
    errors.extend(parse.syntax_errors());
    errors.sort_by_key(|error| (error.offset(), !error.kind().is_lexical()));
    errors
}
